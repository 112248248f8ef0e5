//! Synthetic certificates for unit tests.
//!
//! The signer never verifies signatures, so certificates carry a dummy
//! signature and an RSA `SubjectPublicKeyInfo` with placeholder key bytes.

use std::str::FromStr;
use std::time::{Duration, SystemTime};

use const_oid::ObjectIdentifier;
use der::asn1::{Any, BitString, OctetString, UtcTime};
use der::Encode;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, ExtendedKeyUsage, SubjectKeyIdentifier};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

use crate::domain::constants;
use crate::domain::crypto::X509Certificate;

pub(crate) const NOT_BEFORE: u64 = 1_577_836_800; // 2020-01-01
pub(crate) const NOT_AFTER: u64 = 2_208_988_800; // 2040-01-01

pub(crate) fn inside_validity() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

#[derive(Clone)]
pub(crate) struct TestCert {
    subject: String,
    issuer: String,
    serial: Vec<u8>,
    ski: Option<Vec<u8>>,
    aki: Option<Vec<u8>>,
    eku: Option<Vec<ObjectIdentifier>>,
    key_algorithm: ObjectIdentifier,
    not_after: u64,
}

impl TestCert {
    pub(crate) fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            issuer: subject.to_string(),
            serial: vec![0x01],
            ski: None,
            aki: None,
            eku: None,
            key_algorithm: constants::RSA_ENCRYPTION,
            not_after: NOT_AFTER,
        }
    }

    pub(crate) fn issuer(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub(crate) fn serial(mut self, serial: &[u8]) -> Self {
        self.serial = serial.to_vec();
        self
    }

    pub(crate) fn ski(mut self, ski: &[u8]) -> Self {
        self.ski = Some(ski.to_vec());
        self
    }

    pub(crate) fn aki(mut self, aki: &[u8]) -> Self {
        self.aki = Some(aki.to_vec());
        self
    }

    pub(crate) fn eku(mut self, eku: &[ObjectIdentifier]) -> Self {
        self.eku = Some(eku.to_vec());
        self
    }

    pub(crate) fn key_algorithm(mut self, oid: ObjectIdentifier) -> Self {
        self.key_algorithm = oid;
        self
    }

    pub(crate) fn expired(mut self) -> Self {
        self.not_after = NOT_BEFORE + 60;
        self
    }

    pub(crate) fn build(self) -> X509Certificate {
        let mut extensions = Vec::new();
        if let Some(ski) = &self.ski {
            extensions.push(extension(
                constants::ID_CE_SUBJECT_KEY_IDENTIFIER,
                SubjectKeyIdentifier(OctetString::new(ski.clone()).unwrap())
                    .to_der()
                    .unwrap(),
            ));
        }
        if let Some(aki) = &self.aki {
            extensions.push(extension(
                constants::ID_CE_AUTHORITY_KEY_IDENTIFIER,
                AuthorityKeyIdentifier {
                    key_identifier: Some(OctetString::new(aki.clone()).unwrap()),
                    authority_cert_issuer: None,
                    authority_cert_serial_number: None,
                }
                .to_der()
                .unwrap(),
            ));
        }
        if let Some(eku) = &self.eku {
            extensions.push(extension(
                constants::ID_CE_EXT_KEY_USAGE,
                ExtendedKeyUsage(eku.clone()).to_der().unwrap(),
            ));
        }

        let signature_algorithm = AlgorithmIdentifierOwned {
            oid: constants::SHA256_WITH_RSA,
            parameters: Some(Any::null()),
        };
        let tbs_certificate = TbsCertificate {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial).unwrap(),
            signature: signature_algorithm.clone(),
            issuer: Name::from_str(&self.issuer).unwrap(),
            validity: Validity {
                not_before: utc(NOT_BEFORE),
                not_after: utc(self.not_after),
            },
            subject: Name::from_str(&self.subject).unwrap(),
            subject_public_key_info: SubjectPublicKeyInfoOwned {
                algorithm: AlgorithmIdentifierOwned {
                    oid: self.key_algorithm,
                    parameters: Some(Any::null()),
                },
                subject_public_key: BitString::from_bytes(&[0x30, 0x03, 0x02, 0x01, 0x03])
                    .unwrap(),
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        };
        let cert = Certificate {
            tbs_certificate,
            signature_algorithm,
            signature: BitString::from_bytes(&[0u8; 16]).unwrap(),
        };
        X509Certificate::from_der(cert.to_der().unwrap()).unwrap()
    }
}

fn extension(oid: ObjectIdentifier, value: Vec<u8>) -> Extension {
    Extension {
        extn_id: oid,
        critical: false,
        extn_value: OctetString::new(value).unwrap(),
    }
}

fn utc(secs: u64) -> Time {
    Time::UtcTime(UtcTime::from_unix_duration(Duration::from_secs(secs)).unwrap())
}

/// Leaf with SKI and the code signing EKU, self-issued.
pub(crate) fn signer_with_ski() -> X509Certificate {
    TestCert::new("CN=Test Signer,O=Contoso")
        .serial(&[0x10, 0x20])
        .ski(&[0xAB; 20])
        .eku(&[constants::ID_KP_CODE_SIGNING])
        .build()
}

/// Leaf without SKI, issued by a named CA.
pub(crate) fn signer_without_ski() -> X509Certificate {
    TestCert::new("CN=Plain Signer")
        .issuer("CN=Plain CA")
        .serial(&[0x05, 0x39])
        .build()
}
