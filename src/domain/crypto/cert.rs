use std::fmt;
use std::time::SystemTime;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, ExtendedKeyUsage, SubjectKeyIdentifier};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::Certificate;

use crate::domain::constants;
use crate::infra::error::{SigningError, SigningResult};

/// Parsed X.509 certificate together with its exact DER encoding.
///
/// The DER is kept verbatim so that hashes (signing-certificate-v2) are
/// computed over the bytes the issuer signed, not a re-encoding.
#[derive(Clone)]
pub struct X509Certificate {
    cert: Certificate,
    der: Box<[u8]>,
}

/// Ordered certificate chain, leaf first, ending at the root when known.
#[derive(Clone)]
pub struct CertChain {
    certs: Vec<X509Certificate>,
}

impl X509Certificate {
    pub fn from_der(der: Vec<u8>) -> SigningResult<Self> {
        let cert = Certificate::from_der(&der).map_err(|e| {
            SigningError::InvalidCertificate(format!("Failed to parse certificate: {e}"))
        })?;
        Ok(Self {
            cert,
            der: der.into_boxed_slice(),
        })
    }

    pub fn from_certificate(cert: Certificate) -> SigningResult<Self> {
        let der = cert.to_der().map_err(|e| {
            SigningError::CertificateError(format!("Failed to encode certificate: {e}"))
        })?;
        Ok(Self {
            cert,
            der: der.into_boxed_slice(),
        })
    }

    #[must_use]
    pub fn certificate(&self) -> &Certificate {
        &self.cert
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn subject(&self) -> &Name {
        &self.cert.tbs_certificate.subject
    }

    #[must_use]
    pub fn issuer(&self) -> &Name {
        &self.cert.tbs_certificate.issuer
    }

    #[must_use]
    pub fn serial_number(&self) -> &SerialNumber {
        &self.cert.tbs_certificate.serial_number
    }

    /// Raw DER value of the extension `oid`, if present.
    fn extension_value(&self, oid: ObjectIdentifier) -> Option<&[u8]> {
        self.cert
            .tbs_certificate
            .extensions
            .as_ref()?
            .iter()
            .find(|ext| ext.extn_id == oid)
            .map(|ext| ext.extn_value.as_bytes())
    }

    /// Key identifier bytes of the Subject Key Identifier extension.
    pub fn subject_key_identifier(&self) -> SigningResult<Option<Vec<u8>>> {
        self.extension_value(constants::ID_CE_SUBJECT_KEY_IDENTIFIER)
            .map(|value| {
                SubjectKeyIdentifier::from_der(value)
                    .map(|ski| ski.0.as_bytes().to_vec())
                    .map_err(|e| {
                        SigningError::InvalidCertificate(format!(
                            "Malformed subject key identifier extension: {e}"
                        ))
                    })
            })
            .transpose()
    }

    /// Key identifier of the Authority Key Identifier extension.
    pub fn authority_key_identifier(&self) -> SigningResult<Option<Vec<u8>>> {
        let Some(value) = self.extension_value(constants::ID_CE_AUTHORITY_KEY_IDENTIFIER) else {
            return Ok(None);
        };
        let aki = AuthorityKeyIdentifier::from_der(value).map_err(|e| {
            SigningError::InvalidCertificate(format!(
                "Malformed authority key identifier extension: {e}"
            ))
        })?;
        Ok(aki.key_identifier.map(|id| id.as_bytes().to_vec()))
    }

    /// Extended key usage purposes; `None` when the extension is absent.
    pub fn extended_key_usage(&self) -> SigningResult<Option<Vec<ObjectIdentifier>>> {
        self.extension_value(constants::ID_CE_EXT_KEY_USAGE)
            .map(|value| {
                ExtendedKeyUsage::from_der(value)
                    .map(|eku| eku.0)
                    .map_err(|e| {
                        SigningError::InvalidCertificate(format!(
                            "Malformed extended key usage extension: {e}"
                        ))
                    })
            })
            .transpose()
    }

    /// Whether the subject public key is an RSA key.
    #[must_use]
    pub fn has_rsa_key(&self) -> bool {
        self.cert
            .tbs_certificate
            .subject_public_key_info
            .algorithm
            .oid
            == constants::RSA_ENCRYPTION
    }

    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.subject() == self.issuer()
    }

    /// Whether `time` falls inside the certificate validity period.
    #[must_use]
    pub fn is_valid_at(&self, time: SystemTime) -> bool {
        let validity = &self.cert.tbs_certificate.validity;
        validity.not_before.to_system_time() <= time && time <= validity.not_after.to_system_time()
    }
}

impl PartialEq for X509Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for X509Certificate {}

impl CertChain {
    /// Single-certificate chain.
    #[must_use]
    pub fn new(leaf: X509Certificate) -> Self {
        Self { certs: vec![leaf] }
    }

    /// Chain from an ordered list; the first entry is the leaf.
    pub fn from_certificates(certs: Vec<X509Certificate>) -> SigningResult<Self> {
        if certs.is_empty() {
            return Err(SigningError::ChainError(
                "Certificate chain must contain at least the leaf".into(),
            ));
        }
        Ok(Self { certs })
    }

    #[must_use]
    pub fn leaf(&self) -> &X509Certificate {
        &self.certs[0]
    }

    #[must_use]
    pub fn certificates(&self) -> &[X509Certificate] {
        &self.certs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X509Certificate(subject={}, len={})",
            self.subject(),
            self.der.len()
        )
    }
}

impl fmt::Debug for CertChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CertChain(leaf_len={}, len={})",
            self.leaf().der.len(),
            self.certs.len()
        )
    }
}
