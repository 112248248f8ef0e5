//! Shared fixtures for integration tests.
//!
//! Certificates are synthesized from `x509-cert` structures with dummy
//! signatures; the signer never verifies them. The signing capability and the
//! timestamp authority are replaced by in-memory mocks.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, BitString, Null, OctetString, UtcTime};
use der::Encode;
use nupkg_signer::adapters::certificate_pool::ChainBuilder;
use nupkg_signer::domain::constants;
use nupkg_signer::{
    CancellationToken, CertChain, ChainPolicy, HashAlgorithm, SigningBackend, SigningError,
    SigningResult, TimestampProvider, X509Certificate,
};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::ext::pkix::{AuthorityKeyIdentifier, ExtendedKeyUsage, SubjectKeyIdentifier};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

/// Install `env_logger` once; repeated calls are harmless.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Instant inside every fixture certificate's validity window.
pub fn signing_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

pub struct CertTemplate<'a> {
    pub subject: &'a str,
    pub issuer: &'a str,
    pub serial: &'a [u8],
    pub ski: Option<&'a [u8]>,
    pub aki: Option<&'a [u8]>,
    pub eku: Option<Vec<ObjectIdentifier>>,
}

impl<'a> CertTemplate<'a> {
    pub fn self_issued(subject: &'a str) -> Self {
        Self {
            subject,
            issuer: subject,
            serial: &[0x01],
            ski: None,
            aki: None,
            eku: None,
        }
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

pub fn make_cert(template: CertTemplate<'_>) -> X509Certificate {
    let mut extensions = Vec::new();
    if let Some(ski) = template.ski {
        extensions.push(extension(
            constants::ID_CE_SUBJECT_KEY_IDENTIFIER,
            SubjectKeyIdentifier(OctetString::new(ski).unwrap())
                .to_der()
                .unwrap(),
        ));
    }
    if let Some(aki) = template.aki {
        extensions.push(extension(
            constants::ID_CE_AUTHORITY_KEY_IDENTIFIER,
            AuthorityKeyIdentifier {
                key_identifier: Some(OctetString::new(aki).unwrap()),
                authority_cert_issuer: None,
                authority_cert_serial_number: None,
            }
            .to_der()
            .unwrap(),
        ));
    }
    if let Some(eku) = template.eku {
        extensions.push(extension(
            constants::ID_CE_EXT_KEY_USAGE,
            ExtendedKeyUsage(eku).to_der().unwrap(),
        ));
    }

    let algorithm = AlgorithmIdentifierOwned {
        oid: constants::SHA256_WITH_RSA,
        parameters: Some(Any::null()),
    };
    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(template.serial).unwrap(),
        signature: algorithm.clone(),
        issuer: Name::from_str(template.issuer).unwrap(),
        validity: Validity {
            not_before: utc(1_577_836_800),
            not_after: utc(2_208_988_800),
        },
        subject: Name::from_str(template.subject).unwrap(),
        subject_public_key_info: SubjectPublicKeyInfoOwned {
            algorithm: AlgorithmIdentifierOwned {
                oid: constants::RSA_ENCRYPTION,
                parameters: Some(Any::null()),
            },
            subject_public_key: BitString::from_bytes(&[0x30, 0x03, 0x02, 0x01, 0x03]).unwrap(),
        },
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: (!extensions.is_empty()).then_some(extensions),
    };
    let cert = Certificate {
        tbs_certificate,
        signature_algorithm: algorithm,
        signature: BitString::from_bytes(&[0u8; 16]).unwrap(),
    };
    X509Certificate::from_der(cert.to_der().unwrap()).unwrap()
}

pub const SIGNER_SKI: [u8; 20] = [
    0x5d, 0x1f, 0x6c, 0x3a, 0x90, 0x11, 0x42, 0x7e, 0x08, 0xc4, 0x2b, 0x77, 0xe1, 0x3d, 0x6a,
    0x0f, 0x9b, 0x25, 0x84, 0xc6,
];

/// Self-issued code signing certificate with an SKI extension.
pub fn signer_with_ski() -> X509Certificate {
    make_cert(CertTemplate {
        ski: Some(&SIGNER_SKI),
        eku: Some(vec![constants::ID_KP_CODE_SIGNING]),
        serial: &[0x3c, 0x91],
        ..CertTemplate::self_issued("CN=NuGet Test Author,O=Contoso")
    })
}

/// Certificate without SKI issued by "CN=Test Issuing CA".
pub fn signer_without_ski() -> X509Certificate {
    make_cert(CertTemplate {
        issuer: "CN=Test Issuing CA",
        serial: &[0x00, 0x8f, 0x10],
        eku: Some(vec![constants::ID_KP_CODE_SIGNING]),
        ..CertTemplate::self_issued("CN=NuGet Test Publisher")
    })
}

/// Root, intermediate and leaf linked by AKI/SKI.
pub fn three_level_chain() -> (X509Certificate, X509Certificate, X509Certificate) {
    let root = make_cert(CertTemplate {
        ski: Some(&[0x01; 20]),
        ..CertTemplate::self_issued("CN=Test Root CA")
    });
    let intermediate = make_cert(CertTemplate {
        issuer: "CN=Test Root CA",
        serial: &[0x02],
        ski: Some(&[0x02; 20]),
        aki: Some(&[0x01; 20]),
        ..CertTemplate::self_issued("CN=Test Issuing CA")
    });
    let leaf = make_cert(CertTemplate {
        issuer: "CN=Test Issuing CA",
        serial: &[0x03],
        ski: Some(&[0x03; 20]),
        aki: Some(&[0x02; 20]),
        eku: Some(vec![constants::ID_KP_CODE_SIGNING]),
        ..CertTemplate::self_issued("CN=Chained Signer")
    });
    (root, intermediate, leaf)
}

/// Signing capability that records calls and returns a fixed-size value.
#[derive(Default)]
pub struct MockBackend {
    pub calls: AtomicUsize,
}

impl MockBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SigningBackend for MockBackend {
    fn name(&self) -> &str {
        "mock-kms"
    }

    fn sign_hash(&self, hash: &[u8], algorithm: HashAlgorithm) -> SigningResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(hash.len(), algorithm.digest_size());
        let mut signature = vec![0u8; 256];
        signature[..hash.len()].copy_from_slice(hash);
        Ok(signature)
    }
}

/// Chain builder that counts calls and always fails.
#[derive(Default)]
pub struct CountingChainBuilder {
    pub calls: AtomicUsize,
}

impl CountingChainBuilder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChainBuilder for CountingChainBuilder {
    fn build_chain(&self, _leaf: &X509Certificate, _policy: &ChainPolicy) -> SigningResult<CertChain> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SigningError::ChainError("untrusted root".into()))
    }
}

/// Fixed token: a `ContentInfo` with the signedData type and a NULL body.
pub fn fixed_token() -> Vec<u8> {
    cms::content_info::ContentInfo {
        content_type: constants::ID_SIGNED_DATA,
        content: Any::encode_from(&Null).unwrap(),
    }
    .to_der()
    .unwrap()
}

/// Timestamp authority returning [`fixed_token`].
#[derive(Default)]
pub struct FixedTimestamp {
    pub calls: AtomicUsize,
    last_algorithm: Mutex<Option<HashAlgorithm>>,
}

impl FixedTimestamp {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hash algorithm of the most recent request.
    pub fn last_algorithm(&self) -> Option<HashAlgorithm> {
        *self.last_algorithm.lock().unwrap()
    }
}

#[async_trait]
impl TimestampProvider for FixedTimestamp {
    async fn request_timestamp(
        &self,
        signature_value: &[u8],
        hash_algorithm: HashAlgorithm,
        _cancel: &CancellationToken,
    ) -> SigningResult<Vec<u8>> {
        assert!(!signature_value.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_algorithm.lock().unwrap() = Some(hash_algorithm);
        Ok(fixed_token())
    }
}

/// Timestamp authority that never answers; only cancellation ends the call.
pub struct PendingTimestamp;

#[async_trait]
impl TimestampProvider for PendingTimestamp {
    async fn request_timestamp(
        &self,
        _signature_value: &[u8],
        _hash_algorithm: HashAlgorithm,
        _cancel: &CancellationToken,
    ) -> SigningResult<Vec<u8>> {
        std::future::pending::<()>().await;
        Err(SigningError::TimestampError("unreachable".into()))
    }
}

/// Timestamp authority that fails or returns garbage.
pub enum BrokenTimestamp {
    Unreachable,
    Garbage,
}

#[async_trait]
impl TimestampProvider for BrokenTimestamp {
    async fn request_timestamp(
        &self,
        _signature_value: &[u8],
        _hash_algorithm: HashAlgorithm,
        _cancel: &CancellationToken,
    ) -> SigningResult<Vec<u8>> {
        match self {
            BrokenTimestamp::Unreachable => Err(SigningError::NetworkError(
                "connection refused".into(),
            )),
            BrokenTimestamp::Garbage => Ok(vec![0xde, 0xad, 0xbe, 0xef]),
        }
    }
}
