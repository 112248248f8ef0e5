//! Signing request and content types.
//!
//! A request is owned by the caller and only read by the signing pipeline.

use std::fmt;
use std::time::SystemTime;

use crate::domain::constants;
use crate::domain::crypto::{HashAlgorithm, HashAlgorithmName, X509Certificate};
use crate::infra::error::{SigningError, SigningResult};
use const_oid::ObjectIdentifier;

/// Role the signer commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    Author,
    Repository,
}

impl SignatureType {
    /// Commitment type identifier asserted for this signature type.
    #[must_use]
    pub fn commitment_type_oid(&self) -> ObjectIdentifier {
        match self {
            SignatureType::Author => constants::ID_CTI_PROOF_OF_ORIGIN,
            SignatureType::Repository => constants::ID_CTI_PROOF_OF_RECEIPT,
        }
    }

    /// Inverse of [`SignatureType::commitment_type_oid`].
    #[must_use]
    pub fn from_commitment_type_oid(oid: &ObjectIdentifier) -> Option<Self> {
        if *oid == constants::ID_CTI_PROOF_OF_ORIGIN {
            Some(SignatureType::Author)
        } else if *oid == constants::ID_CTI_PROOF_OF_RECEIPT {
            Some(SignatureType::Repository)
        } else {
            None
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureType::Author => f.write_str("author"),
            SignatureType::Repository => f.write_str("repository"),
        }
    }
}

/// Extra attributes carried by repository signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub v3_service_index_url: String,
    pub package_owners: Vec<String>,
}

impl RepositoryMetadata {
    pub fn new(v3_service_index_url: impl Into<String>) -> Self {
        Self {
            v3_service_index_url: v3_service_index_url.into(),
            package_owners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_package_owners(mut self, owners: Vec<String>) -> Self {
        self.package_owners = owners;
        self
    }

    fn validate(&self) -> SigningResult<()> {
        let url = &self.v3_service_index_url;
        let host = url
            .strip_prefix("https://")
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default();
        if host.is_empty() || !url.is_ascii() {
            return Err(SigningError::InvalidInput(format!(
                "V3 service index URL must be an absolute https URL: {url}"
            )));
        }
        if self.package_owners.iter().any(|o| o.trim().is_empty()) {
            return Err(SigningError::InvalidInput(
                "Package owner names must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Everything the pipeline needs to know about one signing operation.
///
/// Unset hash algorithms fall back to the defaults passed to
/// [`SigningRequest::validate_with_defaults`].
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pub signer_certificate: X509Certificate,
    pub signature_hash_algorithm: Option<HashAlgorithmName>,
    pub timestamp_hash_algorithm: Option<HashAlgorithmName>,
    pub signature_type: SignatureType,
    pub signing_time: SystemTime,
    pub repository_metadata: Option<RepositoryMetadata>,
}

impl SigningRequest {
    /// Request that leaves both hash algorithms to the configured defaults.
    #[must_use]
    pub fn new(signer_certificate: X509Certificate, signature_type: SignatureType) -> Self {
        Self {
            signer_certificate,
            signature_hash_algorithm: None,
            timestamp_hash_algorithm: None,
            signature_type,
            signing_time: SystemTime::now(),
            repository_metadata: None,
        }
    }

    #[must_use]
    pub fn with_signature_hash_algorithm(mut self, name: impl Into<HashAlgorithmName>) -> Self {
        self.signature_hash_algorithm = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_timestamp_hash_algorithm(mut self, name: impl Into<HashAlgorithmName>) -> Self {
        self.timestamp_hash_algorithm = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_signing_time(mut self, time: SystemTime) -> Self {
        self.signing_time = time;
        self
    }

    #[must_use]
    pub fn with_repository_metadata(mut self, metadata: RepositoryMetadata) -> Self {
        self.repository_metadata = Some(metadata);
        self
    }

    /// Validate the request, resolving unset algorithms to SHA-256.
    pub fn validate(&self) -> SigningResult<ResolvedAlgorithms> {
        self.validate_with_defaults(ResolvedAlgorithms::default())
    }

    /// Validate the request and resolve its algorithms.
    ///
    /// Explicit names on the request win over `defaults`. Runs before any
    /// chain building, signing or network work.
    pub fn validate_with_defaults(
        &self,
        defaults: ResolvedAlgorithms,
    ) -> SigningResult<ResolvedAlgorithms> {
        let signature = match &self.signature_hash_algorithm {
            Some(name) => name.resolve()?,
            None => defaults.signature,
        };
        let timestamp = match &self.timestamp_hash_algorithm {
            Some(name) => name.resolve()?,
            None => defaults.timestamp,
        };

        if !self.signer_certificate.has_rsa_key() {
            return Err(SigningError::UnsupportedAlgorithm(format!(
                "signer certificate key algorithm {} is not RSA",
                self.signer_certificate
                    .certificate()
                    .tbs_certificate
                    .subject_public_key_info
                    .algorithm
                    .oid
            )));
        }

        match (&self.repository_metadata, self.signature_type) {
            (Some(_), SignatureType::Author) => {
                return Err(SigningError::InvalidInput(
                    "Repository metadata is only valid for repository signatures".into(),
                ));
            }
            (Some(metadata), SignatureType::Repository) => metadata.validate()?,
            (None, _) => {}
        }

        Ok(ResolvedAlgorithms {
            signature,
            timestamp,
        })
    }
}

/// Algorithms of a validated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAlgorithms {
    pub signature: HashAlgorithm,
    pub timestamp: HashAlgorithm,
}

impl Default for ResolvedAlgorithms {
    fn default() -> Self {
        Self {
            signature: HashAlgorithm::Sha256,
            timestamp: HashAlgorithm::Sha256,
        }
    }
}

/// Detached content to be signed (the canonical manifest digest).
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureContent {
    bytes: Box<[u8]>,
}

impl SignatureContent {
    pub fn new(bytes: Vec<u8>) -> SigningResult<Self> {
        if bytes.is_empty() {
            return Err(SigningError::InvalidInput(
                "Signature content must not be empty".into(),
            ));
        }
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SignatureContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureContent(len={})", self.bytes.len())
    }
}
