//! Error types for package signing operations.

use thiserror::Error;

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Comprehensive error types for signing operations
#[derive(Error, Debug, miette::Diagnostic)]
pub enum SigningError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("Invalid certificate format: {0}")]
    InvalidCertificate(String),

    #[error("Certificate chain error: {0}")]
    ChainError(String),

    #[error("Signature creation error: {0}")]
    SignatureError(String),

    #[error("Timestamp error: {0}")]
    TimestampError(String),

    /// The signature itself was produced, but no timestamp could be obtained
    /// or attached. `unstamped_signature` is the valid DER `ContentInfo`.
    #[error("Timestamp unavailable: {reason}")]
    #[diagnostic(help(
        "the signature is valid but not timestamped; accept or reject it per your signing policy"
    ))]
    TimestampUnavailable {
        reason: String,
        unstamped_signature: Vec<u8>,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("ASN.1 encoding/decoding error: {0}")]
    Asn1Error(String),

    #[error("PKCS#7 structure error: {0}")]
    Pkcs7Error(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl SigningError {
    /// True when the operation stopped because the caller cancelled it.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SigningError::Cancelled(_))
    }

    /// The non-timestamped signature carried by a `TimestampUnavailable` error.
    #[must_use]
    pub fn unstamped_signature(&self) -> Option<&[u8]> {
        match self {
            SigningError::TimestampUnavailable {
                unstamped_signature,
                ..
            } => Some(unstamped_signature),
            _ => None,
        }
    }
}

impl From<der::Error> for SigningError {
    fn from(error: der::Error) -> Self {
        SigningError::Asn1Error(error.to_string())
    }
}

impl From<reqwest::Error> for SigningError {
    fn from(error: reqwest::Error) -> Self {
        SigningError::NetworkError(error.to_string())
    }
}

impl From<std::io::Error> for SigningError {
    fn from(error: std::io::Error) -> Self {
        SigningError::IoError(error.to_string())
    }
}
