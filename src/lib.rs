//! NuGet package signature engine
//!
//! Builds detached CMS `SignedData` signatures for package manifests using a
//! private key that is only reachable through an external signing capability.
//! Supports author and repository signatures with RFC 3161 timestamping.

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

#[cfg(test)]
mod test_support;

pub use adapters::{
    CertificatePool, ChainBuilder, SigningBackend, TimestampHttpClient, TimestampHttpConfig,
    TimestampProvider,
};
pub use domain::chain::{ChainPolicy, ChainStatus, ResolvedChain};
pub use domain::crypto::{CertChain, HashAlgorithmName, X509Certificate};
pub use domain::pkcs7::{Pkcs7SignedData, TimestampToken};
pub use domain::request::{RepositoryMetadata, SignatureContent, SignatureType, SigningRequest};
pub use domain::types::TimestampUrl;
pub use infra::config::{ConfigManager, SignerConfiguration};
pub use infra::error::{SigningError, SigningResult};
pub use pipelines::{SignWorkflow, SignatureArtifact};
pub use tokio_util::sync::CancellationToken;

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}
