//! Chain building policy and resolution outcome.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use const_oid::ObjectIdentifier;

use crate::domain::constants;
use crate::domain::crypto::CertChain;
use crate::infra::error::SigningError;

/// How revocation status is obtained while building a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationMode {
    /// Best effort, may fetch CRL/OCSP data over the network.
    Online,
    /// Cached revocation data only.
    Offline,
    NoCheck,
}

/// Which chain elements are subject to revocation checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationFlag {
    EndCertificateOnly,
    EntireChain,
    ExcludeRoot,
}

impl FromStr for RevocationMode {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "online" => Ok(RevocationMode::Online),
            "offline" => Ok(RevocationMode::Offline),
            "none" | "nocheck" => Ok(RevocationMode::NoCheck),
            other => Err(SigningError::ConfigurationError(format!(
                "Unknown revocation mode: {other}"
            ))),
        }
    }
}

/// Policy handed to the chain validation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPolicy {
    /// EKU that must be present in the chain's application policy set.
    pub required_application_policy: Option<ObjectIdentifier>,
    pub revocation_mode: RevocationMode,
    pub revocation_flag: RevocationFlag,
    /// Validity is evaluated as of this instant.
    pub verification_time: SystemTime,
    /// Bound for online revocation retrieval.
    pub url_retrieval_timeout: Duration,
}

impl ChainPolicy {
    /// Code signing policy: codeSigning EKU required, online revocation
    /// checking for leaf and intermediates, root excluded.
    #[must_use]
    pub fn code_signing(verification_time: SystemTime) -> Self {
        Self {
            required_application_policy: Some(constants::ID_KP_CODE_SIGNING),
            revocation_mode: RevocationMode::Online,
            revocation_flag: RevocationFlag::ExcludeRoot,
            verification_time,
            url_retrieval_timeout: Duration::from_secs(15),
        }
    }

    #[must_use]
    pub fn with_revocation_mode(mut self, mode: RevocationMode) -> Self {
        self.revocation_mode = mode;
        self
    }

    #[must_use]
    pub fn with_url_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.url_retrieval_timeout = timeout;
        self
    }

    #[must_use]
    pub fn without_application_policy(mut self) -> Self {
        self.required_application_policy = None;
        self
    }
}

/// Whether the chain came from the validation engine or the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    Full,
    Fallback,
}

impl fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainStatus::Full => f.write_str("full chain"),
            ChainStatus::Fallback => f.write_str("single-certificate fallback"),
        }
    }
}

/// Outcome of chain resolution.
#[derive(Debug, Clone)]
pub enum ResolvedChain {
    /// Chain reported by the validation engine, leaf to root.
    Full(CertChain),
    /// Chain building failed; only the signer certificate is included.
    Fallback { chain: CertChain, reason: String },
}

impl ResolvedChain {
    #[must_use]
    pub fn chain(&self) -> &CertChain {
        match self {
            ResolvedChain::Full(chain) | ResolvedChain::Fallback { chain, .. } => chain,
        }
    }

    #[must_use]
    pub fn status(&self) -> ChainStatus {
        match self {
            ResolvedChain::Full(_) => ChainStatus::Full,
            ResolvedChain::Fallback { .. } => ChainStatus::Fallback,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.status() == ChainStatus::Fallback
    }

    #[must_use]
    pub fn into_chain(self) -> CertChain {
        match self {
            ResolvedChain::Full(chain) | ResolvedChain::Fallback { chain, .. } => chain,
        }
    }
}
