//! Hash algorithm domain type.
//!
//! The `HashAlgorithm` enumeration itself lives at the crate root; this module
//! adds digest computation, OID mapping and name resolution. Anything outside
//! SHA-256, SHA-384 and SHA-512 is rejected as unsupported.

use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::asn1::Any;
use sha2::{Digest, Sha256, Sha384, Sha512};
use spki::AlgorithmIdentifierOwned;

use crate::domain::constants;
use crate::infra::error::{SigningError, SigningResult};
pub use crate::HashAlgorithm;

impl HashAlgorithm {
    /// Resolve a caller supplied algorithm name.
    ///
    /// Accepts `SHA256`, `sha-256`, `Sha256` and the like.
    pub fn from_name(name: &str) -> SigningResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" | "sha_256" => Ok(HashAlgorithm::Sha256),
            "sha384" | "sha-384" | "sha_384" => Ok(HashAlgorithm::Sha384),
            "sha512" | "sha-512" | "sha_512" => Ok(HashAlgorithm::Sha512),
            _ => Err(SigningError::UnsupportedAlgorithm(format!(
                "hash algorithm '{name}' is not supported (expected SHA256, SHA384 or SHA512)"
            ))),
        }
    }

    /// Resolve a digest algorithm OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> SigningResult<Self> {
        [
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ]
        .into_iter()
        .find(|algo| algo.oid() == *oid)
        .ok_or_else(|| {
            SigningError::UnsupportedAlgorithm(format!("digest algorithm {oid} is not supported"))
        })
    }

    /// Compute the digest of `data`.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            HashAlgorithm::Sha256 => constants::ID_SHA256,
            HashAlgorithm::Sha384 => constants::ID_SHA384,
            HashAlgorithm::Sha512 => constants::ID_SHA512,
        }
    }

    /// `shaXXXWithRSAEncryption` OID paired with this digest.
    #[must_use]
    pub fn rsa_signature_oid(&self) -> ObjectIdentifier {
        match self {
            HashAlgorithm::Sha256 => constants::SHA256_WITH_RSA,
            HashAlgorithm::Sha384 => constants::SHA384_WITH_RSA,
            HashAlgorithm::Sha512 => constants::SHA512_WITH_RSA,
        }
    }

    /// Digest `AlgorithmIdentifier` with absent parameters (RFC 5754).
    #[must_use]
    pub fn algorithm_identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: None,
        }
    }

    /// RSA PKCS#1 v1.5 signature `AlgorithmIdentifier` (NULL parameters, RFC 4055).
    #[must_use]
    pub fn rsa_signature_algorithm_identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.rsa_signature_oid(),
            parameters: Some(Any::null()),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated hash algorithm name as supplied by a caller.
///
/// Kept as a name so that requests naming algorithms this crate does not
/// support (MD5, SHA-1) can still be expressed and rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashAlgorithmName(String);

impl HashAlgorithmName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve into a supported algorithm.
    pub fn resolve(&self) -> SigningResult<HashAlgorithm> {
        HashAlgorithm::from_name(&self.0)
    }
}

impl From<HashAlgorithm> for HashAlgorithmName {
    fn from(algorithm: HashAlgorithm) -> Self {
        Self(algorithm.as_str().to_string())
    }
}

impl From<&str> for HashAlgorithmName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for HashAlgorithmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
