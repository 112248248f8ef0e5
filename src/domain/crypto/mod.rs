//! Foundational cryptographic domain types.
//!
//! Provides strongly-typed wrappers for cryptographic artifacts including:
//! - Hash algorithms, caller-facing algorithm names and digest values
//! - Parsed certificates and ordered certificate chains
//! - Signature values returned by the external signing capability

mod cert;
mod digest_bytes;
mod hash;
mod signature;

pub use cert::{CertChain, X509Certificate};
pub use digest_bytes::{DigestBytes, DigestBytesError};
pub use hash::{HashAlgorithm, HashAlgorithmName};
pub use signature::CmsSignature;
