//! Signing capability backed by an externally held private key.
//!
//! The signer never sees key material. Implementations forward the digest
//! to wherever the key lives (remote KMS, HSM, smart card) and return the raw
//! signature bytes.

use crate::domain::crypto::HashAlgorithm;
use crate::infra::error::SigningResult;

/// Opaque `sign(digest, hashAlgorithm) -> signature` capability.
///
/// Implementations must be shareable across concurrent signing operations;
/// the signer itself adds no serialization around calls.
pub trait SigningBackend: Send + Sync {
    /// Short label used in diagnostics.
    fn name(&self) -> &str {
        "signing-backend"
    }

    /// Sign a precomputed digest.
    ///
    /// # Arguments
    ///
    /// * `hash` - Digest of the DER encoded signed attributes
    /// * `algorithm` - Hash algorithm that produced `hash`
    ///
    /// # Errors
    ///
    /// Returns error if the key is unavailable, access is denied, or the key
    /// does not support `algorithm`.
    fn sign_hash(&self, hash: &[u8], algorithm: HashAlgorithm) -> SigningResult<Vec<u8>>;
}
