use std::fmt;

use super::HashAlgorithm;
use crate::infra::error::{SigningError, SigningResult};

/// Raw signature value returned by the signing capability.
///
/// For the RSA PKCS#1 v1.5 keys this signer supports, the bytes are the
/// big-endian signature integer, as long as the key modulus.
#[derive(Clone, Eq, PartialEq)]
pub struct CmsSignature {
    algo: HashAlgorithm, // hash algorithm used for the signed attributes digest
    bytes: Box<[u8]>,
}

impl CmsSignature {
    /// Wrap a capability result; an empty signature is rejected.
    pub fn new(algo: HashAlgorithm, bytes: Vec<u8>) -> SigningResult<Self> {
        if bytes.is_empty() {
            return Err(SigningError::SignatureError(
                "Signing capability returned an empty signature".into(),
            ));
        }
        Ok(Self {
            algo,
            bytes: bytes.into_boxed_slice(),
        })
    }
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algo
    }
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes.into()
    }
}

impl fmt::Debug for CmsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CmsSignature(algo={:?}, len={})",
            self.algo,
            self.bytes.len()
        )
    }
}
