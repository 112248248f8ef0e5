//! Timestamp request builder service.
//!
//! Service for building RFC3161 timestamp requests from signature bytes.

use der::asn1::Uint;
use der::Encode;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::constants::{TS_REQ_NONCE_LENGTH, TS_REQ_VERSION_1};
use crate::domain::crypto::HashAlgorithm;
use crate::domain::pkcs7::timestamp::{MessageImprint, TimeStampReq};
use crate::infra::error::{SigningError, SigningResult};

/// Encoded request plus what is needed to check the reply against it.
#[derive(Debug, Clone)]
pub struct TimestampRequest {
    pub der: Vec<u8>,
    pub nonce: Uint,
    pub hash_algorithm: HashAlgorithm,
}

/// Service for building RFC3161 timestamp requests.
pub struct TimestampRequestBuilder;

impl TimestampRequestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build an RFC3161 timestamp request for the given signature bytes.
    ///
    /// The request carries the imprint of the signature value under
    /// `hash_algorithm`, a random positive nonce and `certReq = TRUE`.
    pub fn build_request(
        &self,
        signature_bytes: &[u8],
        hash_algorithm: HashAlgorithm,
    ) -> SigningResult<TimestampRequest> {
        if signature_bytes.is_empty() {
            return Err(SigningError::TimestampError(
                "Cannot create timestamp request for empty signature".into(),
            ));
        }

        let nonce = Self::random_nonce()?;
        let request = TimeStampReq {
            version: TS_REQ_VERSION_1,
            message_imprint: MessageImprint::compute(hash_algorithm, signature_bytes)?,
            req_policy: None,
            nonce: Some(nonce.clone()),
            cert_req: true,
            extensions: None,
        };
        let der = request.to_der()?;

        log::debug!(
            "Built RFC3161 timestamp request: {} bytes for signature: {} bytes",
            der.len(),
            signature_bytes.len()
        );

        Ok(TimestampRequest {
            der,
            nonce,
            hash_algorithm,
        })
    }

    fn random_nonce() -> SigningResult<Uint> {
        let mut bytes = [0u8; TS_REQ_NONCE_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        // Uint adds the sign padding; a zero leading byte is fine too.
        bytes[0] |= 0x01;
        Ok(Uint::new(&bytes)?)
    }
}

impl Default for TimestampRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
