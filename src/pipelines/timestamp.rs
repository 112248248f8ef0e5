//! `TimestampWorkflow`: obtains an RFC3161 token for an assembled signature
//! and folds it into the `SignedData`.
//!
//! Steps:
//! 1. Take the signature value of the sole `SignerInfo`
//! 2. Ask the timestamp provider for a token, racing the cancellation token
//! 3. Attach the token as an unsigned attribute (`TimestampApplier`)
//!
//! No retries happen here; the provider owns its retry policy.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapters::timestamp_http_client::TimestampProvider;
use crate::domain::pkcs7::Pkcs7SignedData;
use crate::services::TimestampApplier;
use crate::{HashAlgorithm, SigningError, SigningResult};

/// Signature with its embedded timestamp token.
#[derive(Debug, Clone)]
pub struct TimestampedSignature {
    pub pkcs7: Pkcs7SignedData,
    pub token: Vec<u8>,
}

pub struct TimestampWorkflow {
    hash_algorithm: HashAlgorithm,
    provider: Arc<dyn TimestampProvider>,
}

impl TimestampWorkflow {
    #[must_use]
    pub fn new(hash_algorithm: HashAlgorithm, provider: Arc<dyn TimestampProvider>) -> Self {
        Self {
            hash_algorithm,
            provider,
        }
    }

    #[must_use]
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// Timestamp `pkcs7`.
    ///
    /// Cancellation yields [`SigningError::Cancelled`] and no artifact. Any
    /// other failure yields [`SigningError::TimestampUnavailable`] carrying
    /// the unchanged, still valid signature.
    pub async fn timestamp_pkcs7(
        &self,
        pkcs7: Pkcs7SignedData,
        cancel: &CancellationToken,
    ) -> SigningResult<TimestampedSignature> {
        let signature_value = pkcs7.signature_value()?;
        if cancel.is_cancelled() {
            return Err(SigningError::Cancelled(
                "cancelled before timestamp request".into(),
            ));
        }

        log::debug!(
            "TimestampWorkflow: requesting token over {} byte signature ({})",
            signature_value.len(),
            self.hash_algorithm
        );
        let requested = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SigningError::Cancelled(
                "cancelled during timestamp request".into(),
            )),
            result = self.provider.request_timestamp(&signature_value, self.hash_algorithm, cancel) => result,
        };

        let token = match requested {
            Ok(token) => token,
            Err(e) if e.is_cancelled() => {
                log::info!("timestamp request cancelled; no signature returned");
                return Err(e);
            }
            Err(e) => return Err(Self::unavailable(e.to_string(), pkcs7)),
        };

        match TimestampApplier::new().apply_timestamp(&pkcs7, &token) {
            Ok(stamped) => Ok(TimestampedSignature {
                pkcs7: stamped,
                token,
            }),
            Err(e) => Err(Self::unavailable(format!("failed to apply timestamp: {e}"), pkcs7)),
        }
    }

    fn unavailable(reason: String, pkcs7: Pkcs7SignedData) -> SigningError {
        log::warn!("timestamp unavailable: {reason}");
        SigningError::TimestampUnavailable {
            reason,
            unstamped_signature: pkcs7.into_der(),
        }
    }
}
