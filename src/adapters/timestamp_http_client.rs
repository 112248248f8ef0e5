//! HTTP client adapter for RFC3161 timestamp authority requests.
//! Provides retry and failover over a list of timestamp servers.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::constants::{TIMESTAMP_QUERY_CONTENT_TYPE, TIMESTAMP_REPLY_CONTENT_TYPE};
use crate::domain::crypto::HashAlgorithm;
use crate::domain::types::TimestampUrl;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::timestamp_parser::TimestampParserService;
use crate::services::timestamp_request_builder::TimestampRequestBuilder;

/// Timestamp client collaborator.
///
/// Returns the DER encoded timestamp token (a `ContentInfo`) for a signature
/// value. Implementations own any retry policy; callers do not retry.
#[async_trait]
pub trait TimestampProvider: Send + Sync {
    /// Request a timestamp token over `signature_value`.
    ///
    /// # Errors
    ///
    /// Network, protocol and policy failures, or [`SigningError::Cancelled`]
    /// when `cancel` fires first.
    async fn request_timestamp(
        &self,
        signature_value: &[u8],
        hash_algorithm: HashAlgorithm,
        cancel: &CancellationToken,
    ) -> SigningResult<Vec<u8>>;
}

/// Configuration for timestamp HTTP operations.
#[derive(Debug, Clone)]
pub struct TimestampHttpConfig {
    pub primary: TimestampUrl,
    pub fallbacks: Vec<TimestampUrl>,
    pub timeout: Duration,
    pub retries_per_server: usize,
    pub retry_delay: Duration,
}

impl TimestampHttpConfig {
    #[must_use]
    pub fn servers(&self) -> Vec<&TimestampUrl> {
        std::iter::once(&self.primary)
            .chain(self.fallbacks.iter())
            .collect()
    }
}

/// HTTP adapter performing RFC3161 POST exchanges.
pub struct TimestampHttpClient {
    cfg: TimestampHttpConfig,
    http: reqwest::Client,
}

impl TimestampHttpClient {
    /// Create a new client from config.
    pub fn new(cfg: TimestampHttpConfig) -> SigningResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(concat!("nupkg-signer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SigningError::NetworkError(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { cfg, http })
    }

    #[must_use]
    pub fn config(&self) -> &TimestampHttpConfig {
        &self.cfg
    }

    /// Attempt to obtain a timestamp response body for the given request DER.
    pub async fn post_request(&self, ts_request_der: &[u8]) -> SigningResult<Vec<u8>> {
        let mut last_err: Option<SigningError> = None;
        for (idx, server) in self.cfg.servers().iter().enumerate() {
            log::info!("timestamp server attempt {}: {}", idx + 1, server.as_str());
            match self.post_with_retries(server, ts_request_der).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    log::warn!("server {} failed: {}", server.as_str(), e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| SigningError::TimestampError("All servers failed".into())))
    }

    async fn post_with_retries(
        &self,
        server: &TimestampUrl,
        body: &[u8],
    ) -> SigningResult<Vec<u8>> {
        let attempts = self.cfg.retries_per_server.max(1);
        let mut last_err: Option<SigningError> = None;
        for attempt in 1..=attempts {
            log::debug!(
                "timestamp http attempt {} of {} -> {}",
                attempt,
                attempts,
                server.as_str()
            );
            match self.single_post(server, body).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.cfg.retry_delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            SigningError::TimestampError(format!("No attempt made against {server}"))
        }))
    }

    async fn single_post(&self, server: &TimestampUrl, body: &[u8]) -> SigningResult<Vec<u8>> {
        let resp = self
            .http
            .post(server.as_str())
            .header("Content-Type", TIMESTAMP_QUERY_CONTENT_TYPE)
            .header("Accept", TIMESTAMP_REPLY_CONTENT_TYPE)
            .body(body.to_vec())
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SigningError::TimestampError(format!(
                "HTTP {} from {}",
                resp.status(),
                server.as_str()
            )));
        }
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn exchange(
        &self,
        signature_value: &[u8],
        hash_algorithm: HashAlgorithm,
    ) -> SigningResult<Vec<u8>> {
        let request = TimestampRequestBuilder::new().build_request(signature_value, hash_algorithm)?;
        let body = self.post_request(&request.der).await?;
        let token = TimestampParserService::parse_response(&body, &request, signature_value)?;
        log::info!(
            "timestamp token received: {} bytes ({hash_algorithm})",
            token.der().len()
        );
        Ok(token.into_der())
    }
}

#[async_trait]
impl TimestampProvider for TimestampHttpClient {
    async fn request_timestamp(
        &self,
        signature_value: &[u8],
        hash_algorithm: HashAlgorithm,
        cancel: &CancellationToken,
    ) -> SigningResult<Vec<u8>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SigningError::Cancelled(
                "timestamp exchange abandoned".into(),
            )),
            result = self.exchange(signature_value, hash_algorithm) => result,
        }
    }
}
