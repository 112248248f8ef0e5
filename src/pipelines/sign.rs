//! `SignWorkflow` orchestrates core signing steps.
//!
//! Validate request → resolve chain → build signed attributes → select
//! signer identifier → assemble CMS → optional timestamp. Everything up to
//! assembly is synchronous; the timestamp step is the only suspension point.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapters::backend::SigningBackend;
use crate::adapters::certificate_pool::ChainBuilder;
use crate::adapters::timestamp_http_client::TimestampProvider;
use crate::domain::chain::ChainStatus;
use crate::domain::pkcs7::Pkcs7SignedData;
use crate::domain::request::{ResolvedAlgorithms, SignatureContent, SigningRequest};
use crate::infra::config::SignerConfiguration;
use crate::pipelines::timestamp::TimestampWorkflow;
use crate::services::{
    ChainResolver, Pkcs7BuilderService, SignedAttributesBuilder, SignerIdentifierSelector,
};
use crate::{SigningError, SigningResult};

/// Final output of one signing operation.
#[derive(Debug, Clone)]
pub struct SignatureArtifact {
    /// DER `ContentInfo` wrapping the detached `SignedData`.
    pub der: Vec<u8>,
    pub chain_status: ChainStatus,
    /// Embedded timestamp token, when one was requested and obtained.
    pub timestamp_token: Option<Vec<u8>>,
}

impl SignatureArtifact {
    #[must_use]
    pub fn is_timestamped(&self) -> bool {
        self.timestamp_token.is_some()
    }

    /// Structured view of the encoded signature.
    pub fn pkcs7(&self) -> SigningResult<Pkcs7SignedData> {
        Pkcs7SignedData::from_der(self.der.clone())
    }
}

pub struct SignWorkflow {
    backend: Arc<dyn SigningBackend>,
    chain_builder: Arc<dyn ChainBuilder>,
    timestamp_provider: Option<Arc<dyn TimestampProvider>>,
    config: SignerConfiguration,
}

impl SignWorkflow {
    #[must_use]
    pub fn new(backend: Arc<dyn SigningBackend>, chain_builder: Arc<dyn ChainBuilder>) -> Self {
        Self {
            backend,
            chain_builder,
            timestamp_provider: None,
            config: SignerConfiguration::default(),
        }
    }

    #[must_use]
    pub fn with_timestamp_provider(mut self, provider: Arc<dyn TimestampProvider>) -> Self {
        self.timestamp_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SignerConfiguration) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SignerConfiguration {
        &self.config
    }

    /// Sign `content` for `request`.
    ///
    /// Request validation and algorithm resolution run before any chain,
    /// signing or network work. Algorithms the request leaves unset come from
    /// the configured defaults.
    pub async fn sign(
        &self,
        request: &SigningRequest,
        content: &[u8],
        cancel: &CancellationToken,
    ) -> SigningResult<SignatureArtifact> {
        let defaults = ResolvedAlgorithms {
            signature: self.config.signature_hash_algorithm()?,
            timestamp: self.config.timestamp_hash_algorithm()?,
        };
        let algorithms = request.validate_with_defaults(defaults)?;
        let content = SignatureContent::new(content.to_vec())?;
        log::info!(
            "signing {} bytes as {} signature ({} / timestamp {})",
            content.as_bytes().len(),
            request.signature_type,
            algorithms.signature,
            algorithms.timestamp
        );

        if cancel.is_cancelled() {
            return Err(SigningError::Cancelled(
                "cancelled before chain resolution".into(),
            ));
        }
        let resolved = ChainResolver::new(Arc::clone(&self.chain_builder), self.config.clone())
            .resolve(&request.signer_certificate, request.signing_time)?;
        let chain_status = resolved.status();

        let attributes =
            SignedAttributesBuilder::new().build(request, algorithms.signature, &content)?;
        let identifier = SignerIdentifierSelector::select(&request.signer_certificate)?;

        if cancel.is_cancelled() {
            return Err(SigningError::Cancelled(
                "cancelled before signing".into(),
            ));
        }

        let pkcs7 = Pkcs7BuilderService::new(resolved.into_chain(), algorithms.signature)
            .assemble(&attributes, identifier, self.backend.as_ref(), &content)?;

        let Some(provider) = &self.timestamp_provider else {
            log::info!("no timestamp provider configured; returning unstamped signature");
            return Ok(SignatureArtifact {
                der: pkcs7.into_der(),
                chain_status,
                timestamp_token: None,
            });
        };

        let stamped = TimestampWorkflow::new(algorithms.timestamp, Arc::clone(provider))
            .timestamp_pkcs7(pkcs7, cancel)
            .await?;
        Ok(SignatureArtifact {
            der: stamped.pkcs7.into_der(),
            chain_status,
            timestamp_token: Some(stamped.token),
        })
    }
}
