//! Certificate chain resolution with single-certificate fallback.

use std::sync::Arc;
use std::time::SystemTime;

use crate::adapters::certificate_pool::ChainBuilder;
use crate::domain::chain::{ChainPolicy, ResolvedChain};
use crate::domain::crypto::{CertChain, X509Certificate};
use crate::infra::config::SignerConfiguration;
use crate::infra::error::{SigningError, SigningResult};

/// Resolves the signer's chain through a [`ChainBuilder`].
///
/// A failed build degrades to a chain holding only the signer certificate
/// and is reported as [`ResolvedChain::Fallback`] with a warning. With
/// `allow_untrusted_fallback` disabled the failure is returned instead.
pub struct ChainResolver {
    builder: Arc<dyn ChainBuilder>,
    config: SignerConfiguration,
}

impl ChainResolver {
    pub fn new(builder: Arc<dyn ChainBuilder>, config: SignerConfiguration) -> Self {
        Self { builder, config }
    }

    /// Resolve the chain for `signer` as of `verification_time`.
    pub fn resolve(
        &self,
        signer: &X509Certificate,
        verification_time: SystemTime,
    ) -> SigningResult<ResolvedChain> {
        let policy = self.config.chain_policy(verification_time)?;
        self.resolve_with_policy(signer, &policy)
    }

    pub fn resolve_with_policy(
        &self,
        signer: &X509Certificate,
        policy: &ChainPolicy,
    ) -> SigningResult<ResolvedChain> {
        let reason = match self.builder.build_chain(signer, policy) {
            Ok(chain) if chain.leaf() == signer => {
                log::debug!("resolved chain of {} certificates", chain.len());
                return Ok(ResolvedChain::Full(chain));
            }
            Ok(chain) => format!(
                "chain builder returned a chain for {} instead of the signer",
                chain.leaf().subject()
            ),
            Err(e) => e.to_string(),
        };

        if !self.config.chain_policy.allow_untrusted_fallback {
            return Err(SigningError::ChainError(format!(
                "chain building failed for {} and untrusted fallback is disabled: {reason}",
                signer.subject()
            )));
        }

        log::warn!(
            "chain building failed for {} ({reason}); signing with the signer certificate only. \
             Verifiers without the issuing certificates may not trust this signature",
            signer.subject()
        );
        Ok(ResolvedChain::Fallback {
            chain: CertChain::new(signer.clone()),
            reason,
        })
    }
}
