//! Chain validation engine interface and an in-memory implementation.

use crate::domain::chain::{ChainPolicy, RevocationMode};
use crate::domain::constants;
use crate::domain::crypto::{CertChain, X509Certificate};
use crate::infra::error::{SigningError, SigningResult};

/// Chain validation engine collaborator.
pub trait ChainBuilder: Send + Sync {
    /// Build the ordered chain (leaf first) for `leaf` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::ChainError`] when no acceptable chain to a
    /// trusted root exists.
    fn build_chain(&self, leaf: &X509Certificate, policy: &ChainPolicy) -> SigningResult<CertChain>;
}

/// Chain builder over caller supplied trusted roots and untrusted
/// intermediates.
///
/// Links are matched on issuer/subject names and, when both sides carry
/// them, authority/subject key identifiers. Revocation is not evaluated.
#[derive(Debug, Clone, Default)]
pub struct CertificatePool {
    roots: Vec<X509Certificate>,
    intermediates: Vec<X509Certificate>,
}

impl CertificatePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_root(mut self, root: X509Certificate) -> Self {
        self.add_root(root);
        self
    }

    #[must_use]
    pub fn with_intermediate(mut self, intermediate: X509Certificate) -> Self {
        self.add_intermediate(intermediate);
        self
    }

    pub fn add_root(&mut self, root: X509Certificate) {
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    pub fn add_intermediate(&mut self, intermediate: X509Certificate) {
        if !self.intermediates.contains(&intermediate) {
            self.intermediates.push(intermediate);
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[X509Certificate] {
        &self.roots
    }

    fn is_trusted(&self, cert: &X509Certificate) -> bool {
        self.roots.contains(cert)
    }

    fn issued(child: &X509Certificate, candidate: &X509Certificate) -> SigningResult<bool> {
        if candidate.subject() != child.issuer() {
            return Ok(false);
        }
        match (
            child.authority_key_identifier()?,
            candidate.subject_key_identifier()?,
        ) {
            (Some(aki), Some(ski)) => Ok(aki == ski),
            _ => Ok(true),
        }
    }

    fn find_issuer(
        &self,
        child: &X509Certificate,
        chain: &[X509Certificate],
        policy: &ChainPolicy,
    ) -> SigningResult<Option<&X509Certificate>> {
        for candidate in self.roots.iter().chain(self.intermediates.iter()) {
            if candidate == child || chain.contains(candidate) {
                continue;
            }
            if !Self::issued(child, candidate)? {
                continue;
            }
            if !candidate.is_valid_at(policy.verification_time) {
                log::debug!(
                    "skipping issuer candidate {} outside its validity period",
                    candidate.subject()
                );
                continue;
            }
            return Ok(Some(candidate));
        }
        Ok(None)
    }

    fn check_application_policy(chain: &[X509Certificate], policy: &ChainPolicy) -> SigningResult<()> {
        let Some(required) = policy.required_application_policy else {
            return Ok(());
        };
        for cert in chain {
            // An absent EKU extension places no restriction.
            if let Some(usages) = cert.extended_key_usage()? {
                if !usages
                    .iter()
                    .any(|u| *u == required || *u == constants::ANY_EXTENDED_KEY_USAGE)
                {
                    return Err(SigningError::ChainError(format!(
                        "{} does not permit application policy {required}",
                        cert.subject()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl ChainBuilder for CertificatePool {
    fn build_chain(&self, leaf: &X509Certificate, policy: &ChainPolicy) -> SigningResult<CertChain> {
        if !leaf.is_valid_at(policy.verification_time) {
            return Err(SigningError::ChainError(format!(
                "{} is not valid at the verification time",
                leaf.subject()
            )));
        }

        let mut chain = vec![leaf.clone()];
        while !self.is_trusted(&chain[chain.len() - 1]) {
            if chain.len() >= constants::MAX_CHAIN_DEPTH {
                return Err(SigningError::ChainError(format!(
                    "chain exceeds {} certificates",
                    constants::MAX_CHAIN_DEPTH
                )));
            }
            let current = &chain[chain.len() - 1];
            let Some(issuer) = self.find_issuer(current, &chain, policy)? else {
                let reason = if current.is_self_issued() {
                    "self-issued certificate is not a trusted root"
                } else {
                    "no issuer found in the certificate pool"
                };
                return Err(SigningError::ChainError(format!(
                    "{}: {reason}",
                    current.subject()
                )));
            };
            chain.push(issuer.clone());
        }

        Self::check_application_policy(&chain, policy)?;

        if policy.revocation_mode != RevocationMode::NoCheck {
            log::debug!(
                "revocation mode {:?} ({:?}) requested; certificate pool does not fetch revocation data",
                policy.revocation_mode,
                policy.revocation_flag
            );
        }

        log::debug!("built chain of {} certificates for {}", chain.len(), leaf.subject());
        CertChain::from_certificates(chain)
    }
}
