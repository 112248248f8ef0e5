//! CMS `SignedData` assembly.
//!
//! Builds a detached `SignedData` with one `SignerInfo`, the resolved
//! certificate chain and the signed attribute set, then wraps it in a
//! `ContentInfo`. The signing backend is called exactly once per assembly.

use cms::cert::CertificateChoices;
use cms::content_info::CmsVersion;
use cms::signed_data::{EncapsulatedContentInfo, SignedData, SignerInfo};
use der::asn1::{OctetString, SetOfVec};

use crate::adapters::backend::SigningBackend;
use crate::domain::constants;
use crate::domain::crypto::{CertChain, CmsSignature, DigestBytes};
use crate::domain::pkcs7::{Pkcs7SignedData, SignedAttributeSet};
use crate::domain::request::SignatureContent;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::signer_identifier::SelectedSignerIdentifier;
use crate::HashAlgorithm;

pub struct Pkcs7BuilderService {
    chain: CertChain,
    hash_algorithm: HashAlgorithm,
}

impl Pkcs7BuilderService {
    #[must_use]
    pub fn new(chain: CertChain, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            chain,
            hash_algorithm,
        }
    }

    /// Sign `attributes` through `backend` and assemble the `ContentInfo`.
    ///
    /// `content` is only digested; it is checked against the message-digest
    /// attribute and never embedded.
    pub fn assemble(
        &self,
        attributes: &SignedAttributeSet,
        identifier: SelectedSignerIdentifier,
        backend: &dyn SigningBackend,
        content: &SignatureContent,
    ) -> SigningResult<Pkcs7SignedData> {
        let signer = self.chain.leaf();
        if !signer.has_rsa_key() {
            return Err(SigningError::UnsupportedAlgorithm(
                "only RSA signer keys are supported".into(),
            ));
        }
        if attributes.message_digest()? != self.hash_algorithm.digest(content.as_bytes()) {
            return Err(SigningError::Pkcs7Error(
                "message-digest attribute does not match the content".into(),
            ));
        }

        let attributes_der = attributes.to_der()?;
        let to_be_signed = DigestBytes::compute(self.hash_algorithm, &attributes_der);
        log::debug!(
            "signing {} bytes of signed attributes ({}) via {}",
            attributes_der.len(),
            self.hash_algorithm,
            backend.name()
        );
        let signature = CmsSignature::new(
            self.hash_algorithm,
            backend.sign_hash(to_be_signed.as_slice(), to_be_signed.algorithm())?,
        )?;

        let signer_version = identifier.version;
        let signer_info = SignerInfo {
            version: signer_version,
            sid: identifier.identifier,
            digest_alg: self.hash_algorithm.algorithm_identifier(),
            signed_attrs: Some(attributes.as_set().clone()),
            signature_algorithm: self.hash_algorithm.rsa_signature_algorithm_identifier(),
            signature: OctetString::new(signature.into_bytes())?,
            unsigned_attrs: None,
        };

        let certificates = self
            .chain
            .certificates()
            .iter()
            .map(|cert| CertificateChoices::Certificate(cert.certificate().clone()))
            .collect::<Vec<_>>();

        let signed_data = SignedData {
            version: if signer_version == CmsVersion::V3 {
                CmsVersion::V3
            } else {
                CmsVersion::V1
            },
            digest_algorithms: SetOfVec::try_from(vec![self.hash_algorithm.algorithm_identifier()])?,
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: constants::ID_DATA,
                econtent: None,
            },
            certificates: Some(SetOfVec::try_from(certificates)?.into()),
            crls: None,
            signer_infos: SetOfVec::try_from(vec![signer_info])?.into(),
        };

        let pkcs7 = Pkcs7SignedData::from_signed_data(&signed_data)?;
        log::info!(
            "assembled SignedData: {} bytes, {} certificates",
            pkcs7.len(),
            self.chain.len()
        );
        Ok(pkcs7)
    }
}
