//! Timestamp applier service.
//!
//! Attaches an RFC3161 token to the `SignerInfo` as the unsigned
//! `signature-time-stamp-token` attribute. Signed attributes are untouched.

use cms::content_info::ContentInfo;
use der::asn1::{Any, SetOfVec};
use der::Decode;
use x509_cert::attr::Attribute;

use crate::domain::constants;
use crate::domain::pkcs7::Pkcs7SignedData;
use crate::infra::error::{SigningError, SigningResult};

/// Service for applying timestamp tokens to CMS structures.
pub struct TimestampApplier;

impl Default for TimestampApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampApplier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Add `token_der` to the sole signer of `original` as an unsigned attribute.
    ///
    /// The token is embedded byte for byte; it must be a DER `ContentInfo`.
    pub fn apply_timestamp(
        &self,
        original: &Pkcs7SignedData,
        token_der: &[u8],
    ) -> SigningResult<Pkcs7SignedData> {
        ContentInfo::from_der(token_der).map_err(|e| {
            SigningError::TimestampError(format!("Timestamp token is not a DER ContentInfo: {e}"))
        })?;
        let token_value = Any::from_der(token_der)?;

        let mut signed_data = original.signed_data()?;
        let mut signers = signed_data.signer_infos.0.into_vec();
        if signers.len() != 1 {
            return Err(SigningError::Pkcs7Error(format!(
                "Expected exactly one SignerInfo, found {}",
                signers.len()
            )));
        }
        let signer = &mut signers[0];

        let mut unsigned = signer
            .unsigned_attrs
            .take()
            .map(SetOfVec::into_vec)
            .unwrap_or_default();
        if unsigned
            .iter()
            .any(|a| a.oid == constants::ID_AA_SIGNATURE_TIME_STAMP_TOKEN)
        {
            return Err(SigningError::Pkcs7Error(
                "SignerInfo already carries a signature timestamp".into(),
            ));
        }
        unsigned.push(Attribute {
            oid: constants::ID_AA_SIGNATURE_TIME_STAMP_TOKEN,
            values: SetOfVec::try_from(vec![token_value])?,
        });
        signer.unsigned_attrs = Some(SetOfVec::try_from(unsigned)?);

        signed_data.signer_infos = SetOfVec::try_from(signers)?.into();
        let stamped = Pkcs7SignedData::from_signed_data(&signed_data)?;
        log::debug!(
            "Applied timestamp token ({} bytes): {} -> {} bytes",
            token_der.len(),
            original.len(),
            stamped.len()
        );
        Ok(stamped)
    }

    /// Embedded token DER of the sole signer, if any.
    pub fn extract_timestamp(pkcs7: &Pkcs7SignedData) -> SigningResult<Option<Vec<u8>>> {
        let signer = pkcs7.signer_info()?;
        let Some(unsigned) = signer.unsigned_attrs else {
            return Ok(None);
        };
        let Some(attribute) = unsigned
            .iter()
            .find(|a| a.oid == constants::ID_AA_SIGNATURE_TIME_STAMP_TOKEN)
        else {
            return Ok(None);
        };
        let value = attribute.values.get(0).ok_or_else(|| {
            SigningError::Pkcs7Error("Timestamp attribute has no value".into())
        })?;
        Ok(Some(der::Encode::to_der(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::backend::SigningBackend;
    use crate::domain::crypto::{CertChain, HashAlgorithm};
    use crate::domain::pkcs7::timestamp::tests::token_der;
    use crate::domain::pkcs7::timestamp::MessageImprint;
    use crate::domain::pkcs7::TimestampToken;
    use crate::domain::request::{SignatureContent, SignatureType, SigningRequest};
    use crate::services::pkcs7_builder::Pkcs7BuilderService;
    use crate::services::signed_attributes_builder::SignedAttributesBuilder;
    use crate::services::signer_identifier::SignerIdentifierSelector;
    use crate::test_support::signer_with_ski;

    struct FixedBackend;

    impl SigningBackend for FixedBackend {
        fn sign_hash(&self, _hash: &[u8], _algorithm: HashAlgorithm) -> SigningResult<Vec<u8>> {
            Ok(vec![0x42; 256])
        }
    }

    fn unstamped() -> Pkcs7SignedData {
        let cert = signer_with_ski();
        let content = SignatureContent::new(b"content".to_vec()).unwrap();
        let request = SigningRequest::new(cert.clone(), SignatureType::Author);
        let attributes = SignedAttributesBuilder::new()
            .build(&request, HashAlgorithm::Sha256, &content)
            .unwrap();
        Pkcs7BuilderService::new(CertChain::new(cert.clone()), HashAlgorithm::Sha256)
            .assemble(
                &attributes,
                SignerIdentifierSelector::select(&cert).unwrap(),
                &FixedBackend,
                &content,
            )
            .unwrap()
    }

    #[test]
    fn attaches_token_without_touching_signed_attributes() {
        let original = unstamped();
        let imprint = MessageImprint::compute(HashAlgorithm::Sha256, &[0x42; 256]).unwrap();
        let token = token_der(imprint, None);

        let stamped = TimestampApplier::new()
            .apply_timestamp(&original, &token)
            .unwrap();

        let before = original.signer_info().unwrap();
        let after = stamped.signer_info().unwrap();
        assert_eq!(before.signed_attrs, after.signed_attrs);
        assert_eq!(before.signature, after.signature);
        assert_eq!(
            TimestampApplier::extract_timestamp(&stamped).unwrap(),
            Some(token.clone())
        );

        let parsed = TimestampToken::from_der(token).unwrap();
        parsed
            .validate_message_imprint(HashAlgorithm::Sha256, &[0x42; 256])
            .unwrap();
    }

    #[test]
    fn rejects_malformed_token_and_double_stamping() {
        let original = unstamped();
        let applier = TimestampApplier::new();
        assert!(applier.apply_timestamp(&original, &[0x30, 0x01]).is_err());
        assert_eq!(TimestampApplier::extract_timestamp(&original).unwrap(), None);

        let imprint = MessageImprint::compute(HashAlgorithm::Sha256, b"x").unwrap();
        let token = token_der(imprint, None);
        let stamped = applier.apply_timestamp(&original, &token).unwrap();
        assert!(matches!(
            applier.apply_timestamp(&stamped, &token),
            Err(SigningError::Pkcs7Error(_))
        ));
    }
}
