//! Service for constructing and canonicalizing signed attributes.

use std::time::SystemTime;

use der::asn1::{GeneralizedTime, Ia5String, OctetString, UtcTime};
use der::DateTime;
use x509_cert::attr::Attribute;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::time::Time;

use crate::domain::constants;
use crate::domain::crypto::{HashAlgorithm, X509Certificate};
use crate::domain::pkcs7::attributes::single_value_attribute;
use crate::domain::pkcs7::{
    CommitmentTypeIndication, EssCertIdV2, IssuerSerial, SignedAttributeSet, SigningCertificateV2,
};
use crate::domain::request::{RepositoryMetadata, SignatureContent, SignatureType, SigningRequest};
use crate::infra::error::{SigningError, SigningResult};

pub struct SignedAttributesBuilder; // stateless

impl Default for SignedAttributesBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SignedAttributesBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the complete signed attribute set for `request` over `content`.
    ///
    /// `hash_algorithm` is the resolved signature hash algorithm; it is used
    /// both for the message digest and the signing-certificate-v2 hash.
    pub fn build(
        &self,
        request: &SigningRequest,
        hash_algorithm: HashAlgorithm,
        content: &SignatureContent,
    ) -> SigningResult<SignedAttributeSet> {
        let mut attributes = vec![
            single_value_attribute(constants::ID_CONTENT_TYPE, &constants::ID_DATA)?,
            Self::message_digest(hash_algorithm, content)?,
            Self::signing_time(request.signing_time)?,
            Self::commitment_type_indication(request.signature_type)?,
            Self::signing_certificate_v2(&request.signer_certificate, hash_algorithm)?,
        ];
        if let Some(metadata) = &request.repository_metadata {
            attributes.extend(Self::repository_attributes(metadata)?);
        }

        let set = SignedAttributeSet::new(attributes)?;
        log::debug!(
            "built {} signed attributes ({} signature, {hash_algorithm})",
            set.len(),
            request.signature_type
        );
        Ok(set)
    }

    /// `commitment-type-indication` for the given signature type.
    pub fn commitment_type_indication(signature_type: SignatureType) -> SigningResult<Attribute> {
        single_value_attribute(
            constants::ID_AA_COMMITMENT_TYPE_INDICATION,
            &CommitmentTypeIndication {
                commitment_type_id: signature_type.commitment_type_oid(),
                commitment_type_qualifier: None,
            },
        )
    }

    /// `signing-certificate-v2` binding `certificate` by hash and issuer/serial.
    pub fn signing_certificate_v2(
        certificate: &X509Certificate,
        hash_algorithm: HashAlgorithm,
    ) -> SigningResult<Attribute> {
        let cert_hash = OctetString::new(hash_algorithm.digest(certificate.as_der())).map_err(
            |e| SigningError::CertificateError(format!("Failed to hash signer certificate: {e}")),
        )?;
        // SHA-256 is the DEFAULT and must be left out of the encoding.
        let explicit_algorithm = match hash_algorithm {
            HashAlgorithm::Sha256 => None,
            other => Some(other.algorithm_identifier()),
        };
        let ess_cert_id = EssCertIdV2 {
            hash_algorithm: explicit_algorithm,
            cert_hash,
            issuer_serial: Some(IssuerSerial {
                issuer: vec![GeneralName::DirectoryName(certificate.issuer().clone())],
                serial_number: certificate.serial_number().clone(),
            }),
        };
        single_value_attribute(
            constants::ID_AA_SIGNING_CERTIFICATE_V2,
            &SigningCertificateV2 {
                certs: vec![ess_cert_id],
            },
        )
    }

    fn message_digest(
        hash_algorithm: HashAlgorithm,
        content: &SignatureContent,
    ) -> SigningResult<Attribute> {
        let digest = OctetString::new(hash_algorithm.digest(content.as_bytes()))?;
        single_value_attribute(constants::ID_MESSAGE_DIGEST, &digest)
    }

    /// UTCTime through 2049, GeneralizedTime afterwards.
    fn signing_time(time: SystemTime) -> SigningResult<Attribute> {
        let date_time = DateTime::from_system_time(time)
            .map_err(|e| SigningError::InvalidInput(format!("Signing time out of range: {e}")))?;
        let time = if date_time.year() < 2050 {
            Time::UtcTime(UtcTime::from_date_time(date_time)?)
        } else {
            Time::GeneralTime(GeneralizedTime::from_date_time(date_time))
        };
        single_value_attribute(constants::ID_SIGNING_TIME, &time)
    }

    fn repository_attributes(metadata: &RepositoryMetadata) -> SigningResult<Vec<Attribute>> {
        let url = Ia5String::new(&metadata.v3_service_index_url).map_err(|e| {
            SigningError::InvalidInput(format!("V3 service index URL is not IA5: {e}"))
        })?;
        let mut attributes = vec![single_value_attribute(
            constants::NUGET_V3_SERVICE_INDEX_URL,
            &url,
        )?];
        if !metadata.package_owners.is_empty() {
            attributes.push(single_value_attribute(
                constants::NUGET_PACKAGE_OWNERS,
                &metadata.package_owners,
            )?);
        }
        Ok(attributes)
    }
}
