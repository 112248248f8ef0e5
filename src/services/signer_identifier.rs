//! Signer identifier selection.
//!
//! Subject key identifier when the certificate carries the extension,
//! issuer and serial number otherwise.

use cms::cert::IssuerAndSerialNumber;
use cms::content_info::CmsVersion;
use cms::signed_data::SignerIdentifier;
use der::asn1::OctetString;
use x509_cert::ext::pkix::SubjectKeyIdentifier;

use crate::domain::crypto::X509Certificate;
use crate::infra::error::SigningResult;

/// Selected identifier and the `SignerInfo` version it implies.
#[derive(Debug, Clone)]
pub struct SelectedSignerIdentifier {
    pub identifier: SignerIdentifier,
    pub version: CmsVersion,
}

impl SelectedSignerIdentifier {
    #[must_use]
    pub fn is_subject_key_identifier(&self) -> bool {
        matches!(self.identifier, SignerIdentifier::SubjectKeyIdentifier(_))
    }
}

pub struct SignerIdentifierSelector;

impl SignerIdentifierSelector {
    pub fn select(certificate: &X509Certificate) -> SigningResult<SelectedSignerIdentifier> {
        if let Some(ski) = certificate.subject_key_identifier()? {
            log::debug!("identifying signer by subject key identifier {}", hex::encode(&ski));
            return Ok(SelectedSignerIdentifier {
                identifier: SignerIdentifier::SubjectKeyIdentifier(SubjectKeyIdentifier(
                    OctetString::new(ski)?,
                )),
                version: CmsVersion::V3,
            });
        }

        log::debug!(
            "no subject key identifier; identifying signer by issuer {} and serial {}",
            certificate.issuer(),
            certificate.serial_number()
        );
        Ok(SelectedSignerIdentifier {
            identifier: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: certificate.issuer().clone(),
                serial_number: certificate.serial_number().clone(),
            }),
            version: CmsVersion::V1,
        })
    }
}
