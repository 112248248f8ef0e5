//! CMS `SignedData` domain wrapper.
//! Newtype around the DER `ContentInfo` with structured accessors.

use std::fmt;

use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerInfo};
use der::{Decode, Encode};

use crate::domain::constants;
use crate::domain::crypto::X509Certificate;
use crate::infra::error::{SigningError, SigningResult};

pub mod attributes;
pub mod timestamp;

pub use attributes::{
    CommitmentTypeIndication, EssCertIdV2, IssuerSerial, SignedAttributeSet, SigningCertificateV2,
};
pub use timestamp::TimestampToken;

/// DER encoded `ContentInfo` carrying a detached `SignedData`.
#[derive(Clone, PartialEq, Eq)]
pub struct Pkcs7SignedData {
    der: Vec<u8>,
}

impl Pkcs7SignedData {
    /// Wrap DER bytes; the structure is checked to be a `SignedData` `ContentInfo`.
    pub fn from_der(der: Vec<u8>) -> SigningResult<Self> {
        let signed = Self { der };
        signed.signed_data()?;
        Ok(signed)
    }

    /// Encode a `SignedData` into its `ContentInfo` wrapper.
    pub fn from_signed_data(signed_data: &SignedData) -> SigningResult<Self> {
        let content_info = ContentInfo {
            content_type: constants::ID_SIGNED_DATA,
            content: der::Any::encode_from(signed_data)?,
        };
        Ok(Self {
            der: content_info.to_der()?,
        })
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.der.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }

    pub fn content_info(&self) -> SigningResult<ContentInfo> {
        ContentInfo::from_der(&self.der)
            .map_err(|e| SigningError::Pkcs7Error(format!("Malformed ContentInfo: {e}")))
    }

    pub fn signed_data(&self) -> SigningResult<SignedData> {
        let content_info = self.content_info()?;
        if content_info.content_type != constants::ID_SIGNED_DATA {
            return Err(SigningError::Pkcs7Error(format!(
                "Expected signedData content type, found {}",
                content_info.content_type
            )));
        }
        content_info
            .content
            .decode_as::<SignedData>()
            .map_err(|e| SigningError::Pkcs7Error(format!("Malformed SignedData: {e}")))
    }

    /// The sole `SignerInfo`; more or fewer than one is an error.
    pub fn signer_info(&self) -> SigningResult<SignerInfo> {
        let signed_data = self.signed_data()?;
        let mut signers = signed_data.signer_infos.0.into_vec();
        if signers.len() != 1 {
            return Err(SigningError::Pkcs7Error(format!(
                "Expected exactly one SignerInfo, found {}",
                signers.len()
            )));
        }
        Ok(signers.remove(0))
    }

    /// Certificates embedded in the `certificates` field, in encoded order.
    pub fn certificates(&self) -> SigningResult<Vec<X509Certificate>> {
        let signed_data = self.signed_data()?;
        let Some(set) = signed_data.certificates else {
            return Ok(Vec::new());
        };
        set.0
            .iter()
            .map(|choice| match choice {
                cms::cert::CertificateChoices::Certificate(cert) => {
                    X509Certificate::from_certificate(cert.clone())
                }
                cms::cert::CertificateChoices::Other(_) => Err(SigningError::Pkcs7Error(
                    "Unsupported certificate choice in SignedData".into(),
                )),
            })
            .collect()
    }

    /// Signature bytes of the sole signer.
    pub fn signature_value(&self) -> SigningResult<Vec<u8>> {
        Ok(self.signer_info()?.signature.as_bytes().to_vec())
    }
}

impl fmt::Debug for Pkcs7SignedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pkcs7SignedData(len={})", self.der.len())
    }
}
