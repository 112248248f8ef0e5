//! RFC3161 timestamp protocol types and the timestamp token domain type.
//!
//! Located under `domain::pkcs7` because the timestamp token is an unsigned
//! attribute adjunct to a CMS `SignedData` structure.

use std::time::SystemTime;

use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, BitString, GeneralizedTime, OctetString, Uint};
use der::{Decode, Encode, Sequence};
use spki::AlgorithmIdentifierOwned;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::Extensions;

use crate::domain::constants;
use crate::domain::crypto::HashAlgorithm;
use crate::infra::error::{SigningError, SigningResult};

/// `MessageImprint ::= SEQUENCE { hashAlgorithm, hashedMessage }`
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct MessageImprint {
    pub hash_algorithm: AlgorithmIdentifierOwned,
    pub hashed_message: OctetString,
}

impl MessageImprint {
    /// Imprint of `data` under `algorithm`.
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> SigningResult<Self> {
        Ok(Self {
            hash_algorithm: algorithm.algorithm_identifier(),
            hashed_message: OctetString::new(algorithm.digest(data))?,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TimeStampReq {
    pub version: u8,
    pub message_imprint: MessageImprint,
    #[asn1(optional = "true")]
    pub req_policy: Option<ObjectIdentifier>,
    #[asn1(optional = "true")]
    pub nonce: Option<Uint>,
    #[asn1(default = "Default::default")]
    pub cert_req: bool,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub extensions: Option<Extensions>,
}

/// `PKIStatusInfo`; `status` 0 is granted and 1 granted with modifications.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct PkiStatusInfo {
    pub status: u8,
    #[asn1(optional = "true")]
    pub status_string: Option<Vec<String>>,
    #[asn1(optional = "true")]
    pub fail_info: Option<BitString>,
}

impl PkiStatusInfo {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.status == 0 || self.status == 1
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TimeStampResp {
    pub status: PkiStatusInfo,
    #[asn1(optional = "true")]
    pub time_stamp_token: Option<ContentInfo>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Accuracy {
    #[asn1(optional = "true")]
    pub seconds: Option<u32>,
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub millis: Option<u16>,
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub micros: Option<u16>,
}

/// `TSTInfo`, the encapsulated content of a timestamp token.
///
/// `gen_time` is kept as raw `Any` because many authorities emit fractional
/// seconds, which strict `GeneralizedTime` decoding rejects.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TstInfo {
    pub version: u8,
    pub policy: ObjectIdentifier,
    pub message_imprint: MessageImprint,
    pub serial_number: Uint,
    pub gen_time: Any,
    #[asn1(optional = "true")]
    pub accuracy: Option<Accuracy>,
    #[asn1(default = "Default::default")]
    pub ordering: bool,
    #[asn1(optional = "true")]
    pub nonce: Option<Uint>,
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", optional = "true")]
    pub tsa: Option<GeneralName>,
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", optional = "true")]
    pub extensions: Option<Extensions>,
}

impl TstInfo {
    /// Generation time, when it is encoded without fractional seconds.
    #[must_use]
    pub fn gen_time(&self) -> Option<SystemTime> {
        self.gen_time
            .decode_as::<GeneralizedTime>()
            .ok()
            .map(|t| t.to_system_time())
    }
}

/// RFC3161 timestamp token: a DER `ContentInfo` wrapping a `SignedData`
/// whose encapsulated content is a `TSTInfo`.
#[derive(Debug, Clone)]
pub struct TimestampToken {
    der: Vec<u8>,
    tst_info: TstInfo,
}

impl TimestampToken {
    /// Parse a token from its DER encoding.
    pub fn from_der(der: Vec<u8>) -> SigningResult<Self> {
        let content_info = ContentInfo::from_der(&der).map_err(|e| {
            SigningError::TimestampError(format!("Timestamp token is not a ContentInfo: {e}"))
        })?;
        let tst_info = Self::parse_tst_info(&content_info)?;
        Ok(Self { der, tst_info })
    }

    /// Build from an already decoded `ContentInfo` (as found in a `TimeStampResp`).
    pub fn from_content_info(content_info: &ContentInfo) -> SigningResult<Self> {
        let tst_info = Self::parse_tst_info(content_info)?;
        Ok(Self {
            der: content_info.to_der()?,
            tst_info,
        })
    }

    fn parse_tst_info(content_info: &ContentInfo) -> SigningResult<TstInfo> {
        if content_info.content_type != constants::ID_SIGNED_DATA {
            return Err(SigningError::TimestampError(format!(
                "Timestamp token content type {} is not signedData",
                content_info.content_type
            )));
        }
        let signed_data: SignedData = content_info.content.decode_as().map_err(|e| {
            SigningError::TimestampError(format!("Malformed timestamp SignedData: {e}"))
        })?;
        let encap = signed_data.encap_content_info;
        if encap.econtent_type != constants::ID_CT_TST_INFO {
            return Err(SigningError::TimestampError(format!(
                "Timestamp token encapsulates {} instead of TSTInfo",
                encap.econtent_type
            )));
        }
        let econtent = encap.econtent.ok_or_else(|| {
            SigningError::TimestampError("Timestamp token has no TSTInfo content".into())
        })?;
        let octets: OctetString = econtent.decode_as()?;
        TstInfo::from_der(octets.as_bytes())
            .map_err(|e| SigningError::TimestampError(format!("Malformed TSTInfo: {e}")))
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    #[must_use]
    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    #[must_use]
    pub fn tst_info(&self) -> &TstInfo {
        &self.tst_info
    }

    #[must_use]
    pub fn message_imprint_hash(&self) -> &[u8] {
        self.tst_info.message_imprint.hashed_message.as_bytes()
    }

    #[must_use]
    pub fn hash_algorithm_oid(&self) -> ObjectIdentifier {
        self.tst_info.message_imprint.hash_algorithm.oid
    }

    #[must_use]
    pub fn nonce(&self) -> Option<&Uint> {
        self.tst_info.nonce.as_ref()
    }

    /// Check that the token's imprint is the hash of `data` under `algorithm`.
    pub fn validate_message_imprint(
        &self,
        algorithm: HashAlgorithm,
        data: &[u8],
    ) -> SigningResult<()> {
        if self.hash_algorithm_oid() != algorithm.oid() {
            return Err(SigningError::TimestampError(format!(
                "Message imprint algorithm {} does not match requested {}",
                self.hash_algorithm_oid(),
                algorithm
            )));
        }
        let expected = algorithm.digest(data);
        if self.message_imprint_hash() != expected.as_slice() {
            return Err(SigningError::TimestampError(
                "Message imprint hash does not match signature value".into(),
            ));
        }
        log::debug!("Message imprint validation passed ({algorithm})");
        Ok(())
    }
}
