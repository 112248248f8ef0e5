//! Signed attribute ASN.1 types and the canonical attribute set.
//!
//! ```text
//! CommitmentTypeIndication ::= SEQUENCE {
//!   commitmentTypeId CommitmentTypeIdentifier,
//!   commitmentTypeQualifier SEQUENCE SIZE (1..MAX) OF CommitmentTypeQualifier OPTIONAL }
//!
//! SigningCertificateV2 ::= SEQUENCE {
//!   certs SEQUENCE OF ESSCertIDv2,
//!   policies SEQUENCE OF PolicyInformation OPTIONAL }
//!
//! ESSCertIDv2 ::= SEQUENCE {
//!   hashAlgorithm AlgorithmIdentifier DEFAULT {algorithm id-sha256},
//!   certHash Hash,
//!   issuerSerial IssuerSerial OPTIONAL }
//!
//! IssuerSerial ::= SEQUENCE {
//!   issuer GeneralNames,
//!   serialNumber CertificateSerialNumber }
//! ```

use std::fmt;

use const_oid::ObjectIdentifier;
use der::asn1::{Any, OctetString, SetOfVec};
use der::{Decode, Encode, Sequence};
use spki::AlgorithmIdentifierOwned;
use x509_cert::attr::Attribute;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::serial_number::SerialNumber;

use crate::domain::constants;
use crate::infra::error::{SigningError, SigningResult};

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CommitmentTypeIndication {
    pub commitment_type_id: ObjectIdentifier,
    #[asn1(optional = "true")]
    pub commitment_type_qualifier: Option<Vec<Any>>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SigningCertificateV2 {
    pub certs: Vec<EssCertIdV2>,
}

/// `hash_algorithm` is `None` when the DEFAULT (SHA-256) applies; DER
/// forbids encoding a value equal to its default.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EssCertIdV2 {
    #[asn1(optional = "true")]
    pub hash_algorithm: Option<AlgorithmIdentifierOwned>,
    pub cert_hash: OctetString,
    #[asn1(optional = "true")]
    pub issuer_serial: Option<IssuerSerial>,
}

#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct IssuerSerial {
    pub issuer: Vec<GeneralName>,
    pub serial_number: SerialNumber,
}

impl EssCertIdV2 {
    /// Algorithm of `cert_hash`, resolving an absent field to SHA-256.
    #[must_use]
    pub fn hash_algorithm_oid(&self) -> ObjectIdentifier {
        self.hash_algorithm
            .as_ref()
            .map_or(constants::ID_SHA256, |alg| alg.oid)
    }
}

/// Build an attribute with a single value.
pub fn single_value_attribute<T: Encode>(
    oid: ObjectIdentifier,
    value: &T,
) -> SigningResult<Attribute> {
    let values = SetOfVec::try_from(vec![Any::from_der(&value.to_der()?)?])?;
    Ok(Attribute { oid, values })
}

/// Decode the single value of `attribute` as `T`.
pub fn decode_single_value<T>(attribute: &Attribute) -> SigningResult<T>
where
    T: for<'a> Decode<'a>,
{
    if attribute.values.len() != 1 {
        return Err(SigningError::Pkcs7Error(format!(
            "Attribute {} must have exactly one value, found {}",
            attribute.oid,
            attribute.values.len()
        )));
    }
    let value = attribute
        .values
        .get(0)
        .ok_or_else(|| SigningError::Pkcs7Error(format!("Attribute {} is empty", attribute.oid)))?;
    Ok(T::from_der(&value.to_der()?)?)
}

/// Canonically ordered signed attribute set.
///
/// Holds at most one attribute per type and always exactly one
/// commitment-type-indication and one signing-certificate-v2 attribute.
/// Ordering is the DER SET OF ordering, so the encoding is deterministic
/// regardless of insertion order.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAttributeSet {
    attributes: SetOfVec<Attribute>,
}

impl SignedAttributeSet {
    pub fn new(attributes: Vec<Attribute>) -> SigningResult<Self> {
        let mut seen: Vec<ObjectIdentifier> = Vec::with_capacity(attributes.len());
        for attribute in &attributes {
            if seen.contains(&attribute.oid) {
                return Err(SigningError::Pkcs7Error(format!(
                    "Duplicate signed attribute {}",
                    attribute.oid
                )));
            }
            seen.push(attribute.oid);
        }
        for required in [
            constants::ID_AA_COMMITMENT_TYPE_INDICATION,
            constants::ID_AA_SIGNING_CERTIFICATE_V2,
        ] {
            if !seen.contains(&required) {
                return Err(SigningError::Pkcs7Error(format!(
                    "Missing required signed attribute {required}"
                )));
            }
        }
        Ok(Self {
            attributes: SetOfVec::try_from(attributes)?,
        })
    }

    /// Wrap attributes decoded from an existing `SignerInfo`.
    pub fn from_set(attributes: SetOfVec<Attribute>) -> SigningResult<Self> {
        Self::new(attributes.into_vec())
    }

    #[must_use]
    pub fn get(&self, oid: ObjectIdentifier) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.oid == oid)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.as_slice().iter()
    }

    /// DER of the `SET OF Attribute`; this is what gets digested and signed.
    pub fn to_der(&self) -> SigningResult<Vec<u8>> {
        Ok(self.attributes.to_der()?)
    }

    #[must_use]
    pub fn as_set(&self) -> &SetOfVec<Attribute> {
        &self.attributes
    }

    #[must_use]
    pub fn into_set(self) -> SetOfVec<Attribute> {
        self.attributes
    }

    fn required(&self, oid: ObjectIdentifier) -> SigningResult<&Attribute> {
        self.get(oid)
            .ok_or_else(|| SigningError::Pkcs7Error(format!("Signed attribute {oid} not present")))
    }

    pub fn commitment_type_indication(&self) -> SigningResult<CommitmentTypeIndication> {
        decode_single_value(self.required(constants::ID_AA_COMMITMENT_TYPE_INDICATION)?)
    }

    pub fn signing_certificate_v2(&self) -> SigningResult<SigningCertificateV2> {
        decode_single_value(self.required(constants::ID_AA_SIGNING_CERTIFICATE_V2)?)
    }

    pub fn message_digest(&self) -> SigningResult<Vec<u8>> {
        let digest: OctetString = decode_single_value(self.required(constants::ID_MESSAGE_DIGEST)?)?;
        Ok(digest.as_bytes().to_vec())
    }

    pub fn content_type(&self) -> SigningResult<ObjectIdentifier> {
        decode_single_value(self.required(constants::ID_CONTENT_TYPE)?)
    }
}

impl fmt::Debug for SignedAttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.attributes.iter().map(|a| a.oid))
            .finish()
    }
}
