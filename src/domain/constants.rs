//! Centralized object identifiers used by the signer.
//! Keep this intentionally small; only broadly reused identifiers should live here.

use const_oid::ObjectIdentifier;

// === CMS content types ===

/// id-data (1.2.840.113549.1.7.1)
pub const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");

/// id-signedData (1.2.840.113549.1.7.2)
pub const ID_SIGNED_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// id-ct-TSTInfo (1.2.840.113549.1.9.16.1.4)
pub const ID_CT_TST_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.4");

// === PKCS#9 / CMS attributes ===

/// contentType attribute (1.2.840.113549.1.9.3)
pub const ID_CONTENT_TYPE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");

/// messageDigest attribute (1.2.840.113549.1.9.4)
pub const ID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");

/// signingTime attribute (1.2.840.113549.1.9.5)
pub const ID_SIGNING_TIME: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");

/// id-aa-ets-commitmentType (1.2.840.113549.1.9.16.2.16)
pub const ID_AA_COMMITMENT_TYPE_INDICATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.16");

/// id-aa-signingCertificateV2 (1.2.840.113549.1.9.16.2.47)
pub const ID_AA_SIGNING_CERTIFICATE_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.47");

/// id-aa-signatureTimeStampToken (1.2.840.113549.1.9.16.2.14), unsigned
pub const ID_AA_SIGNATURE_TIME_STAMP_TOKEN: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.14");

// === Commitment types (RFC 5126) ===

/// id-cti-ets-proofOfOrigin (1.2.840.113549.1.9.16.6.1)
pub const ID_CTI_PROOF_OF_ORIGIN: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.1");

/// id-cti-ets-proofOfReceipt (1.2.840.113549.1.9.16.6.2)
pub const ID_CTI_PROOF_OF_RECEIPT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.6.2");

// === NuGet repository signature attributes ===

/// nuget-v3-service-index-url (1.3.6.1.4.1.311.84.2.1.1.1)
pub const NUGET_V3_SERVICE_INDEX_URL: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.84.2.1.1.1");

/// nuget-package-owners (1.3.6.1.4.1.311.84.2.1.1.2)
pub const NUGET_PACKAGE_OWNERS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.84.2.1.1.2");

// === Algorithms ===

/// SHA-256 (2.16.840.1.101.3.4.2.1)
pub const ID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

/// SHA-384 (2.16.840.1.101.3.4.2.2)
pub const ID_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");

/// SHA-512 (2.16.840.1.101.3.4.2.3)
pub const ID_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");

/// rsaEncryption (1.2.840.113549.1.1.1)
pub const RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// sha256WithRSAEncryption (1.2.840.113549.1.1.11)
pub const SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// sha384WithRSAEncryption (1.2.840.113549.1.1.12)
pub const SHA384_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");

/// sha512WithRSAEncryption (1.2.840.113549.1.1.13)
pub const SHA512_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

// === Certificate extensions ===

/// id-ce-subjectKeyIdentifier (2.5.29.14)
pub const ID_CE_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.5.29.14");

/// id-ce-authorityKeyIdentifier (2.5.29.35)
pub const ID_CE_AUTHORITY_KEY_IDENTIFIER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.5.29.35");

/// id-ce-extKeyUsage (2.5.29.37)
pub const ID_CE_EXT_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37");

/// anyExtendedKeyUsage (2.5.29.37.0)
pub const ANY_EXTENDED_KEY_USAGE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.37.0");

/// id-kp-codeSigning (1.3.6.1.5.5.7.3.3)
pub const ID_KP_CODE_SIGNING: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.3");

// === RFC3161 ===

/// Version 1 for RFC3161 timestamp requests
pub const TS_REQ_VERSION_1: u8 = 1;

/// Random nonce length for RFC3161 requests
pub const TS_REQ_NONCE_LENGTH: usize = 8;

/// Content type for RFC3161 requests over HTTP
pub const TIMESTAMP_QUERY_CONTENT_TYPE: &str = "application/timestamp-query";

/// Content type for RFC3161 responses over HTTP
pub const TIMESTAMP_REPLY_CONTENT_TYPE: &str = "application/timestamp-reply";

/// Upper bound on chain length walked by the certificate pool
pub const MAX_CHAIN_DEPTH: usize = 8;
