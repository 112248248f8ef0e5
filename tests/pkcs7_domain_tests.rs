//! Tests for CMS assembly and the `Pkcs7SignedData` wrapper.

mod common;

use cms::content_info::CmsVersion;
use cms::signed_data::SignerIdentifier;
use common::{signer_with_ski, signer_without_ski, three_level_chain, MockBackend, SIGNER_SKI};
use nupkg_signer::domain::constants;
use nupkg_signer::services::{
    Pkcs7BuilderService, SignedAttributesBuilder, SignerIdentifierSelector,
};
use nupkg_signer::{
    CertChain, HashAlgorithm, Pkcs7SignedData, SignatureContent, SignatureType, SigningError,
    SigningRequest, X509Certificate,
};

const MANIFEST: &[u8] = b"Version:1\n\n2.16.840.1.101.3.4.2.1-Hash:9Xq2kA==\n";

fn assemble(
    signer: X509Certificate,
    chain: CertChain,
    algorithm: HashAlgorithm,
    backend: &MockBackend,
) -> Pkcs7SignedData {
    let request = SigningRequest::new(signer.clone(), SignatureType::Author)
        .with_signature_hash_algorithm(algorithm)
        .with_signing_time(common::signing_time());
    let content = SignatureContent::new(MANIFEST.to_vec()).unwrap();
    let attributes = SignedAttributesBuilder::new()
        .build(&request, algorithm, &content)
        .unwrap();
    let identifier = SignerIdentifierSelector::select(&signer).unwrap();
    Pkcs7BuilderService::new(chain, algorithm)
        .assemble(&attributes, identifier, backend, &content)
        .unwrap()
}

#[test]
fn every_supported_hash_reparses() {
    common::init_logging();
    for (algorithm, signature_oid) in [
        (HashAlgorithm::Sha256, constants::SHA256_WITH_RSA),
        (HashAlgorithm::Sha384, constants::SHA384_WITH_RSA),
        (HashAlgorithm::Sha512, constants::SHA512_WITH_RSA),
    ] {
        let backend = MockBackend::default();
        let signer = signer_with_ski();
        let pkcs7 = assemble(signer.clone(), CertChain::new(signer), algorithm, &backend);
        assert_eq!(backend.calls(), 1, "{algorithm}");

        let reparsed = Pkcs7SignedData::from_der(pkcs7.as_der().to_vec()).unwrap();
        let signed_data = reparsed.signed_data().unwrap();
        let digests: Vec<_> = signed_data.digest_algorithms.iter().collect();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].oid, algorithm.oid());

        let signer_info = reparsed.signer_info().unwrap();
        assert_eq!(signer_info.digest_alg.oid, algorithm.oid());
        assert_eq!(signer_info.signature_algorithm.oid, signature_oid);
        assert_eq!(signer_info.signature.as_bytes().len(), 256);
    }
}

#[test]
fn content_is_detached() {
    let backend = MockBackend::default();
    let signer = signer_with_ski();
    let pkcs7 = assemble(
        signer.clone(),
        CertChain::new(signer),
        HashAlgorithm::Sha256,
        &backend,
    );
    let encap = pkcs7.signed_data().unwrap().encap_content_info;
    assert_eq!(encap.econtent_type, constants::ID_DATA);
    assert!(encap.econtent.is_none());
    assert!(!pkcs7
        .as_der()
        .windows(MANIFEST.len())
        .any(|w| w == MANIFEST));
}

#[test]
fn ski_signer_uses_version_three() {
    let backend = MockBackend::default();
    let signer = signer_with_ski();
    let pkcs7 = assemble(
        signer.clone(),
        CertChain::new(signer),
        HashAlgorithm::Sha256,
        &backend,
    );
    let signed_data = pkcs7.signed_data().unwrap();
    assert_eq!(signed_data.version, CmsVersion::V3);
    let signer_info = pkcs7.signer_info().unwrap();
    assert_eq!(signer_info.version, CmsVersion::V3);
    match signer_info.sid {
        SignerIdentifier::SubjectKeyIdentifier(ski) => {
            assert_eq!(ski.0.as_bytes(), SIGNER_SKI);
        }
        SignerIdentifier::IssuerAndSerialNumber(_) => panic!("expected subject key identifier"),
    }
}

#[test]
fn issuer_serial_signer_uses_version_one() {
    let backend = MockBackend::default();
    let signer = signer_without_ski();
    let pkcs7 = assemble(
        signer.clone(),
        CertChain::new(signer.clone()),
        HashAlgorithm::Sha384,
        &backend,
    );
    assert_eq!(pkcs7.signed_data().unwrap().version, CmsVersion::V1);
    let signer_info = pkcs7.signer_info().unwrap();
    assert_eq!(signer_info.version, CmsVersion::V1);
    match signer_info.sid {
        SignerIdentifier::IssuerAndSerialNumber(ias) => {
            assert_eq!(&ias.issuer, signer.issuer());
            assert_eq!(&ias.serial_number, signer.serial_number());
        }
        SignerIdentifier::SubjectKeyIdentifier(_) => panic!("expected issuer and serial"),
    }
}

#[test]
fn certificate_set_carries_whole_chain() {
    let (root, intermediate, leaf) = three_level_chain();
    let chain = CertChain::from_certificates(vec![
        leaf.clone(),
        intermediate.clone(),
        root.clone(),
    ])
    .unwrap();
    let backend = MockBackend::default();
    let pkcs7 = assemble(leaf.clone(), chain, HashAlgorithm::Sha256, &backend);

    let mut embedded: Vec<Vec<u8>> = pkcs7
        .certificates()
        .unwrap()
        .iter()
        .map(|c| c.as_der().to_vec())
        .collect();
    let mut expected: Vec<Vec<u8>> = [leaf, intermediate, root]
        .iter()
        .map(|c| c.as_der().to_vec())
        .collect();
    embedded.sort();
    expected.sort();
    assert_eq!(embedded, expected);
}

#[test]
fn signature_value_is_what_backend_returned() {
    let backend = MockBackend::default();
    let signer = signer_with_ski();
    let pkcs7 = assemble(
        signer.clone(),
        CertChain::new(signer),
        HashAlgorithm::Sha256,
        &backend,
    );
    let signer_info = pkcs7.signer_info().unwrap();
    let attrs_der = der::Encode::to_der(signer_info.signed_attrs.as_ref().unwrap()).unwrap();
    let expected_hash = HashAlgorithm::Sha256.digest(&attrs_der);
    let value = pkcs7.signature_value().unwrap();
    assert_eq!(&value[..32], expected_hash.as_slice());
}

#[test]
fn wrapper_rejects_non_signed_data() {
    let err = Pkcs7SignedData::from_der(common::fixed_token()).unwrap_err();
    assert!(matches!(
        err,
        SigningError::Pkcs7Error(_) | SigningError::Asn1Error(_)
    ));
    assert!(Pkcs7SignedData::from_der(vec![0x30, 0x00]).is_err());
}
