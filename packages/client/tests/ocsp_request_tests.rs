mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::engine::Engine;
use common::{make_ca, make_ee, parsed};
use der::Decode;
use revoq_client::crypto::HashAlg;
use revoq_client::ocsp::OcspRequestBuilder;
use x509_ocsp::OcspRequest;

const OID_OCSP_NONCE: &str = "1.3.6.1.5.5.7.48.1.2";

fn fixture() -> (revoq_client::ParsedCertificate, revoq_client::ParsedCertificate) {
    let ca = make_ca("Test CA");
    let ee = make_ee(&ca, "ocsp.example.com", &[0x1a], &[]);
    (parsed(&ee), parsed(&ca.cert))
}

#[test]
fn encode_then_decode_preserves_cert_id() {
    let (subject, issuer) = fixture();
    let builder = OcspRequestBuilder::new(HashAlg::Sha1, true);
    let request = builder.build(&subject, &issuer).unwrap();

    let decoded = OcspRequest::from_der(request.as_der()).unwrap();
    assert_eq!(decoded.tbs_request.request_list.len(), 1);

    let wire_id = &decoded.tbs_request.request_list[0].req_cert;
    assert_eq!(wire_id.hash_algorithm.oid.to_string(), "1.3.14.3.2.26");
    assert_eq!(
        wire_id.issuer_name_hash.as_bytes(),
        request.cert_id.issuer_name_hash.as_slice()
    );
    assert_eq!(
        wire_id.issuer_key_hash.as_bytes(),
        request.cert_id.issuer_key_hash.as_slice()
    );
    assert_eq!(wire_id.serial_number.as_bytes(), &[0x1a]);
    assert_eq!(request.cert_id.serial_hex(), "1a");
}

#[test]
fn sha1_and_sha256_hash_lengths() {
    let (subject, issuer) = fixture();
    let sha1_id = OcspRequestBuilder::new(HashAlg::Sha1, false).cert_id(&subject, &issuer);
    assert_eq!(sha1_id.issuer_name_hash.len(), 20);
    assert_eq!(sha1_id.issuer_key_hash.len(), 20);

    let sha256_id = OcspRequestBuilder::new(HashAlg::Sha256, false).cert_id(&subject, &issuer);
    assert_eq!(sha256_id.issuer_name_hash.len(), 32);
    assert_eq!(sha256_id.issuer_key_hash.len(), 32);

    assert_ne!(sha1_id, sha256_id);
}

#[test]
fn key_hash_covers_raw_key_bits_not_spki() {
    let (subject, issuer) = fixture();
    let cert_id = OcspRequestBuilder::new(HashAlg::Sha256, false).cert_id(&subject, &issuer);

    assert_eq!(
        cert_id.issuer_key_hash,
        HashAlg::Sha256.digest(&issuer.spki_key_bits)
    );
    assert_ne!(
        cert_id.issuer_key_hash,
        HashAlg::Sha256.digest(&issuer.spki_der)
    );
}

#[test]
fn nonce_is_sixteen_random_bytes_in_the_extension() {
    let (subject, issuer) = fixture();
    let builder = OcspRequestBuilder::new(HashAlg::Sha1, true);
    let request = builder.build(&subject, &issuer).unwrap();

    let nonce = request.nonce_bytes().expect("nonce attached");
    assert_eq!(nonce.len(), 16);

    let decoded = OcspRequest::from_der(request.as_der()).unwrap();
    let exts = decoded.tbs_request.request_extensions.expect("extensions");
    let ext = exts
        .iter()
        .find(|e| e.extn_id.to_string() == OID_OCSP_NONCE)
        .expect("nonce extension");
    assert_eq!(ext.extn_value.as_bytes(), nonce.as_slice());

    // Two requests never share a nonce
    let second = builder.build(&subject, &issuer).unwrap();
    assert_ne!(request.nonce, second.nonce);
}

#[test]
fn nonce_can_be_disabled() {
    let (subject, issuer) = fixture();
    let request = OcspRequestBuilder::new(HashAlg::Sha1, false)
        .build(&subject, &issuer)
        .unwrap();

    assert!(request.nonce.is_none());
    let decoded = OcspRequest::from_der(request.as_der()).unwrap();
    assert!(decoded.tbs_request.request_extensions.is_none());
}

#[test]
fn get_url_joins_with_single_slash() {
    let (subject, issuer) = fixture();
    let request = OcspRequestBuilder::new(HashAlg::Sha1, false)
        .build(&subject, &issuer)
        .unwrap();

    let expected_blob = BASE64.encode(request.as_der());
    assert_eq!(request.to_base64(), expected_blob);
    assert_eq!(
        request.get_url("http://ocsp.example.com"),
        format!("http://ocsp.example.com/{expected_blob}")
    );
    assert_eq!(
        request.get_url("http://ocsp.example.com/"),
        format!("http://ocsp.example.com/{expected_blob}")
    );
}

#[test]
fn cert_id_equality_ignores_serial_encoding() {
    let (subject, issuer) = fixture();
    let builder = OcspRequestBuilder::new(HashAlg::Sha1, false);
    let id = builder.cert_id(&subject, &issuer);

    let mut padded = id.clone();
    padded.serial = vec![0x00, 0x1a];
    assert_eq!(id, padded);

    let mut different = id.clone();
    different.serial = vec![0x1b];
    assert_ne!(id, different);
}
