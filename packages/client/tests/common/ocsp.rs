//! Wire-level OCSP response construction for tests
//!
//! Responses are assembled from x509-ocsp structures and optionally signed
//! for real with the issuing CA's P-256 key, so the client's signature
//! verification path is exercised end to end.

#![allow(dead_code)]

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use der::asn1::{BitString, GeneralizedTime, Null, ObjectIdentifier, OctetString};
use der::Encode;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use revoq_client::ocsp::CertIdDigest;
use x509_cert::ext::Extension;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_ocsp::{
    BasicOcspResponse, CertStatus, OcspGeneralizedTime, OcspResponse, OcspResponseStatus,
    ResponderId, ResponseBytes, ResponseData, SingleResponse, Version,
};

use super::TestCa;

pub const OID_OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";
pub const OID_OCSP_NONCE: &str = "1.3.6.1.5.5.7.48.1.2";
pub const OID_ECDSA_SHA256: &str = "1.2.840.10045.4.3.2";

/// Everything a test needs to vary about a responder's answer
pub struct ResponseSpec {
    pub cert_status: CertStatus,
    pub this_update_offset: i64,
    pub next_update_offset: Option<i64>,
    pub produced_at_offset: i64,
    pub nonce: Option<Vec<u8>>,
}

impl ResponseSpec {
    pub fn good() -> Self {
        Self {
            cert_status: CertStatus::Good(Null),
            this_update_offset: -60,
            next_update_offset: Some(3600),
            produced_at_offset: -30,
            nonce: None,
        }
    }
}

pub fn gtime(offset_secs: i64) -> OcspGeneralizedTime {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let at = Duration::from_secs((now + offset_secs) as u64);
    OcspGeneralizedTime(GeneralizedTime::from_unix_duration(at).unwrap())
}

/// Wire CertId mirroring a request's digest
pub fn wire_cert_id(digest: &CertIdDigest) -> x509_ocsp::CertId {
    x509_ocsp::CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: ObjectIdentifier::new(digest.hash_alg.oid()).unwrap(),
            parameters: None,
        },
        issuer_name_hash: OctetString::new(digest.issuer_name_hash.clone()).unwrap(),
        issuer_key_hash: OctetString::new(digest.issuer_key_hash.clone()).unwrap(),
        serial_number: x509_cert::serial_number::SerialNumber::new(&digest.serial).unwrap(),
    }
}

/// Assemble a successful OCSP response for `cert_id`. When `signer` is
/// given the response carries a real ECDSA signature over tbsResponseData;
/// otherwise the signature bytes are garbage.
pub fn build_response_der(
    cert_id: &CertIdDigest,
    spec: &ResponseSpec,
    signer: Option<&TestCa>,
) -> Vec<u8> {
    build_response_wire(wire_cert_id(cert_id), spec, signer)
}

/// Same as `build_response_der` but echoing a wire CertId verbatim, as a
/// real responder would
pub fn build_response_wire(
    cert_id: x509_ocsp::CertId,
    spec: &ResponseSpec,
    signer: Option<&TestCa>,
) -> Vec<u8> {
    build_response_full(cert_id, spec, signer.map(|ca| &ca.key), &[])
}

/// Fully parameterized variant: any signing key and any embedded
/// certificates (for delegated responder scenarios)
pub fn build_response_full(
    cert_id: x509_ocsp::CertId,
    spec: &ResponseSpec,
    signing_key: Option<&rcgen::KeyPair>,
    embedded_cert_der: &[Vec<u8>],
) -> Vec<u8> {
    let single = SingleResponse {
        cert_id,
        cert_status: spec.cert_status.clone(),
        this_update: gtime(spec.this_update_offset),
        next_update: spec.next_update_offset.map(gtime),
        single_extensions: None,
    };

    let response_extensions = spec.nonce.as_ref().map(|nonce| {
        vec![Extension {
            extn_id: ObjectIdentifier::new_unwrap(OID_OCSP_NONCE),
            critical: false,
            extn_value: OctetString::new(nonce.clone()).unwrap(),
        }]
    });

    let tbs_response_data = ResponseData {
        version: Version::V1,
        responder_id: ResponderId::ByKey(OctetString::new(vec![0u8; 20]).unwrap()),
        produced_at: gtime(spec.produced_at_offset),
        responses: vec![single],
        response_extensions,
    };

    let signature = match signing_key {
        Some(key) => sign_with(key, &tbs_response_data.to_der().unwrap()),
        None => vec![0u8; 8],
    };

    let certs = if embedded_cert_der.is_empty() {
        None
    } else {
        Some(
            embedded_cert_der
                .iter()
                .map(|der_bytes| {
                    use der::Decode;
                    x509_cert::Certificate::from_der(der_bytes).unwrap()
                })
                .collect(),
        )
    };

    let basic = BasicOcspResponse {
        tbs_response_data,
        signature_algorithm: AlgorithmIdentifierOwned {
            oid: ObjectIdentifier::new_unwrap(OID_ECDSA_SHA256),
            parameters: None,
        },
        signature: BitString::from_bytes(&signature).unwrap(),
        certs,
    };

    let response = OcspResponse {
        response_status: OcspResponseStatus::Successful,
        response_bytes: Some(ResponseBytes {
            response_type: ObjectIdentifier::new_unwrap(OID_OCSP_BASIC),
            response: OctetString::new(basic.to_der().unwrap()).unwrap(),
        }),
    };
    response.to_der().unwrap()
}

/// A non-successful response (no body)
pub fn error_response_der(status: OcspResponseStatus) -> Vec<u8> {
    OcspResponse {
        response_status: status,
        response_bytes: None,
    }
    .to_der()
    .unwrap()
}

/// ECDSA P-256 signature with an rcgen-generated key
pub fn sign_with(key: &rcgen::KeyPair, message: &[u8]) -> Vec<u8> {
    let rng = SystemRandom::new();
    let pkcs8 = key.serialize_der();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &pkcs8, &rng).unwrap();
    key_pair.sign(&rng, message).unwrap().as_ref().to_vec()
}
