//! Shared PKI fixtures for integration tests
//!
//! Certificates and CRLs are minted with rcgen (ECDSA P-256) so signature
//! verification paths run against real signatures.

#![allow(dead_code)]

pub mod ocsp;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rcgen::{
    BasicConstraints, CertificateParams, CertificateRevocationListParams, CrlDistributionPoint,
    DnType, IsCa, KeyIdMethod, KeyPair, KeyUsagePurpose, RevocationReason, RevokedCertParams,
    SerialNumber, PKCS_ECDSA_P256_SHA256,
};
use revoq_client::ParsedCertificate;

pub struct TestCa {
    pub key: KeyPair,
    pub cert: rcgen::Certificate,
}

pub fn make_ca(common_name: &str) -> TestCa {
    let mut params = CertificateParams::new(Vec::new()).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
    let cert = params.self_signed(&key).unwrap();
    TestCa { key, cert }
}

/// End-entity certificate issued by `ca` with the given serial and CRL
/// distribution point URLs
pub fn make_ee(ca: &TestCa, common_name: &str, serial: &[u8], crl_urls: &[&str]) -> rcgen::Certificate {
    let mut params = CertificateParams::new(Vec::new()).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.is_ca = IsCa::NoCa;
    params.serial_number = Some(SerialNumber::from(serial.to_vec()));
    if !crl_urls.is_empty() {
        params.crl_distribution_points = vec![CrlDistributionPoint {
            uris: crl_urls.iter().map(|u| (*u).to_string()).collect(),
        }];
    }
    let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
    params.signed_by(&key, &ca.cert, &ca.key).unwrap()
}

/// Delegated OCSP responder certificate issued by `ca`, optionally carrying
/// the id-kp-OCSPSigning extended key usage
pub fn make_ocsp_responder(
    ca: &TestCa,
    common_name: &str,
    with_signing_eku: bool,
) -> (KeyPair, rcgen::Certificate) {
    let mut params = CertificateParams::new(Vec::new()).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params.is_ca = IsCa::NoCa;
    if with_signing_eku {
        params.extended_key_usages = vec![rcgen::ExtendedKeyUsagePurpose::OcspSigning];
    }
    let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).unwrap();
    let cert = params.signed_by(&key, &ca.cert, &ca.key).unwrap();
    (key, cert)
}

pub struct RevokedSpec {
    pub serial: Vec<u8>,
    pub reason: Option<RevocationReason>,
}

/// CRL signed by `ca`, with validity window offsets relative to now
/// (negative = past)
pub fn make_crl(
    ca: &TestCa,
    crl_number: u64,
    revoked: &[RevokedSpec],
    this_update_offset_secs: i64,
    next_update_offset_secs: i64,
) -> Vec<u8> {
    let now = time::OffsetDateTime::now_utc();
    let this_update = now + time::Duration::seconds(this_update_offset_secs);
    let next_update = now + time::Duration::seconds(next_update_offset_secs);

    let revoked_certs = revoked
        .iter()
        .map(|spec| RevokedCertParams {
            serial_number: SerialNumber::from(spec.serial.clone()),
            revocation_time: this_update,
            reason_code: spec.reason,
            invalidity_date: None,
        })
        .collect();

    let params = CertificateRevocationListParams {
        this_update,
        next_update,
        crl_number: SerialNumber::from(crl_number),
        issuing_distribution_point: None,
        revoked_certs,
        key_identifier_method: KeyIdMethod::Sha256,
    };
    let crl = params.signed_by(&ca.cert, &ca.key).unwrap();
    crl.der().as_ref().to_vec()
}

/// PEM form of a CRL signed by `ca`
pub fn make_crl_pem(ca: &TestCa, crl_number: u64, revoked: &[RevokedSpec]) -> String {
    let der = make_crl(ca, crl_number, revoked, -3600, 3600);
    pem::encode(&pem::Pem::new("X509 CRL", der))
}

pub fn parsed(cert: &rcgen::Certificate) -> ParsedCertificate {
    ParsedCertificate::from_der(cert.der().as_ref()).unwrap()
}

pub fn at_offset(offset_secs: i64) -> SystemTime {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    UNIX_EPOCH + Duration::from_secs((now + offset_secs) as u64)
}
