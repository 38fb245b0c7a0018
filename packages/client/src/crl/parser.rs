//! CertificateList decoding
//!
//! Accepts either raw DER or a PEM envelope labelled `X509 CRL`. The DER
//! path records the exact byte span of `tbsCertList` inside the original
//! buffer so signature verification never operates on a re-encoding.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use x509_parser::prelude::*;

use super::{Crl, CrlEntry, ReasonCode};
use crate::cert::serial_hex;
use crate::der_span::tbs_span;
use crate::errors::RevocationError;

/// Parse a CRL from PEM or DER, sniffing the envelope from the first bytes
pub fn parse_crl(bytes: &[u8]) -> Result<Crl, RevocationError> {
    if bytes.starts_with(b"-----BEGIN") {
        parse_crl_pem(bytes)
    } else {
        parse_crl_der(bytes)
    }
}

/// Parse a PEM envelope bearing the `X509 CRL` label
pub fn parse_crl_pem(pem_data: &[u8]) -> Result<Crl, RevocationError> {
    let block = ::pem::parse(pem_data)
        .map_err(|e| RevocationError::Parse(format!("invalid PEM envelope: {e}")))?;
    if block.tag() != "X509 CRL" {
        return Err(RevocationError::Parse(format!(
            "invalid PEM envelope: unexpected label {:?}",
            block.tag()
        )));
    }
    parse_crl_der(block.contents())
}

/// Parse a DER-encoded CertificateList (RFC 5280 §5.1)
pub fn parse_crl_der(der_bytes: &[u8]) -> Result<Crl, RevocationError> {
    let (_, crl) = parse_x509_crl(der_bytes)
        .map_err(|e| RevocationError::Parse(format!("CRL parsing failed: {e}")))?;

    let tbs_range = match tbs_span(der_bytes) {
        Ok(range) => Some(range),
        Err(e) => {
            tracing::warn!("could not locate tbsCertList span: {e}");
            None
        }
    };

    let crl_number = match crl.crl_number() {
        Some(number) => biguint_to_u128(&number.to_bytes_be()),
        None => {
            tracing::warn!("CRL carries no CRL Number extension, defaulting to 0");
            0
        }
    };

    let mut entries = HashMap::new();
    for revoked in crl.iter_revoked_certificates() {
        let serial = serial_hex(revoked.raw_serial());
        let reason = revoked
            .reason_code()
            .map(|(_critical, code)| ReasonCode::from_u8(code.0));
        let invalidity_date = revoked
            .invalidity_date()
            .map(|(_critical, time)| asn1_to_system_time(&time));
        let entry = CrlEntry {
            serial_hex: serial.clone(),
            revocation_date: asn1_to_system_time(&revoked.revocation_date),
            reason,
            invalidity_date,
        };
        if entries.insert(serial.clone(), entry).is_some() {
            tracing::warn!("duplicate serial {serial} in CRL, keeping the later entry");
        }
    }

    Ok(Crl {
        issuer: crl.issuer().to_string(),
        issuer_der: crl.issuer().as_raw().to_vec(),
        this_update: asn1_to_system_time(&crl.last_update()),
        next_update: crl.next_update().map(|t| asn1_to_system_time(&t)),
        crl_number,
        signature_alg: Some(crl.signature_algorithm.algorithm.to_id_string()),
        signature: Some(crl.signature_value.data.to_vec()),
        raw: der_bytes.to_vec(),
        tbs_range,
        entries,
    })
}

/// Big-endian bytes of the CRL Number to u128, saturating on overflow
fn biguint_to_u128(bytes: &[u8]) -> u128 {
    let stripped: &[u8] = match bytes.iter().position(|&b| b != 0) {
        Some(pos) => &bytes[pos..],
        None => return 0,
    };
    if stripped.len() > 16 {
        tracing::warn!("CRL Number wider than 128 bits, saturating");
        return u128::MAX;
    }
    stripped.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128)
}

pub(crate) fn asn1_to_system_time(time: &ASN1Time) -> SystemTime {
    let ts = time.timestamp();
    if ts >= 0 {
        UNIX_EPOCH + Duration::from_secs(ts as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(ts.unsigned_abs())
    }
}
