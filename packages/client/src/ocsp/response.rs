//! OCSP response decoding (RFC 6960 §4.2)
//!
//! Only `id-pkix-ocsp-basic` bodies are accepted. The caller supplies the
//! CertID it asked about; when the responder bundles several single
//! responses the matching one is selected, and a response without a match
//! is a protocol failure.

use std::time::{SystemTime, UNIX_EPOCH};

use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::pkix::CrlReason;
use x509_ocsp::{BasicOcspResponse, CertStatus, OcspResponse, OcspResponseStatus, ResponderId};

use super::request::CertIdDigest;
use super::{OID_OCSP_BASIC, OID_OCSP_NONCE};
use crate::crl::ReasonCode;
use crate::crypto::HashAlg;
use crate::der_span::tbs_span;
use crate::errors::RevocationError;

/// Certificate status reported by the responder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcspCertStatus {
    Good,
    Revoked {
        reason: Option<ReasonCode>,
        revoked_at: SystemTime,
    },
    Unknown,
}

/// Responder identity from the response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcspResponderId {
    ByName(String),
    ByKey(Vec<u8>),
}

/// Decoded OCSP response restricted to the single response matching the
/// request's CertID
#[derive(Debug, Clone)]
pub struct ParsedOcspResponse {
    /// OCSPResponseStatus; always 0 (successful) for a parsed response
    pub response_status: u8,
    pub cert_status: OcspCertStatus,
    pub this_update: SystemTime,
    pub next_update: Option<SystemTime>,
    pub produced_at: SystemTime,
    pub nonce: Option<Vec<u8>>,
    pub responder_id: OcspResponderId,
    /// Dotted OID of the response signature algorithm
    pub signature_alg: String,
    pub signature: Vec<u8>,
    /// Exact bytes of tbsResponseData as they appeared on the wire
    pub tbs_bytes: Vec<u8>,
    /// CertID of the matched single response
    pub cert_id: CertIdDigest,
    /// First certificate embedded in the response, for delegated responders
    pub responder_cert_der: Option<Vec<u8>>,
}

impl ParsedOcspResponse {
    /// True once `nextUpdate` has passed; responses without `nextUpdate`
    /// are never considered cacheable
    pub fn is_expired(&self, now: SystemTime) -> bool {
        match self.next_update {
            Some(next) => now > next,
            None => true,
        }
    }
}

/// Decode an OCSP response and select the single response for `expected`
pub fn parse_ocsp_response(
    bytes: &[u8],
    expected: &CertIdDigest,
) -> Result<ParsedOcspResponse, RevocationError> {
    let response = OcspResponse::from_der(bytes)
        .map_err(|e| RevocationError::Parse(format!("failed to decode OCSP response: {e}")))?;

    if response.response_status != OcspResponseStatus::Successful {
        return Err(RevocationError::Protocol(format!(
            "OCSP response status {}",
            status_name(&response.response_status)
        )));
    }

    let response_bytes = response.response_bytes.as_ref().ok_or_else(|| {
        RevocationError::Protocol("successful OCSP response without body".to_string())
    })?;
    if response_bytes.response_type != ObjectIdentifier::new_unwrap(OID_OCSP_BASIC) {
        return Err(RevocationError::Protocol(format!(
            "unsupported OCSP response type {}",
            response_bytes.response_type
        )));
    }

    let basic_der = response_bytes.response.as_bytes();
    let basic = BasicOcspResponse::from_der(basic_der)
        .map_err(|e| RevocationError::Parse(format!("failed to decode basic response: {e}")))?;

    let tbs_bytes = basic_der[tbs_span(basic_der)?].to_vec();

    let produced_at = UNIX_EPOCH + basic.tbs_response_data.produced_at.0.to_unix_duration();

    let single = basic
        .tbs_response_data
        .responses
        .iter()
        .find(|resp| cert_id_digest(&resp.cert_id).is_some_and(|id| &id == expected))
        .ok_or_else(|| {
            RevocationError::Protocol(
                "no single response matching the requested CertID".to_string(),
            )
        })?;

    let this_update = UNIX_EPOCH + single.this_update.0.to_unix_duration();
    let next_update = single
        .next_update
        .as_ref()
        .map(|t| UNIX_EPOCH + t.0.to_unix_duration());

    if this_update > produced_at {
        return Err(RevocationError::Protocol(
            "OCSP thisUpdate is after producedAt".to_string(),
        ));
    }
    if let Some(next) = next_update {
        if next <= this_update {
            return Err(RevocationError::Protocol(
                "OCSP nextUpdate is not after thisUpdate".to_string(),
            ));
        }
    }

    let cert_status = match &single.cert_status {
        CertStatus::Good(_) => OcspCertStatus::Good,
        CertStatus::Revoked(info) => OcspCertStatus::Revoked {
            reason: info.revocation_reason.map(map_crl_reason),
            revoked_at: UNIX_EPOCH + info.revocation_time.0.to_unix_duration(),
        },
        CertStatus::Unknown(_) => OcspCertStatus::Unknown,
    };

    let nonce = basic
        .tbs_response_data
        .response_extensions
        .as_ref()
        .and_then(|exts| {
            exts.iter()
                .find(|ext| ext.extn_id == ObjectIdentifier::new_unwrap(OID_OCSP_NONCE))
        })
        .map(|ext| ext.extn_value.as_bytes().to_vec());

    let responder_id = match &basic.tbs_response_data.responder_id {
        ResponderId::ByName(name) => OcspResponderId::ByName(name.to_string()),
        ResponderId::ByKey(key) => OcspResponderId::ByKey(key.as_bytes().to_vec()),
    };

    let signature = basic
        .signature
        .as_bytes()
        .ok_or_else(|| RevocationError::Protocol("empty OCSP signature".to_string()))?
        .to_vec();

    let responder_cert_der = match basic.certs.as_ref().and_then(|certs| certs.first()) {
        Some(cert) => match cert.to_der() {
            Ok(der_bytes) => Some(der_bytes),
            Err(e) => {
                tracing::warn!("could not re-encode embedded responder certificate: {e}");
                None
            }
        },
        None => None,
    };

    Ok(ParsedOcspResponse {
        response_status: 0,
        cert_status,
        this_update,
        next_update,
        produced_at,
        nonce,
        responder_id,
        signature_alg: basic.signature_algorithm.oid.to_string(),
        signature,
        tbs_bytes,
        cert_id: expected.clone(),
        responder_cert_der,
    })
}

/// Convert a wire CertID into the comparable digest form. Returns None for
/// hash algorithms this client never emits.
fn cert_id_digest(cert_id: &x509_ocsp::CertId) -> Option<CertIdDigest> {
    let hash_alg = HashAlg::from_oid(&cert_id.hash_algorithm.oid.to_string())?;
    Some(CertIdDigest {
        hash_alg,
        issuer_name_hash: cert_id.issuer_name_hash.as_bytes().to_vec(),
        issuer_key_hash: cert_id.issuer_key_hash.as_bytes().to_vec(),
        serial: cert_id.serial_number.as_bytes().to_vec(),
    })
}

fn map_crl_reason(reason: CrlReason) -> ReasonCode {
    match reason {
        CrlReason::Unspecified => ReasonCode::Unspecified,
        CrlReason::KeyCompromise => ReasonCode::KeyCompromise,
        CrlReason::CaCompromise => ReasonCode::CaCompromise,
        CrlReason::AffiliationChanged => ReasonCode::AffiliationChanged,
        CrlReason::Superseded => ReasonCode::Superseded,
        CrlReason::CessationOfOperation => ReasonCode::CessationOfOperation,
        CrlReason::CertificateHold => ReasonCode::CertificateHold,
        CrlReason::RemoveFromCRL => ReasonCode::RemoveFromCrl,
        CrlReason::PrivilegeWithdrawn => ReasonCode::PrivilegeWithdrawn,
        CrlReason::AaCompromise => ReasonCode::AaCompromise,
    }
}

fn status_name(status: &OcspResponseStatus) -> &'static str {
    match status {
        OcspResponseStatus::Successful => "successful (0)",
        OcspResponseStatus::MalformedRequest => "malformedRequest (1)",
        OcspResponseStatus::InternalError => "internalError (2)",
        OcspResponseStatus::TryLater => "tryLater (3)",
        OcspResponseStatus::SigRequired => "sigRequired (5)",
        OcspResponseStatus::Unauthorized => "unauthorized (6)",
    }
}
