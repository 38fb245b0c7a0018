//! OCSP request construction, response decoding, and the responder client

pub mod client;
pub mod request;
pub mod response;

pub use client::{OcspCacheStats, OcspClient};
pub use request::{CertIdDigest, OcspRequestBuilder, OcspRequestData};
pub use response::{parse_ocsp_response, OcspCertStatus, OcspResponderId, ParsedOcspResponse};

/// OCSP nonce extension (RFC 6960 §4.4.1)
pub(crate) const OID_OCSP_NONCE: &str = "1.3.6.1.5.5.7.48.1.2";

/// id-pkix-ocsp-basic response type
pub(crate) const OID_OCSP_BASIC: &str = "1.3.6.1.5.5.7.48.1.1";
