//! Narrow certificate adapter
//!
//! The engine never walks X.509 structures itself; it consumes certificates
//! through this parsed view carrying exactly the attributes revocation
//! checking needs: the serial number, the canonical DER of both names, the
//! public key material, and the AIA / CRL distribution point URLs.

use x509_parser::extensions::{DistributionPointName, GeneralName, ParsedExtension};
use x509_parser::prelude::*;

use crate::errors::RevocationError;

/// OCSP access method inside Authority Information Access (RFC 5280)
const OID_AD_OCSP: &str = "1.3.6.1.5.5.7.48.1";

/// Parsed certificate attributes consumed by the revocation engine
#[derive(Debug, Clone)]
pub struct ParsedCertificate {
    /// Display form of the subject DN (e.g. `CN=Test CA`)
    pub subject: String,
    /// Display form of the issuer DN
    pub issuer: String,
    /// Serial number, big-endian, as encoded in the certificate
    pub serial: Vec<u8>,
    /// Canonical DER of the subject Name
    pub subject_der: Vec<u8>,
    /// Canonical DER of the issuer Name
    pub issuer_der: Vec<u8>,
    /// Full DER-encoded SubjectPublicKeyInfo
    pub spki_der: Vec<u8>,
    /// Raw subjectPublicKey BIT STRING contents (RFC 6960 key-hash input)
    pub spki_key_bits: Vec<u8>,
    /// Dotted OID of the public key algorithm
    pub key_alg_oid: String,
    /// OCSP responder URLs from AIA, certificate order
    pub ocsp_urls: Vec<String>,
    /// HTTP(S) CRL distribution point URLs, certificate order
    pub crl_urls: Vec<String>,
}

impl ParsedCertificate {
    /// Parse a certificate from DER bytes
    pub fn from_der(der_bytes: &[u8]) -> Result<Self, RevocationError> {
        let (_, cert) = X509Certificate::from_der(der_bytes)
            .map_err(|e| RevocationError::Parse(format!("X.509 parsing failed: {e}")))?;

        let spki = cert.public_key();

        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            serial: cert.raw_serial().to_vec(),
            subject_der: cert.subject().as_raw().to_vec(),
            issuer_der: cert.issuer().as_raw().to_vec(),
            spki_der: spki.raw.to_vec(),
            spki_key_bits: spki.subject_public_key.data.to_vec(),
            key_alg_oid: spki.algorithm.algorithm.to_id_string(),
            ocsp_urls: extract_ocsp_urls(&cert),
            crl_urls: extract_crl_urls(&cert),
        })
    }

    /// Parse a certificate from a PEM envelope with the `CERTIFICATE` label
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, RevocationError> {
        let block = ::pem::parse(pem_data)
            .map_err(|e| RevocationError::Parse(format!("invalid PEM envelope: {e}")))?;
        if block.tag() != "CERTIFICATE" {
            return Err(RevocationError::Parse(format!(
                "invalid PEM envelope: unexpected label {:?}",
                block.tag()
            )));
        }
        Self::from_der(block.contents())
    }

    /// Canonical lowercase hex form of the serial number
    pub fn serial_hex(&self) -> String {
        serial_hex(&self.serial)
    }
}

/// Canonical big-endian hex encoding of a serial number: lowercase, leading
/// zero bytes stripped, `0` for the all-zero serial
pub fn serial_hex(serial: &[u8]) -> String {
    let stripped: &[u8] = match serial.iter().position(|&b| b != 0) {
        Some(pos) => &serial[pos..],
        None => return "0".to_string(),
    };
    hex::encode(stripped)
}

/// OCSP responder URLs from the Authority Information Access extension,
/// id-ad-ocsp access descriptions only
fn extract_ocsp_urls(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut urls = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
            for desc in &aia.accessdescs {
                if desc.access_method.to_id_string() != OID_AD_OCSP {
                    continue;
                }
                if let GeneralName::URI(uri) = &desc.access_location {
                    let url = uri.to_string();
                    if is_http_url(&url) && !urls.contains(&url) {
                        urls.push(url);
                    }
                }
            }
        }
    }
    urls
}

/// HTTP(S) URI general names from the cRLDistributionPoints extension;
/// directoryName and other forms are skipped
fn extract_crl_urls(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut urls = Vec::new();
    for ext in cert.extensions() {
        if let ParsedExtension::CRLDistributionPoints(points) = ext.parsed_extension() {
            for point in points.points.iter() {
                let Some(DistributionPointName::FullName(names)) = &point.distribution_point
                else {
                    continue;
                };
                for name in names {
                    if let GeneralName::URI(uri) = name {
                        let url = uri.to_string();
                        if is_http_url(&url) && !urls.contains(&url) {
                            urls.push(url);
                        }
                    }
                }
            }
        }
    }
    if urls.is_empty() {
        tracing::debug!("no HTTP CRL distribution points in certificate");
    }
    urls
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
