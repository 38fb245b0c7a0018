//! OCSP request construction
//!
//! Builds the CertID identifying a certificate to a responder (issuer name
//! hash, issuer key hash, serial), attaches an optional random nonce, and
//! encodes the request as DER, base64, or an HTTP GET URL.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::engine::Engine;
use der::asn1::{ObjectIdentifier, OctetString};
use der::Encode;
use rand::Rng;
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_ocsp::{CertId, OcspRequest, Request, TbsRequest, Version};

use super::OID_OCSP_NONCE;
use crate::cert::{serial_hex, ParsedCertificate};
use crate::crypto::HashAlg;
use crate::errors::RevocationError;

/// Certificate identity presented to an OCSP responder. Equality covers all
/// four fields; the serial compares by numeric value, not encoding.
#[derive(Debug, Clone, Eq)]
pub struct CertIdDigest {
    /// Algorithm that produced both hashes
    pub hash_alg: HashAlg,
    /// Hash of the issuer's subject Name DER
    pub issuer_name_hash: Vec<u8>,
    /// Hash of the issuer's raw subjectPublicKey bits
    pub issuer_key_hash: Vec<u8>,
    /// Subject serial number, big-endian, as encoded in the certificate
    pub serial: Vec<u8>,
}

impl CertIdDigest {
    pub fn serial_hex(&self) -> String {
        serial_hex(&self.serial)
    }
}

impl PartialEq for CertIdDigest {
    fn eq(&self, other: &Self) -> bool {
        self.hash_alg == other.hash_alg
            && self.issuer_name_hash == other.issuer_name_hash
            && self.issuer_key_hash == other.issuer_key_hash
            && self.serial_hex() == other.serial_hex()
    }
}

impl Hash for CertIdDigest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_alg.hash(state);
        self.issuer_name_hash.hash(state);
        self.issuer_key_hash.hash(state);
        self.serial_hex().hash(state);
    }
}

/// A constructed OCSP request: disposable, one per check
#[derive(Debug, Clone)]
pub struct OcspRequestData {
    pub cert_id: CertIdDigest,
    /// Nonce bytes hex-encoded for transport-agnostic storage
    pub nonce: Option<String>,
    der: Vec<u8>,
}

impl OcspRequestData {
    /// DER encoding per RFC 6960 §4.1
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.der)
    }

    /// HTTP GET form: base URL, a single `/`, then the base64 request
    pub fn get_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.to_base64())
    }

    /// Nonce as raw bytes, if one was attached
    pub fn nonce_bytes(&self) -> Option<Vec<u8>> {
        self.nonce.as_ref().and_then(|n| hex::decode(n).ok())
    }
}

/// Builds per-check OCSP requests
pub struct OcspRequestBuilder {
    hash_alg: HashAlg,
    use_nonce: bool,
    /// Pre-generated random bytes drained for nonce generation
    nonce_pool: Arc<RwLock<Vec<u8>>>,
}

impl OcspRequestBuilder {
    pub fn new(hash_alg: HashAlg, use_nonce: bool) -> Self {
        let mut nonce_pool = vec![0u8; 1024];
        rand::rng().fill(&mut nonce_pool[..]);
        Self {
            hash_alg,
            use_nonce,
            nonce_pool: Arc::new(RwLock::new(nonce_pool)),
        }
    }

    /// Compute the CertID for `subject` under `issuer`.
    ///
    /// The key hash is over the raw subjectPublicKey BIT STRING contents,
    /// not the whole SPKI structure (RFC 6960 §4.1.1).
    pub fn cert_id(&self, subject: &ParsedCertificate, issuer: &ParsedCertificate) -> CertIdDigest {
        CertIdDigest {
            hash_alg: self.hash_alg,
            issuer_name_hash: self.hash_alg.digest(&issuer.subject_der),
            issuer_key_hash: self.hash_alg.digest(&issuer.spki_key_bits),
            serial: subject.serial.clone(),
        }
    }

    /// Build and DER-encode a request for `subject`
    pub fn build(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
    ) -> Result<OcspRequestData, RevocationError> {
        let cert_id = self.cert_id(subject, issuer);
        let nonce = self.use_nonce.then(|| self.generate_nonce());

        let req_cert = CertId {
            hash_algorithm: AlgorithmIdentifierOwned {
                oid: oid(self.hash_alg.oid())?,
                parameters: None,
            },
            issuer_name_hash: octet_string(&cert_id.issuer_name_hash)?,
            issuer_key_hash: octet_string(&cert_id.issuer_key_hash)?,
            serial_number: SerialNumber::new(&cert_id.serial)
                .map_err(|e| RevocationError::Parse(format!("invalid serial number: {e}")))?,
        };

        let request_extensions = match &nonce {
            Some(nonce_bytes) => Some(vec![Extension {
                extn_id: oid(OID_OCSP_NONCE)?,
                critical: false,
                extn_value: octet_string(nonce_bytes)?,
            }]),
            None => None,
        };

        let request = OcspRequest {
            tbs_request: TbsRequest {
                version: Version::V1,
                requestor_name: None,
                request_list: vec![Request {
                    req_cert,
                    single_request_extensions: None,
                }],
                request_extensions,
            },
            optional_signature: None,
        };

        let der = request
            .to_der()
            .map_err(|e| RevocationError::Parse(format!("failed to encode OCSP request: {e}")))?;

        Ok(OcspRequestData {
            cert_id,
            nonce: nonce.map(|n| hex::encode(n)),
            der,
        })
    }

    /// 16 random bytes from the pre-generated pool, refilled on exhaustion
    fn generate_nonce(&self) -> Vec<u8> {
        let mut nonce = vec![0u8; 16];
        let mut pool = match self.nonce_pool.write() {
            Ok(pool) => pool,
            Err(poisoned) => {
                tracing::warn!("nonce pool lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if pool.len() < 16 {
            pool.resize(1024, 0);
            rand::rng().fill(&mut pool[..]);
        }
        nonce.copy_from_slice(&pool[..16]);
        pool.drain(..16);
        nonce
    }
}

fn oid(dotted: &str) -> Result<ObjectIdentifier, RevocationError> {
    ObjectIdentifier::new(dotted)
        .map_err(|e| RevocationError::Parse(format!("invalid OID {dotted}: {e}")))
}

fn octet_string(bytes: &[u8]) -> Result<OctetString, RevocationError> {
    OctetString::new(bytes)
        .map_err(|e| RevocationError::Parse(format!("failed to build OCTET STRING: {e}")))
}
