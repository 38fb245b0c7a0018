//! OCSP responder client
//!
//! Sends a POST query, matches the response back to the request (CertID and
//! nonce), applies the freshness window, verifies the response signature,
//! and caches good answers per CertID until their `nextUpdate`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use x509_parser::prelude::*;

use super::request::{CertIdDigest, OcspRequestBuilder, OcspRequestData};
use super::response::{parse_ocsp_response, OcspCertStatus, ParsedOcspResponse};
use crate::cert::ParsedCertificate;
use crate::config::RevocationConfig;
use crate::crypto::{RingVerifier, SignatureVerifier};
use crate::der_span::tbs_span;
use crate::errors::RevocationError;
use crate::fetch::HttpFetcher;
use crate::report::SourceVerdict;

/// DER encoding of id-kp-OCSPSigning (1.3.6.1.5.5.7.3.9) as it appears
/// inside an ExtendedKeyUsage SEQUENCE
const OCSP_SIGNING_EKU_DER: [u8; 10] = [0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x09];

/// ExtendedKeyUsage extension OID
const OID_EXT_KEY_USAGE: &str = "2.5.29.37";

/// Cache counters snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcspCacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

/// OCSP client with a per-CertID response cache
pub struct OcspClient {
    builder: OcspRequestBuilder,
    fetcher: HttpFetcher,
    cache: RwLock<HashMap<CertIdDigest, ParsedOcspResponse>>,
    cache_enabled: bool,
    clock_skew: Duration,
    verifier: Option<Arc<dyn SignatureVerifier>>,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

impl std::fmt::Debug for OcspClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcspClient")
            .field("cache_size", &self.cache_size())
            .field("cache_enabled", &self.cache_enabled)
            .finish_non_exhaustive()
    }
}

impl OcspClient {
    pub fn new(config: &RevocationConfig, fetcher: HttpFetcher) -> Self {
        Self {
            builder: OcspRequestBuilder::new(config.certid_hash_alg, config.use_ocsp_nonce),
            fetcher,
            cache: RwLock::new(HashMap::with_capacity(128)),
            cache_enabled: config.ocsp_cache_enabled,
            clock_skew: config.clock_skew_tolerance,
            verifier: Some(Arc::new(RingVerifier)),
            cache_hits: AtomicUsize::new(0),
            cache_misses: AtomicUsize::new(0),
        }
    }

    /// Replace or remove the response signature verifier
    pub fn with_verifier(mut self, verifier: Option<Arc<dyn SignatureVerifier>>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Query the revocation status of `subject`. The responder URL comes
    /// from `explicit_url` when given, otherwise from the subject's AIA
    /// extension.
    pub async fn check(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
        explicit_url: Option<&str>,
    ) -> Result<SourceVerdict, RevocationError> {
        let cert_id = self.builder.cert_id(subject, issuer);

        if self.cache_enabled {
            if let Some(cached) = self.cached(&cert_id) {
                tracing::debug!(
                    "OCSP cache hit for serial {}",
                    cert_id.serial_hex()
                );
                return Ok(verdict_of(&cached));
            }
        }

        let responder_url = match explicit_url.or_else(|| subject.ocsp_urls.first().map(|s| s.as_str())) {
            Some(url) => url.to_string(),
            None => {
                tracing::warn!(
                    "no OCSP responder URL for certificate {}, status unknown",
                    subject.subject
                );
                return Err(RevocationError::Policy(
                    "no OCSP responder URL in certificate".to_string(),
                ));
            }
        };

        let request = self.builder.build(subject, issuer)?;
        let body = self
            .fetcher
            .post_ocsp(&responder_url, request.as_der().to_vec())
            .await?;

        let parsed = parse_ocsp_response(&body, &request.cert_id)?;
        self.match_nonce(&request, &parsed)?;
        self.check_freshness(&parsed)?;
        self.verify_signature(&parsed, issuer)?;

        let verdict = verdict_of(&parsed);
        tracing::info!(
            "OCSP responder {responder_url} answered {:?} for serial {}",
            parsed.cert_status,
            request.cert_id.serial_hex()
        );

        if self.cache_enabled && !parsed.is_expired(SystemTime::now()) {
            self.store(request.cert_id, parsed);
        }
        Ok(verdict)
    }

    /// Nonce equality is required when both sides carried one; a one-sided
    /// nonce is only a warning
    fn match_nonce(
        &self,
        request: &OcspRequestData,
        parsed: &ParsedOcspResponse,
    ) -> Result<(), RevocationError> {
        match (request.nonce_bytes(), &parsed.nonce) {
            (Some(sent), Some(received)) => {
                if &sent != received {
                    return Err(RevocationError::Protocol(
                        "OCSP nonce mismatch - possible replay attack".to_string(),
                    ));
                }
                Ok(())
            }
            (Some(_), None) => {
                tracing::warn!("OCSP responder did not echo the request nonce");
                Ok(())
            }
            (None, Some(_)) => {
                tracing::warn!("OCSP responder sent an unsolicited nonce");
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    fn check_freshness(&self, parsed: &ParsedOcspResponse) -> Result<(), RevocationError> {
        let now = SystemTime::now();
        if parsed.this_update > now + self.clock_skew {
            return Err(RevocationError::Protocol(
                "OCSP thisUpdate is in the future beyond clock skew tolerance".to_string(),
            ));
        }
        if let Some(next) = parsed.next_update {
            if now > next {
                return Err(RevocationError::Policy(
                    "stale OCSP response: nextUpdate has passed".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Verify the response signature over the exact tbsResponseData bytes.
    /// The signer is normally the issuer; a delegated responder certificate
    /// is accepted when it is issuer-signed and carries the OCSPSigning EKU.
    fn verify_signature(
        &self,
        parsed: &ParsedOcspResponse,
        issuer: &ParsedCertificate,
    ) -> Result<(), RevocationError> {
        let Some(verifier) = &self.verifier else {
            tracing::warn!("no signature verifier configured, accepting OCSP response unverified");
            return Ok(());
        };

        if verifier
            .verify(
                &parsed.signature_alg,
                &parsed.tbs_bytes,
                &parsed.signature,
                &issuer.spki_key_bits,
            )
            .is_ok()
        {
            return Ok(());
        }

        self.verify_delegated(parsed, issuer, verifier.as_ref())
    }

    fn verify_delegated(
        &self,
        parsed: &ParsedOcspResponse,
        issuer: &ParsedCertificate,
        verifier: &dyn SignatureVerifier,
    ) -> Result<(), RevocationError> {
        let responder_der = parsed.responder_cert_der.as_deref().ok_or_else(|| {
            RevocationError::Protocol(
                "OCSP signature not made by issuer and no responder certificate included"
                    .to_string(),
            )
        })?;

        if !has_ocsp_signing_eku(responder_der)? {
            return Err(RevocationError::Protocol(
                "responder certificate lacks the OCSPSigning extended key usage".to_string(),
            ));
        }

        let (_, responder) = X509Certificate::from_der(responder_der)
            .map_err(|e| RevocationError::Parse(format!("responder certificate: {e}")))?;

        // The delegated responder must itself be certified by the issuer
        let responder_tbs = &responder_der[tbs_span(responder_der)?];
        verifier
            .verify(
                &responder.signature_algorithm.algorithm.to_id_string(),
                responder_tbs,
                &responder.signature_value.data,
                &issuer.spki_key_bits,
            )
            .map_err(|e| {
                RevocationError::Protocol(format!(
                    "responder certificate not signed by issuer: {e}"
                ))
            })?;

        let responder_key = responder.public_key().subject_public_key.data.to_vec();
        verifier
            .verify(
                &parsed.signature_alg,
                &parsed.tbs_bytes,
                &parsed.signature,
                &responder_key,
            )
            .map_err(|e| RevocationError::Protocol(format!("OCSP signature invalid: {e}")))
    }

    fn cached(&self, cert_id: &CertIdDigest) -> Option<ParsedOcspResponse> {
        let now = SystemTime::now();
        let hit = {
            let cache = self.read_cache();
            match cache.get(cert_id) {
                Some(entry) if !entry.is_expired(now) => Some(entry.clone()),
                Some(_) => None,
                None => {
                    self.cache_misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };
        match hit {
            Some(entry) => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                // Expired entries are removed so the next check refetches
                self.write_cache().remove(cert_id);
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn store(&self, cert_id: CertIdDigest, parsed: ParsedOcspResponse) {
        self.write_cache().insert(cert_id, parsed);
    }

    /// Drop every cached response past its nextUpdate
    pub fn cleanup_cache(&self) -> usize {
        let now = SystemTime::now();
        let mut cache = self.write_cache();
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_expired(now));
        before - cache.len()
    }

    pub fn cache_size(&self) -> usize {
        self.read_cache().len()
    }

    pub fn stats(&self) -> OcspCacheStats {
        OcspCacheStats {
            hits: self.cache_hits.load(Ordering::Relaxed),
            misses: self.cache_misses.load(Ordering::Relaxed),
            size: self.cache_size(),
        }
    }

    fn read_cache(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<CertIdDigest, ParsedOcspResponse>> {
        match self.cache.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("OCSP cache read lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_cache(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<CertIdDigest, ParsedOcspResponse>> {
        match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("OCSP cache write lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

fn verdict_of(parsed: &ParsedOcspResponse) -> SourceVerdict {
    match &parsed.cert_status {
        OcspCertStatus::Good => SourceVerdict::Good,
        OcspCertStatus::Revoked { reason, revoked_at } => SourceVerdict::Revoked {
            reason: *reason,
            revoked_at: Some(*revoked_at),
        },
        OcspCertStatus::Unknown => SourceVerdict::Unknown,
    }
}

/// Scan the ExtendedKeyUsage extension for id-kp-OCSPSigning
fn has_ocsp_signing_eku(cert_der: &[u8]) -> Result<bool, RevocationError> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| RevocationError::Parse(format!("responder certificate: {e}")))?;
    for ext in cert.extensions() {
        if ext.oid.to_id_string() != OID_EXT_KEY_USAGE {
            continue;
        }
        let found = ext
            .value
            .windows(OCSP_SIGNING_EKU_DER.len())
            .any(|window| window == OCSP_SIGNING_EKU_DER);
        return Ok(found);
    }
    Ok(false)
}
