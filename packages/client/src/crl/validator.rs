//! CRL authenticity validation and revocation lookup

use std::sync::Arc;
use std::time::SystemTime;

use super::Crl;
use crate::cert::ParsedCertificate;
use crate::crypto::{RingVerifier, SignatureVerifier};
use crate::errors::RevocationError;
use crate::report::SourceVerdict;

/// Validates CRL signatures and temporal bounds and classifies subject
/// certificates against the revocation entries
pub struct CrlValidator {
    verifier: Option<Arc<dyn SignatureVerifier>>,
}

impl Default for CrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CrlValidator {
    /// Validator with the ring-backed signature verifier
    pub fn new() -> Self {
        Self {
            verifier: Some(Arc::new(RingVerifier)),
        }
    }

    /// Validator with a caller-supplied signature verifier
    pub fn with_verifier(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            verifier: Some(verifier),
        }
    }

    /// Validator that skips signature verification entirely (each skipped
    /// CRL is still logged)
    pub fn without_signature_verification() -> Self {
        Self { verifier: None }
    }

    /// Verify that `crl` is an authentic, in-force CRL from `issuer`.
    ///
    /// An expired CRL is a warning, not a failure: lenient policies may
    /// still act on it, and the caller sees the expiry in the log.
    pub fn validate(
        &self,
        crl: &Crl,
        issuer: &ParsedCertificate,
    ) -> Result<(), RevocationError> {
        if issuer.subject_der != crl.issuer_der {
            return Err(RevocationError::Protocol(format!(
                "CRL issuer {} does not match certificate subject {}",
                crl.issuer, issuer.subject
            )));
        }

        let now = SystemTime::now();
        if crl.is_not_yet_valid(now) {
            return Err(RevocationError::Protocol(format!(
                "CRL from {} is not yet valid",
                crl.issuer
            )));
        }
        if crl.is_expired(now) {
            tracing::warn!("CRL from {} is expired or carries no nextUpdate", crl.issuer);
        }

        match (
            &crl.signature_alg,
            &crl.signature,
            crl.tbs_bytes(),
            &self.verifier,
        ) {
            (Some(alg), Some(sig), Some(tbs), Some(verifier)) => verifier
                .verify(alg, tbs, sig, &issuer.spki_key_bits)
                .map_err(|e| {
                    RevocationError::Protocol(format!("CRL signature invalid: {e}"))
                })?,
            (_, _, _, None) => {
                tracing::warn!(
                    "no signature verifier configured, accepting CRL from {} unverified",
                    crl.issuer
                );
            }
            _ => {
                tracing::warn!(
                    "CRL from {} is missing signature material, skipping verification",
                    crl.issuer
                );
            }
        }

        Ok(())
    }

    /// Classify `subject` against `crl`, verifying the CRL against `issuer`
    /// first. An entry with reason removeFromCRL means a prior
    /// certificateHold was lifted and the certificate is good again.
    pub fn check_revocation(
        &self,
        subject: &ParsedCertificate,
        crl: &Crl,
        issuer: &ParsedCertificate,
    ) -> Result<SourceVerdict, RevocationError> {
        if subject.issuer_der != crl.issuer_der {
            return Err(RevocationError::Protocol(format!(
                "certificate issuer {} does not match CRL issuer {}",
                subject.issuer, crl.issuer
            )));
        }

        self.validate(crl, issuer)?;

        match crl.entry_for_serial(&subject.serial) {
            None => Ok(SourceVerdict::Good),
            Some(entry) if entry.reason.is_some_and(|r| r.is_removal()) => {
                tracing::info!(
                    "serial {} listed with removeFromCRL, hold lifted",
                    entry.serial_hex
                );
                Ok(SourceVerdict::Good)
            }
            Some(entry) => {
                tracing::warn!(
                    "serial {} revoked by {} ({})",
                    entry.serial_hex,
                    crl.issuer,
                    entry
                        .reason
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "no reason given".to_string())
                );
                Ok(SourceVerdict::Revoked {
                    reason: entry.reason,
                    revoked_at: Some(entry.revocation_date),
                })
            }
        }
    }
}
