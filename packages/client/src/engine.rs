//! Revocation decision engine
//!
//! Drives the OCSP client and the CRL pipeline according to the configured
//! policy and folds their outcomes into one verdict: `true` means the
//! certificate is currently believed valid, `false` that it is revoked or
//! that its status cannot be established under the policy.

use std::sync::{Arc, RwLock};

use crate::cert::ParsedCertificate;
use crate::config::RevocationConfig;
use crate::crl::{CrlCache, CrlCacheStats, CrlUpdater, CrlValidator};
use crate::errors::RevocationError;
use crate::fetch::HttpFetcher;
use crate::ocsp::{OcspCacheStats, OcspClient};
use crate::report::{CheckReport, MethodDisposition, RevocationMethod, SourceVerdict};

/// Failure-handling policy for combining the two revocation sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationPolicy {
    /// Never check; every certificate passes
    Disabled,
    /// OCSP alone; failures propagate
    OcspOnly,
    /// CRL alone; failures propagate
    CrlOnly,
    /// OCSP first, CRL as fallback
    OcspPreferred,
    /// CRL first, OCSP as fallback
    CrlPreferred,
    /// Both sources; failures on both sides still pass
    SoftFail,
    /// Both sources; anything short of two clean answers rejects
    HardFail,
}

impl std::fmt::Display for RevocationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::OcspOnly => "ocsp-only",
            Self::CrlOnly => "crl-only",
            Self::OcspPreferred => "ocsp-preferred",
            Self::CrlPreferred => "crl-preferred",
            Self::SoftFail => "soft-fail",
            Self::HardFail => "hard-fail",
        };
        f.write_str(name)
    }
}

/// Combined cache statistics for monitoring
#[derive(Debug, Clone, Copy)]
pub struct RevocationStats {
    pub ocsp: OcspCacheStats,
    pub crl: CrlCacheStats,
}

impl RevocationStats {
    pub fn total_hits(&self) -> usize {
        self.ocsp.hits + self.crl.hits
    }

    pub fn total_misses(&self) -> usize {
        self.ocsp.misses + self.crl.misses
    }

    /// Overall cache hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_hits() + self.total_misses();
        if total == 0 {
            0.0
        } else {
            (self.total_hits() as f64 / total as f64) * 100.0
        }
    }
}

/// Policy-driven revocation checker owning the OCSP client and the CRL
/// cache, updater, and validator
pub struct RevocationEngine {
    config: RevocationConfig,
    ocsp: OcspClient,
    updater: CrlUpdater,
    validator: CrlValidator,
    report: RwLock<CheckReport>,
}

impl Default for RevocationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RevocationEngine {
    pub fn new() -> Self {
        Self::with_config(RevocationConfig::default())
    }

    pub fn with_config(config: RevocationConfig) -> Self {
        let fetcher = HttpFetcher::new(
            config.connect_timeout,
            config.response_timeout,
            config.crl_fetch_timeout,
        );
        let cache = Arc::new(CrlCache::new(
            config.crl_cache_max_entries,
            config.crl_cache_soft_ttl,
        ));
        let updater = CrlUpdater::new(cache, fetcher.clone(), config.crl_refresh_threshold);
        let ocsp = OcspClient::new(&config, fetcher);
        Self {
            config,
            ocsp,
            updater,
            validator: CrlValidator::new(),
            report: RwLock::new(CheckReport::default()),
        }
    }

    /// Swap the CRL validator, e.g. to disable signature verification
    pub fn with_crl_validator(mut self, validator: CrlValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Map a closure over the OCSP client, e.g. to change its verifier
    pub fn map_ocsp_client(mut self, f: impl FnOnce(OcspClient) -> OcspClient) -> Self {
        self.ocsp = f(self.ocsp);
        self
    }

    pub fn config(&self) -> &RevocationConfig {
        &self.config
    }

    pub fn crl_cache(&self) -> &Arc<CrlCache> {
        self.updater.cache()
    }

    /// Decide whether `subject`, issued by `issuer`, is currently believed
    /// valid. A Revoked answer is the normal `Ok(false)`; `Err` occurs only
    /// when the policy propagates source failures.
    pub async fn check(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
    ) -> Result<bool, RevocationError> {
        self.check_with_responder(subject, issuer, None).await
    }

    /// Like `check`, with an explicit OCSP responder URL overriding the
    /// subject's AIA extension
    pub async fn check_with_responder(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
        ocsp_url: Option<&str>,
    ) -> Result<bool, RevocationError> {
        let mut report = CheckReport {
            policy: self.config.policy.to_string(),
            ..CheckReport::default()
        };

        let result = match self.config.policy {
            RevocationPolicy::Disabled => Ok(true),
            RevocationPolicy::OcspOnly => {
                let outcome = self.run_ocsp(subject, issuer, ocsp_url, &mut report).await;
                Self::conclude_single(outcome)
            }
            RevocationPolicy::CrlOnly => {
                let outcome = self.run_crl(subject, issuer, &mut report).await;
                Self::conclude_single(outcome)
            }
            RevocationPolicy::OcspPreferred => {
                let primary = self.run_ocsp(subject, issuer, ocsp_url, &mut report).await;
                match Self::settle(&primary) {
                    Some(verdict) => Ok(verdict),
                    None => {
                        let fallback = self.run_crl(subject, issuer, &mut report).await;
                        Self::conclude_preferred(primary, fallback)
                    }
                }
            }
            RevocationPolicy::CrlPreferred => {
                let primary = self.run_crl(subject, issuer, &mut report).await;
                match Self::settle(&primary) {
                    Some(verdict) => Ok(verdict),
                    None => {
                        let fallback = self.run_ocsp(subject, issuer, ocsp_url, &mut report).await;
                        Self::conclude_preferred(primary, fallback)
                    }
                }
            }
            RevocationPolicy::SoftFail | RevocationPolicy::HardFail => {
                // Both sources always run: a Revoked from the second source
                // overrides a Good from the first
                let ocsp = self.run_ocsp(subject, issuer, ocsp_url, &mut report).await;
                let crl = self.run_crl(subject, issuer, &mut report).await;
                let hard = self.config.policy == RevocationPolicy::HardFail;
                Ok(Self::conclude_both(&ocsp, &crl, hard))
            }
        };

        report.verdict = result.as_ref().ok().copied();
        if let Err(e) = &result {
            tracing::warn!(
                "revocation check failed under policy {}: {e}",
                self.config.policy
            );
        }
        self.store_report(report);
        result
    }

    /// Snapshot of the report recorded by the most recent check
    pub fn last_report(&self) -> CheckReport {
        match self.report.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                tracing::warn!("report lock poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    pub fn stats(&self) -> RevocationStats {
        RevocationStats {
            ocsp: self.ocsp.stats(),
            crl: self.crl_cache().stats(),
        }
    }

    /// Evict expired entries from both caches, returning the total dropped
    pub fn cleanup_caches(&self) -> usize {
        self.ocsp.cleanup_cache() + self.updater.cleanup_expired()
    }

    async fn run_ocsp(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
        ocsp_url: Option<&str>,
        report: &mut CheckReport,
    ) -> Result<SourceVerdict, RevocationError> {
        let outcome = self.ocsp.check(subject, issuer, ocsp_url).await;
        Self::record(report, RevocationMethod::Ocsp, &outcome);
        outcome
    }

    async fn run_crl(
        &self,
        subject: &ParsedCertificate,
        issuer: &ParsedCertificate,
        report: &mut CheckReport,
    ) -> Result<SourceVerdict, RevocationError> {
        let outcome = match self.updater.update_from_certificate(subject, false).await {
            Ok(Some(crl)) => self.validator.check_revocation(subject, &crl, issuer),
            Ok(None) => Err(RevocationError::Policy(
                "no CRL available for issuer".to_string(),
            )),
            Err(e) => Err(e),
        };
        Self::record(report, RevocationMethod::Crl, &outcome);
        outcome
    }

    fn record(
        report: &mut CheckReport,
        method: RevocationMethod,
        outcome: &Result<SourceVerdict, RevocationError>,
    ) {
        match outcome {
            Ok(SourceVerdict::Good) => report.record(method, MethodDisposition::Good, None),
            Ok(SourceVerdict::Revoked { .. }) => {
                report.record(method, MethodDisposition::Revoked, None)
            }
            Ok(SourceVerdict::Unknown) => {
                report.record(method, MethodDisposition::Unknown, None)
            }
            Err(e) => report.record(method, MethodDisposition::Failed, Some(e.to_string())),
        }
    }

    /// The verdict a conclusive outcome settles on, if any
    fn settle(outcome: &Result<SourceVerdict, RevocationError>) -> Option<bool> {
        match outcome {
            Ok(SourceVerdict::Good) => Some(true),
            Ok(SourceVerdict::Revoked { .. }) => Some(false),
            _ => None,
        }
    }

    /// Single-source policies: conclusive verdicts decide, everything else
    /// propagates as a failure
    fn conclude_single(
        outcome: Result<SourceVerdict, RevocationError>,
    ) -> Result<bool, RevocationError> {
        match outcome {
            Ok(SourceVerdict::Good) => Ok(true),
            Ok(SourceVerdict::Revoked { .. }) => Ok(false),
            Ok(SourceVerdict::Unknown) => Err(RevocationError::Policy(
                "revocation status unknown".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    /// Preferred policies after an inconclusive primary: the fallback
    /// decides, else the most relevant failure propagates
    fn conclude_preferred(
        primary: Result<SourceVerdict, RevocationError>,
        fallback: Result<SourceVerdict, RevocationError>,
    ) -> Result<bool, RevocationError> {
        if let Some(verdict) = Self::settle(&fallback) {
            return Ok(verdict);
        }
        match fallback {
            Err(e) => Err(e),
            Ok(_) => match primary {
                Err(e) => Err(e),
                Ok(_) => Err(RevocationError::Policy(
                    "revocation status unknown from both sources".to_string(),
                )),
            },
        }
    }

    /// SoftFail/HardFail: Revoked from either source wins; otherwise
    /// HardFail demands Good from both while SoftFail passes on failure
    fn conclude_both(
        ocsp: &Result<SourceVerdict, RevocationError>,
        crl: &Result<SourceVerdict, RevocationError>,
        hard: bool,
    ) -> bool {
        let revoked = matches!(ocsp, Ok(SourceVerdict::Revoked { .. }))
            || matches!(crl, Ok(SourceVerdict::Revoked { .. }));
        if revoked {
            return false;
        }
        if hard {
            matches!(ocsp, Ok(SourceVerdict::Good)) && matches!(crl, Ok(SourceVerdict::Good))
        } else {
            true
        }
    }

    fn store_report(&self, report: CheckReport) {
        match self.report.write() {
            Ok(mut guard) => *guard = report,
            Err(poisoned) => {
                tracing::warn!("report lock poisoned, recovering");
                *poisoned.into_inner() = report;
            }
        }
    }
}
