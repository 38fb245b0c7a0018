//! Engine configuration and preset policies
//!
//! Provides `RevocationConfig` for configuring revocation behavior including
//! network timeouts, cache limits, and the failure-handling policy.

use std::time::Duration;

use crate::crypto::HashAlg;
use crate::engine::RevocationPolicy;

/// User-Agent sent on every outbound CRL and OCSP request
pub const USER_AGENT: &str = "revoq/0.1";

/// Revocation checking configuration and limits
#[derive(Debug, Clone)]
pub struct RevocationConfig {
    /// Failure-handling policy combining OCSP and CRL verdicts
    pub policy: RevocationPolicy,
    /// TCP/TLS connect timeout for OCSP responders
    pub connect_timeout: Duration,
    /// Total response timeout for OCSP queries
    pub response_timeout: Duration,
    /// Total timeout for CRL downloads
    pub crl_fetch_timeout: Duration,
    /// Include a random nonce in OCSP requests
    pub use_ocsp_nonce: bool,
    /// Hash algorithm used to build OCSP CertIDs
    pub certid_hash_alg: HashAlg,
    /// Accepted clock skew when judging OCSP response freshness
    pub clock_skew_tolerance: Duration,
    /// Maximum number of CRLs kept in the cache
    pub crl_cache_max_entries: usize,
    /// Forced-refresh age for cached CRLs even before nextUpdate
    pub crl_cache_soft_ttl: Duration,
    /// Window before soft expiry in which `update` refetches
    pub crl_refresh_threshold: Duration,
    /// Cache successful OCSP responses per CertID
    pub ocsp_cache_enabled: bool,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            policy: RevocationPolicy::OcspPreferred,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(10),
            crl_fetch_timeout: Duration::from_secs(30),
            use_ocsp_nonce: true,
            certid_hash_alg: HashAlg::Sha1, // RFC 6960 compatibility default
            clock_skew_tolerance: Duration::from_secs(300), // 5 minutes
            crl_cache_max_entries: 100,
            crl_cache_soft_ttl: Duration::from_secs(3600), // 1 hour
            crl_refresh_threshold: Duration::from_secs(3600),
            ocsp_cache_enabled: true,
        }
    }
}

impl RevocationConfig {
    /// Strict configuration: both sources consulted, any failure rejects
    #[must_use]
    pub fn strict() -> Self {
        Self {
            policy: RevocationPolicy::HardFail,
            certid_hash_alg: HashAlg::Sha256,
            clock_skew_tolerance: Duration::from_secs(60),
            ..Self::default()
        }
    }

    /// Lenient configuration: transport failures never block a handshake
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            policy: RevocationPolicy::SoftFail,
            crl_cache_soft_ttl: Duration::from_secs(24 * 3600), // 24 hours
            ..Self::default()
        }
    }

    /// Configuration with revocation checking turned off entirely
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            policy: RevocationPolicy::Disabled,
            ocsp_cache_enabled: false,
            ..Self::default()
        }
    }
}
