//! revoq public API
//!
//! Policy-driven TLS certificate revocation checking over CRL and OCSP.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

// Re-export the client surface
pub use revoq_client::{
    CertIdDigest, CheckReport, Crl, CrlCache, CrlEntry, CrlUpdater, CrlValidator,
    MethodDisposition, OcspClient, OcspRequestBuilder, ParsedCertificate, ParsedOcspResponse,
    ReasonCode, RevocationConfig, RevocationEngine, RevocationError, RevocationMethod,
    RevocationPolicy, RevocationStats, SourceVerdict,
};

/// Main entry point providing engine constructors
pub struct Revoq;

impl Revoq {
    /// Engine with the default configuration (OcspPreferred policy)
    #[must_use]
    pub fn engine() -> RevocationEngine {
        RevocationEngine::new()
    }

    /// Engine with a specific policy and otherwise default configuration
    #[must_use]
    pub fn with_policy(policy: RevocationPolicy) -> RevocationEngine {
        RevocationEngine::with_config(RevocationConfig {
            policy,
            ..RevocationConfig::default()
        })
    }

    /// Engine with the strict preset: both sources consulted, any failure
    /// rejects
    #[must_use]
    pub fn strict() -> RevocationEngine {
        RevocationEngine::with_config(RevocationConfig::strict())
    }

    /// Engine with the lenient preset: transport failures never block
    #[must_use]
    pub fn lenient() -> RevocationEngine {
        RevocationEngine::with_config(RevocationConfig::lenient())
    }
}
