//! # revoq client
//!
//! Policy-driven TLS certificate revocation checking. The engine decides
//! whether an end-entity certificate, issued by a given CA certificate, is
//! currently revoked by driving two independent sources — CRL and OCSP —
//! and resolving their verdicts under a configurable failure policy.
//!
//! - **CRL pipeline**: fetch from distribution points, parse PEM/DER,
//!   cache per issuer with an LRU bound, enforce CRL Number monotonicity,
//!   verify the signature over the exact tbsCertList bytes.
//! - **OCSP client**: CertID construction, nonce handling, response
//!   matching, freshness windows with clock-skew tolerance, per-CertID
//!   response caching.
//! - **Decision engine**: a closed policy set from `Disabled` through
//!   `HardFail` combining both sources into one verdict plus a structured
//!   per-check report.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod cert;
pub mod config;
pub mod crl;
pub mod crypto;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod ocsp;
pub mod report;

mod der_span;

pub use cert::ParsedCertificate;
pub use config::RevocationConfig;
pub use crl::{Crl, CrlCache, CrlEntry, CrlUpdater, CrlValidator, ReasonCode};
pub use engine::{RevocationEngine, RevocationPolicy, RevocationStats};
pub use errors::RevocationError;
pub use ocsp::{CertIdDigest, OcspClient, OcspRequestBuilder, ParsedOcspResponse};
pub use report::{CheckReport, MethodDisposition, RevocationMethod, SourceVerdict};
