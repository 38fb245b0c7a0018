//! CRL data model, parsing, caching, refresh, and validation

pub mod cache;
pub mod parser;
pub mod updater;
pub mod validator;

pub use cache::{CrlCache, CrlCacheStats};
pub use parser::parse_crl;
pub use updater::CrlUpdater;
pub use validator::CrlValidator;

use std::collections::HashMap;
use std::ops::Range;
use std::time::SystemTime;

/// CRL entry reason code (RFC 5280 §5.3.1). Value 7 is unassigned and any
/// unlisted value is carried through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
    Other(u8),
}

impl ReasonCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Unspecified,
            1 => Self::KeyCompromise,
            2 => Self::CaCompromise,
            3 => Self::AffiliationChanged,
            4 => Self::Superseded,
            5 => Self::CessationOfOperation,
            6 => Self::CertificateHold,
            8 => Self::RemoveFromCrl,
            9 => Self::PrivilegeWithdrawn,
            10 => Self::AaCompromise,
            other => Self::Other(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Unspecified => 0,
            Self::KeyCompromise => 1,
            Self::CaCompromise => 2,
            Self::AffiliationChanged => 3,
            Self::Superseded => 4,
            Self::CessationOfOperation => 5,
            Self::CertificateHold => 6,
            Self::RemoveFromCrl => 8,
            Self::PrivilegeWithdrawn => 9,
            Self::AaCompromise => 10,
            Self::Other(v) => *v,
        }
    }

    /// removeFromCRL: a prior certificateHold has been lifted
    pub fn is_removal(&self) -> bool {
        matches!(self, Self::RemoveFromCrl)
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unspecified => "unspecified",
            Self::KeyCompromise => "keyCompromise",
            Self::CaCompromise => "cACompromise",
            Self::AffiliationChanged => "affiliationChanged",
            Self::Superseded => "superseded",
            Self::CessationOfOperation => "cessationOfOperation",
            Self::CertificateHold => "certificateHold",
            Self::RemoveFromCrl => "removeFromCRL",
            Self::PrivilegeWithdrawn => "privilegeWithdrawn",
            Self::AaCompromise => "aACompromise",
            Self::Other(v) => return write!(f, "unknown({v})"),
        };
        f.write_str(name)
    }
}

/// One revoked certificate inside a CRL
#[derive(Debug, Clone)]
pub struct CrlEntry {
    /// Canonical big-endian hex serial
    pub serial_hex: String,
    pub revocation_date: SystemTime,
    pub reason: Option<ReasonCode>,
    pub invalidity_date: Option<SystemTime>,
}

/// A parsed certificate revocation list. Owns the original DER buffer so
/// that `tbs_bytes` stays the exact byte span the signature covers.
#[derive(Debug, Clone)]
pub struct Crl {
    /// Display form of the issuer DN
    pub issuer: String,
    /// Canonical DER of the issuer Name
    pub issuer_der: Vec<u8>,
    pub this_update: SystemTime,
    pub next_update: Option<SystemTime>,
    /// CRL Number extension value; 0 when the extension is absent
    pub crl_number: u128,
    /// Dotted OID of the outer signature algorithm
    pub signature_alg: Option<String>,
    /// Detached signature bits
    pub signature: Option<Vec<u8>>,
    /// Original DER bytes of the whole CertificateList
    pub raw: Vec<u8>,
    /// Span of tbsCertList inside `raw`
    pub tbs_range: Option<Range<usize>>,
    /// Revoked entries keyed by canonical hex serial
    pub entries: HashMap<String, CrlEntry>,
}

impl Crl {
    /// The exact bytes covered by the CRL signature. Never a re-encoding.
    pub fn tbs_bytes(&self) -> Option<&[u8]> {
        self.tbs_range.clone().and_then(|r| self.raw.get(r))
    }

    /// True once `nextUpdate` has passed. A CRL without `nextUpdate` has no
    /// authority boundary and is reported as expired for cache purposes.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        match self.next_update {
            Some(next) => now > next,
            None => true,
        }
    }

    /// True before `thisUpdate`: the CRL is not yet in force
    pub fn is_not_yet_valid(&self, now: SystemTime) -> bool {
        now < self.this_update
    }

    /// Look up a revoked entry by raw serial bytes
    pub fn entry_for_serial(&self, serial: &[u8]) -> Option<&CrlEntry> {
        self.entries.get(&crate::cert::serial_hex(serial))
    }
}
