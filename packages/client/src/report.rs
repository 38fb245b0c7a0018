//! Per-check status reporting

use std::time::SystemTime;

use crate::crl::ReasonCode;

/// Revocation source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationMethod {
    Ocsp,
    Crl,
}

impl std::fmt::Display for RevocationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ocsp => f.write_str("ocsp"),
            Self::Crl => f.write_str("crl"),
        }
    }
}

/// Conclusive answer from a single revocation source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceVerdict {
    Good,
    Revoked {
        reason: Option<ReasonCode>,
        revoked_at: Option<SystemTime>,
    },
    /// The source answered but does not know the certificate
    Unknown,
}

impl SourceVerdict {
    /// Good and Revoked settle the question; Unknown does not
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Good | Self::Revoked { .. })
    }
}

/// How a consulted source ended up, as recorded in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodDisposition {
    Good,
    Revoked,
    Unknown,
    Failed,
}

impl std::fmt::Display for MethodDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => f.write_str("good"),
            Self::Revoked => f.write_str("revoked"),
            Self::Unknown => f.write_str("unknown"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Structured record of one revocation check: which methods ran, how each
/// concluded, and the final verdict. Overwritten on every check; callers
/// snapshot via `RevocationEngine::last_report`.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Name of the active policy
    pub policy: String,
    /// Methods attempted, in the order they ran
    pub methods_tried: Vec<RevocationMethod>,
    pub ocsp_status: Option<MethodDisposition>,
    pub crl_status: Option<MethodDisposition>,
    pub ocsp_error: Option<String>,
    pub crl_error: Option<String>,
    /// Final verdict; `None` when the check ended in an error
    pub verdict: Option<bool>,
}

impl CheckReport {
    pub(crate) fn record(
        &mut self,
        method: RevocationMethod,
        disposition: MethodDisposition,
        error: Option<String>,
    ) {
        self.methods_tried.push(method);
        match method {
            RevocationMethod::Ocsp => {
                self.ocsp_status = Some(disposition);
                self.ocsp_error = error;
            }
            RevocationMethod::Crl => {
                self.crl_status = Some(disposition);
                self.crl_error = error;
            }
        }
    }
}
