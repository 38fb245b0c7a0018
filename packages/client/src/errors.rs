//! Revocation-specific error types for detailed error handling

/// Errors surfaced by the revocation engine and its CRL/OCSP sources
#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RevocationError {
    /// True for network-level failures a caller may retry
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::Io(_))
    }
}
