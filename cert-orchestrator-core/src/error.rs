//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use cert_orchestrator_provider::CredentialValidationError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// The external ACME agent binary is not installed
    #[error("ACME agent is not installed")]
    AgentNotInstalled,

    /// Domain record not found
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// No certificate on disk for the domain
    #[error("No certificate found for domain: {0}")]
    CertificateNotFound(String),

    /// Credential validation errors (unknown provider, missing/empty field)
    #[error("{0}")]
    CredentialValidation(#[from] CredentialValidationError),

    /// An external process exceeded its deadline and was killed
    #[error("{phase} timed out after {seconds}s")]
    ProcessTimedOut {
        /// Which operation timed out (issue, renew, inspect, ...)
        phase: String,
        /// The deadline that was exceeded
        seconds: u64,
    },

    /// An external process exited nonzero
    #[error("{phase} failed (exit code {exit_code}): {detail}")]
    ProcessFailed {
        /// Which operation failed
        phase: String,
        /// Process exit code
        exit_code: i32,
        /// Captured stderr, falling back to stdout when stderr is empty
        detail: String,
    },

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Filesystem / spawn error
    #[error("I/O error: {0}")]
    Io(String),
}

impl CoreError {
    /// Whether this is expected behavior (configuration gaps, resources that
    /// do not exist yet) rather than an operational failure. Used for log
    /// classification: `warn` when `true`, `error` when `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::AgentNotInstalled
                | Self::DomainNotFound(_)
                | Self::CertificateNotFound(_)
                | Self::CredentialValidation(_)
        )
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
