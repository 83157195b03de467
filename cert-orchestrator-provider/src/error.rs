use serde::Serialize;
use thiserror::Error;

use crate::types::ProviderId;

/// Validation error for provider credentials.
///
/// Returned before any external process runs, so callers can remediate
/// configuration without side effects. Only the first offending field is
/// reported, in catalog declaration order.
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialValidationError {
    /// The provider id does not name a catalog entry.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// A required credential field is missing entirely.
    #[error("Missing required credential: {label}")]
    MissingField {
        /// Which provider the error relates to.
        provider: ProviderId,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },

    /// A credential field is present but empty/whitespace-only.
    #[error("Credential must not be empty: {label}")]
    EmptyField {
        /// Which provider the error relates to.
        provider: ProviderId,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
}
