//! Certificate and agent status types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a successful issuance or renewal run.
///
/// Transient — callers persist the window onto the
/// [`DomainRecord`](crate::types::DomainRecord) themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificate {
    /// Start of the certificate's validity.
    pub valid_from: DateTime<Utc>,
    /// End of the certificate's validity.
    pub valid_to: DateTime<Utc>,
    /// Per-domain directory holding cert.pem / privkey.pem / fullchain.pem.
    pub cert_path: PathBuf,
}

/// Metadata read back from the on-disk certificate.
///
/// Field values are the raw labeled strings the inspection command printed;
/// a partial parse leaves the absent fields as `None` rather than failing,
/// since partial information is still useful to a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    /// Domain name.
    pub domain: String,
    /// Path of the inspected fullchain file.
    pub cert_path: PathBuf,
    /// Whether the fullchain file exists on disk.
    pub exists: bool,
    /// `notBefore` value, if the inspection output contained one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    /// `notAfter` value, if the inspection output contained one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
    /// Certificate subject, if the inspection output contained one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Installation state of the external ACME agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcmeAgentStatus {
    /// Whether the agent script is present.
    pub installed: bool,
    /// Agent version string, when the agent could report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Path of the agent script, when installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_path: Option<PathBuf>,
}
