//! Domain record types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cert_orchestrator_provider::ProviderId;

use super::certificate::IssuedCertificate;

/// A registered domain and its certificate state.
///
/// Owned by the persistence collaborator; this core reads provider/credential
/// fields for challenge runs and writes the validity window back through
/// [`apply_issuance`](Self::apply_issuance) after a successful run. When
/// `cert_valid_to` is set it is strictly later than `cert_valid_from`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    /// Record ID.
    pub id: String,
    /// Unique validated hostname.
    pub domain: String,
    /// CA account identifier.
    pub email: String,
    /// Validation provider for this domain.
    pub provider: ProviderId,
    /// Provider credential key → secret. Empty for standalone.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub credentials: HashMap<String, String>,
    /// Whether the renewal scanner may pick this domain up.
    pub auto_renew: bool,
    /// Renewal window size in days.
    pub renew_before_days: u32,
    /// Start of the current certificate's validity, if any was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_valid_from: Option<DateTime<Utc>>,
    /// End of the current certificate's validity, if any was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_valid_to: Option<DateTime<Utc>>,
    /// When the certificate was last successfully renewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_renew_at: Option<DateTime<Utc>>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DomainRecord {
    /// Creates a record for a freshly registered domain with no certificate.
    #[must_use]
    pub fn new(domain: &str, email: &str, provider: ProviderId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            domain: domain.to_string(),
            email: email.to_string(),
            provider,
            credentials: HashMap::new(),
            auto_renew: true,
            renew_before_days: 30,
            cert_valid_from: None,
            cert_valid_to: None,
            last_renew_at: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Records the outcome of a successful issuance/renewal run.
    ///
    /// This is the only path through which the certificate fields mutate.
    pub fn apply_issuance(&mut self, issued: &IssuedCertificate, now: DateTime<Utc>) {
        self.cert_valid_from = Some(issued.valid_from);
        self.cert_valid_to = Some(issued.valid_to);
        self.last_renew_at = Some(now);
        self.updated_at = Some(now);
    }
}

/// A domain whose certificate expires within the queried window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringDomain {
    /// Domain name.
    pub domain: String,
    /// End of the certificate's validity.
    pub cert_valid_to: DateTime<Utc>,
    /// Whole days until expiry.
    pub days_remaining: i64,
}
