//! Runtime configuration for the certificate lifecycle services.
//!
//! Deserializable from the embedding application's config file; every field
//! has a deployment-ready default. No global state — the config is injected
//! through [`ServiceContext`](crate::services::ServiceContext).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Certificate lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CertConfig {
    /// Root directory holding one subdirectory per domain.
    pub certs_dir: PathBuf,
    /// ACME agent home directory (contains the `acme.sh` script).
    pub acme_home: PathBuf,
    /// Name of the web service that may hold the validation port.
    pub web_service: String,
    /// Port the CA contacts for standalone validation.
    pub http_port: u16,
    /// Deadline for a standalone issuance/renewal run.
    pub standalone_timeout_secs: u64,
    /// Deadline for a DNS issuance/renewal run. DNS propagation is slower.
    pub dns_timeout_secs: u64,
    /// Deadline for the certificate inspection command.
    pub inspect_timeout_secs: u64,
    /// Deadline for each web-service stop/start command.
    pub service_control_timeout_secs: u64,
    /// How often the renewal scanner fires.
    pub renew_check_interval_secs: u64,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self {
            certs_dir: PathBuf::from("/opt/cert-orchestrator/certs"),
            acme_home: default_acme_home(),
            web_service: "nginx".to_string(),
            http_port: 80,
            standalone_timeout_secs: 120,
            dns_timeout_secs: 300,
            inspect_timeout_secs: 5,
            service_control_timeout_secs: 10,
            renew_check_interval_secs: 24 * 60 * 60,
        }
    }
}

fn default_acme_home() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("/root"), PathBuf::from)
        .join(".acme.sh")
}

impl CertConfig {
    /// Path of the ACME agent script.
    #[must_use]
    pub fn acme_sh(&self) -> PathBuf {
        self.acme_home.join("acme.sh")
    }

    /// Per-domain certificate directory.
    #[must_use]
    pub fn domain_dir(&self, domain: &str) -> PathBuf {
        self.certs_dir.join(domain)
    }

    /// Fullchain file for a domain, as required by most TLS servers.
    #[must_use]
    pub fn fullchain_path(&self, domain: &str) -> PathBuf {
        self.domain_dir(domain).join("fullchain.pem")
    }

    /// Deadline for an agent run using the given challenge strategy.
    #[must_use]
    pub fn agent_timeout(&self, standalone: bool) -> Duration {
        if standalone {
            Duration::from_secs(self.standalone_timeout_secs)
        } else {
            Duration::from_secs(self.dns_timeout_secs)
        }
    }

    /// Deadline for the inspection command.
    #[must_use]
    pub const fn inspect_timeout(&self) -> Duration {
        Duration::from_secs(self.inspect_timeout_secs)
    }

    /// Deadline for a web-service control command.
    #[must_use]
    pub const fn service_control_timeout(&self) -> Duration {
        Duration::from_secs(self.service_control_timeout_secs)
    }
}

impl CertConfig {
    /// Config rooted at a specific certs directory, other fields defaulted.
    #[must_use]
    pub fn with_certs_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            certs_dir: dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }
}
