//! Issuance and renewal of certificates through the external ACME agent.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use cert_orchestrator_provider::{validate_credentials, ProviderDescriptor, ProviderId};

use crate::error::{CoreError, CoreResult};
use crate::services::{CertificateInspector, ServiceContext, WebServerCoordinator};
use crate::traits::{CommandSpec, ProcessOutput};
use crate::types::IssuedCertificate;

/// Which agent verb an attempt runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentVerb {
    Issue,
    Renew,
}

impl AgentVerb {
    const fn flag(self) -> &'static str {
        match self {
            Self::Issue => "--issue",
            Self::Renew => "--renew",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Renew => "renew",
        }
    }
}

/// Drives one issuance or renewal attempt for one domain.
///
/// Validation failures short-circuit before any external process runs.
/// Standalone challenges execute inside the port coordinator's critical
/// section; DNS challenges run directly, with provider credentials injected
/// through the child environment. Attempts for the same domain are
/// serialized — both writers would target the same certificate directory —
/// while DNS attempts for different domains may run in parallel.
///
/// Every attempt forces reissue, so retrying after a partial failure simply
/// overwrites whatever the previous run left behind.
pub struct ChallengeEngine {
    ctx: Arc<ServiceContext>,
    coordinator: WebServerCoordinator,
    inspector: CertificateInspector,
    domain_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChallengeEngine {
    /// Creates the engine and its port coordinator.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        let coordinator = WebServerCoordinator::new(
            ctx.process_runner.clone(),
            &ctx.config.web_service,
            ctx.config.service_control_timeout(),
        );
        let inspector = CertificateInspector::new(ctx.clone());
        Self {
            ctx,
            coordinator,
            inspector,
            domain_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a certificate for the domain.
    ///
    /// Creates the per-domain certificate directory if needed, then runs the
    /// agent with the strategy the provider implies.
    pub async fn issue(
        &self,
        domain: &str,
        email: &str,
        provider: ProviderId,
        credentials: &HashMap<String, String>,
    ) -> CoreResult<IssuedCertificate> {
        self.ensure_agent_installed()?;
        validate_credentials(provider, credentials)?;

        let lock = self.domain_lock(domain).await;
        let _guard = lock.lock_owned().await;

        tokio::fs::create_dir_all(self.ctx.config.domain_dir(domain)).await?;

        log::info!("Issuing certificate for {domain} via {provider}");
        self.run_agent(AgentVerb::Issue, domain, Some(email), provider, credentials)
            .await
    }

    /// Renews the domain's certificate.
    ///
    /// Reuses the directory created at issuance; renewal never creates it.
    pub async fn renew(
        &self,
        domain: &str,
        provider: ProviderId,
        credentials: &HashMap<String, String>,
    ) -> CoreResult<IssuedCertificate> {
        self.ensure_agent_installed()?;
        validate_credentials(provider, credentials)?;

        let lock = self.domain_lock(domain).await;
        let _guard = lock.lock_owned().await;

        log::info!("Renewing certificate for {domain} via {provider}");
        self.run_agent(AgentVerb::Renew, domain, None, provider, credentials)
            .await
    }

    async fn run_agent(
        &self,
        verb: AgentVerb,
        domain: &str,
        email: Option<&str>,
        provider: ProviderId,
        credentials: &HashMap<String, String>,
    ) -> CoreResult<IssuedCertificate> {
        let descriptor = provider.descriptor();
        let spec = self.agent_command(verb, domain, email, &descriptor, credentials);

        let output = if descriptor.challenge.is_standalone() {
            let runner = self.ctx.process_runner.clone();
            self.coordinator
                .with_port_suspended(move || async move { runner.run(spec).await })
                .await?
        } else {
            self.ctx.process_runner.run(spec).await?
        };

        self.finish(verb, domain, &output).await
    }

    /// Builds the agent invocation per the agent's command contract.
    /// Credentials ride in the environment, never in argv.
    fn agent_command(
        &self,
        verb: AgentVerb,
        domain: &str,
        email: Option<&str>,
        descriptor: &ProviderDescriptor,
        credentials: &HashMap<String, String>,
    ) -> CommandSpec {
        let config = &self.ctx.config;
        let cert_dir = config.domain_dir(domain);

        let mut spec = CommandSpec::new(
            config.acme_sh(),
            verb.label(),
            config.agent_timeout(descriptor.challenge.is_standalone()),
        )
        .arg(verb.flag())
        .arg("-d")
        .arg(domain);

        if verb == AgentVerb::Issue {
            spec = match descriptor.challenge.dns_hook() {
                None => spec
                    .arg("--standalone")
                    .arg("--httpport")
                    .arg(config.http_port.to_string()),
                Some(hook) => spec.arg("--dns").arg(hook),
            };
        }
        if let Some(email) = email {
            spec = spec.arg("-m").arg(email);
        }

        spec = spec
            .arg("--cert-file")
            .arg(cert_dir.join("cert.pem").to_string_lossy())
            .arg("--key-file")
            .arg(cert_dir.join("privkey.pem").to_string_lossy())
            .arg("--fullchain-file")
            .arg(cert_dir.join("fullchain.pem").to_string_lossy())
            .arg("--force");

        if !descriptor.challenge.is_standalone() {
            spec = spec.envs(credentials);
        }
        spec
    }

    async fn finish(
        &self,
        verb: AgentVerb,
        domain: &str,
        output: &ProcessOutput,
    ) -> CoreResult<IssuedCertificate> {
        if !output.success() {
            let detail = output.diagnostic().to_string();
            log::error!(
                "Certificate {} for {domain} failed (exit {}): {detail}",
                verb.label(),
                output.exit_code
            );
            return Err(CoreError::ProcessFailed {
                phase: verb.label().to_string(),
                exit_code: output.exit_code,
                detail,
            });
        }

        self.restrict_permissions(domain).await;
        let (valid_from, valid_to) = self.read_window(domain).await;
        log::info!(
            "Certificate {} for {domain} succeeded, valid until {valid_to}",
            verb.label()
        );
        Ok(IssuedCertificate {
            valid_from,
            valid_to,
            cert_path: self.ctx.config.domain_dir(domain),
        })
    }

    /// Validity window of the freshly issued certificate, read back from
    /// disk. Falls back to the CA's default 90-day lifetime when the file
    /// cannot be parsed.
    async fn read_window(&self, domain: &str) -> (DateTime<Utc>, DateTime<Utc>) {
        if let Some(window) = self.inspector.validity_window(domain).await {
            return window;
        }
        log::debug!("Could not read issued certificate for {domain}, assuming 90-day lifetime");
        let now = Utc::now();
        (now, now + Duration::days(90))
    }

    /// Key material is a secret: owner read/write only.
    #[cfg(unix)]
    async fn restrict_permissions(&self, domain: &str) {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.ctx.config.domain_dir(domain);
        for name in ["cert.pem", "privkey.pem", "fullchain.pem"] {
            let path = dir.join(name);
            if !path.exists() {
                continue;
            }
            if let Err(e) =
                tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await
            {
                log::warn!("Failed to restrict permissions on {}: {e}", path.display());
            }
        }
    }

    #[cfg(not(unix))]
    async fn restrict_permissions(&self, _domain: &str) {}

    fn ensure_agent_installed(&self) -> CoreResult<()> {
        if self.ctx.config.acme_sh().exists() {
            Ok(())
        } else {
            Err(CoreError::AgentNotInstalled)
        }
    }

    async fn domain_lock(&self, domain: &str) -> Arc<Mutex<()>> {
        self.domain_locks
            .lock()
            .await
            .entry(domain.to_string())
            .or_default()
            .clone()
    }
}
