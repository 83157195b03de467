//! Installation state and installation of the external ACME agent.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::CommandSpec;
use crate::types::AcmeAgentStatus;

const INSTALLER_URL: &str = "https://get.acme.sh";
const INSTALLER_PATH: &str = "/tmp/acme_install.sh";
const VERSION_TIMEOUT: Duration = Duration::from_secs(5);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Reports and manages the external ACME agent installation.
pub struct AcmeAgentService {
    ctx: Arc<ServiceContext>,
}

impl AcmeAgentService {
    /// Creates the service.
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Current installation state, including the reported version when the
    /// agent is present.
    pub async fn status(&self) -> AcmeAgentStatus {
        let path = self.ctx.config.acme_sh();
        if !path.exists() {
            return AcmeAgentStatus {
                installed: false,
                version: None,
                agent_path: None,
            };
        }
        AcmeAgentStatus {
            installed: true,
            version: self.version().await,
            agent_path: Some(path),
        }
    }

    /// Installs the agent by downloading and running the vendor installer.
    pub async fn install(&self) -> CoreResult<AcmeAgentStatus> {
        log::info!("Installing ACME agent from {INSTALLER_URL}");

        let download = CommandSpec::new("curl", "download agent installer", DOWNLOAD_TIMEOUT)
            .args(["-fsSL", INSTALLER_URL, "-o", INSTALLER_PATH]);
        let output = self.ctx.process_runner.run(download).await?;
        if !output.success() {
            return Err(CoreError::ProcessFailed {
                phase: "download agent installer".to_string(),
                exit_code: output.exit_code,
                detail: output.diagnostic().to_string(),
            });
        }

        let install = CommandSpec::new("sh", "run agent installer", INSTALL_TIMEOUT)
            .arg(INSTALLER_PATH);
        let output = self.ctx.process_runner.run(install).await?;
        if !output.success() {
            return Err(CoreError::ProcessFailed {
                phase: "run agent installer".to_string(),
                exit_code: output.exit_code,
                detail: output.diagnostic().to_string(),
            });
        }

        log::info!("ACME agent installed");
        Ok(self.status().await)
    }

    /// The agent's reported version (e.g. `v3.0.7`), when it can report one.
    async fn version(&self) -> Option<String> {
        let spec = CommandSpec::new(self.ctx.config.acme_sh(), "agent version", VERSION_TIMEOUT)
            .arg("--version");
        match self.ctx.process_runner.run(spec).await {
            Ok(output) if output.success() => {
                // last line of e.g. "https://github.com/acmesh-official/acme.sh\nv3.0.7"
                output
                    .stdout
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(ToString::to_string)
            }
            Ok(output) => {
                log::warn!("Agent version probe exited {}", output.exit_code);
                None
            }
            Err(e) => {
                log::warn!("Agent version probe failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_context, ScriptedProcessRunner};
    use crate::traits::ProcessOutput;

    #[tokio::test]
    async fn status_reports_missing_agent_without_spawning() {
        let runner = Arc::new(ScriptedProcessRunner::new());
        let (ctx, _dir) = test_context(runner.clone());
        std::fs::remove_file(ctx.config.acme_sh()).unwrap();

        let status = AcmeAgentService::new(ctx).status().await;
        assert!(!status.installed);
        assert!(status.version.is_none());
        assert!(runner.call_labels().await.is_empty());
    }

    #[tokio::test]
    async fn status_reports_version_from_last_output_line() {
        let runner = Arc::new(ScriptedProcessRunner::new());
        let (ctx, _dir) = test_context(runner.clone());
        runner
            .script(
                "agent version",
                Ok(ProcessOutput {
                    exit_code: 0,
                    stdout: "https://github.com/acmesh-official/acme.sh\nv3.0.7\n".to_string(),
                    stderr: String::new(),
                }),
            )
            .await;

        let status = AcmeAgentService::new(ctx).status().await;
        assert!(status.installed);
        assert_eq!(status.version.as_deref(), Some("v3.0.7"));
        assert!(status.agent_path.unwrap().ends_with("acme.sh"));
    }

    #[tokio::test]
    async fn failed_download_surfaces_diagnostics() {
        let runner = Arc::new(ScriptedProcessRunner::new());
        let (ctx, _dir) = test_context(runner.clone());
        runner
            .script(
                "download agent installer",
                Ok(ProcessOutput {
                    exit_code: 22,
                    stdout: String::new(),
                    stderr: "curl: (22) The requested URL returned error: 503".to_string(),
                }),
            )
            .await;

        let err = AcmeAgentService::new(ctx).install().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::ProcessFailed { exit_code: 22, ref detail, .. } if detail.contains("503")
        ));
        // the installer itself never ran
        assert_eq!(
            runner.call_labels().await,
            vec!["download agent installer"]
        );
    }

    #[tokio::test]
    async fn install_runs_downloader_then_installer() {
        let runner = Arc::new(ScriptedProcessRunner::new());
        let (ctx, _dir) = test_context(runner.clone());
        runner
            .script(
                "agent version",
                Ok(ProcessOutput {
                    exit_code: 0,
                    stdout: "v3.0.7".to_string(),
                    stderr: String::new(),
                }),
            )
            .await;

        let status = AcmeAgentService::new(ctx).install().await.unwrap();
        assert!(status.installed);
        assert_eq!(status.version.as_deref(), Some("v3.0.7"));
        assert_eq!(
            runner.call_labels().await,
            vec!["download agent installer", "run agent installer", "agent version"]
        );
    }
}
