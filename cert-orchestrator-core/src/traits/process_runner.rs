//! External command execution with bounded timeouts.
//!
//! Every blocking interaction with the outside world (the ACME agent, the
//! inspection command, web-service control) goes through [`ProcessRunner`],
//! so services can be tested against a scripted implementation and secrets
//! can be injected through the child environment instead of argv, which
//! would leak them into process listings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{CoreError, CoreResult};

/// One external command invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: PathBuf,
    /// Argument vector. Never carries secrets.
    pub args: Vec<String>,
    /// Extra environment variables for the child, on top of the parent's.
    pub env: HashMap<String, String>,
    /// Deadline after which the child is killed.
    pub timeout: Duration,
    /// Operation label used in timeout errors and logs (e.g. `"issue"`).
    pub label: String,
}

impl CommandSpec {
    /// A spec with no argument vector, no env overrides and the given deadline.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, label: &str, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            timeout,
            label: label.to_string(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Merges environment overrides for the child process.
    #[must_use]
    pub fn envs(mut self, env: &HashMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// Captured output of a completed external command.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Process exit code. `-1` when terminated by a signal.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the command exited zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Diagnostic text: stderr, falling back to stdout when stderr is empty.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Runs one external command to completion or cancels it at its deadline.
///
/// No retries at this layer — retry policy belongs to the caller.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Executes the command, capturing both output streams.
    ///
    /// On deadline the child is killed and [`CoreError::ProcessTimedOut`] is
    /// returned; a partial result is never presented as success.
    async fn run(&self, spec: CommandSpec) -> CoreResult<ProcessOutput>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
///
/// On unix each child is made the leader of a fresh process group, and the
/// whole group is signalled at the deadline. `kill_on_drop` alone would
/// reach only the direct child; helper processes the agent forks (the
/// standalone listener in particular) would survive and keep the validation
/// port held.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Creates the runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: CommandSpec) -> CoreResult<ProcessOutput> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // own process group, so the deadline kill reaches grandchildren
        #[cfg(unix)]
        cmd.process_group(0);

        log::debug!(
            "Running {} ({} {:?})",
            spec.label,
            spec.program.display(),
            spec.args
        );

        let child = cmd
            .spawn()
            .map_err(|e| CoreError::Io(format!("failed to spawn {}: {e}", spec.program.display())))?;
        let pid = child.id();

        match timeout(spec.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ProcessOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(e)) => Err(CoreError::Io(format!("{} failed: {e}", spec.label))),
            // The dropped wait future kills the direct child via
            // kill_on_drop; the group kill sweeps up its descendants.
            Err(_) => {
                kill_process_group(pid);
                Err(CoreError::ProcessTimedOut {
                    phase: spec.label,
                    seconds: spec.timeout.as_secs(),
                })
            }
        }
    }
}

/// Force-kills the child's process group. The child is its own group
/// leader, so the pgid equals its pid.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    #[allow(clippy::cast_possible_wrap)]
    let pgid = Pid::from_raw(pid as i32);
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        // ESRCH: the whole group already exited
        log::debug!("Process group {pgid} not signalled: {e}");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = TokioProcessRunner::new();
        let spec = CommandSpec::new("sh", "echo", Duration::from_secs(5))
            .arg("-c")
            .arg("echo hello");
        let output = runner.run(spec).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let runner = TokioProcessRunner::new();
        let spec = CommandSpec::new("sh", "fail", Duration::from_secs(5))
            .arg("-c")
            .arg("echo boom >&2; exit 3");
        let output = runner.run(spec).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.diagnostic(), "boom");
    }

    #[tokio::test]
    async fn diagnostic_falls_back_to_stdout() {
        let output = ProcessOutput {
            exit_code: 1,
            stdout: "stdout detail".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.diagnostic(), "stdout detail");
    }

    #[tokio::test]
    async fn deadline_kills_the_child() {
        let runner = TokioProcessRunner::new();
        let spec = CommandSpec::new("sh", "slow", Duration::from_millis(100))
            .arg("-c")
            .arg("sleep 30");
        let err = runner.run(spec).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::ProcessTimedOut { ref phase, .. } if phase == "slow"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn deadline_kills_grandchildren_too() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let runner = TokioProcessRunner::new();
        // the inner shell is a grandchild; it must not outlive the deadline
        let spec = CommandSpec::new("sh", "tree", Duration::from_millis(200))
            .arg("-c")
            .arg(format!(
                "sh -c 'sleep 1; touch {}' & wait",
                marker.display()
            ));

        let err = runner.run(spec).await.unwrap_err();
        assert!(matches!(err, CoreError::ProcessTimedOut { .. }));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn env_overrides_reach_the_child() {
        let runner = TokioProcessRunner::new();
        let mut env = HashMap::new();
        env.insert("CF_Key".to_string(), "sekrit".to_string());
        let spec = CommandSpec::new("sh", "env probe", Duration::from_secs(5))
            .arg("-c")
            .arg("printf %s \"$CF_Key\"")
            .envs(&env);
        let output = runner.run(spec).await.unwrap();
        assert_eq!(output.stdout, "sekrit");
    }
}
