//! 测试辅助模块
//!
//! Mock collaborators and factory helpers shared by the service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::{Mutex, RwLock};

use cert_orchestrator_provider::ProviderId;

use crate::config::CertConfig;
use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::{CommandSpec, DomainRepository, ProcessOutput, ProcessRunner};
use crate::types::DomainRecord;

// ===== MockDomainRepository =====

pub struct MockDomainRepository {
    records: RwLock<HashMap<String, DomainRecord>>,
    /// Returned by scans but invisible to `find_by_name` — simulates a
    /// record deleted between scan and action.
    phantoms: RwLock<Vec<DomainRecord>>,
    /// If Some, `save` returns this error.
    save_error: RwLock<Option<String>>,
}

impl MockDomainRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            phantoms: RwLock::new(Vec::new()),
            save_error: RwLock::new(None),
        }
    }

    pub async fn insert(&self, record: DomainRecord) {
        self.records
            .write()
            .await
            .insert(record.domain.clone(), record);
    }

    pub async fn insert_phantom(&self, record: DomainRecord) {
        self.phantoms.write().await.push(record);
    }

    pub async fn set_save_error(&self, err: Option<String>) {
        *self.save_error.write().await = err;
    }

    pub async fn get(&self, domain: &str) -> Option<DomainRecord> {
        self.records.read().await.get(domain).cloned()
    }
}

#[async_trait]
impl DomainRepository for MockDomainRepository {
    async fn find_all(&self) -> CoreResult<Vec<DomainRecord>> {
        let mut all: Vec<DomainRecord> = self.records.read().await.values().cloned().collect();
        all.extend(self.phantoms.read().await.iter().cloned());
        Ok(all)
    }

    async fn find_by_name(&self, domain: &str) -> CoreResult<Option<DomainRecord>> {
        Ok(self.records.read().await.get(domain).cloned())
    }

    async fn find_auto_renew(&self) -> CoreResult<Vec<DomainRecord>> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|r| r.auto_renew)
            .collect())
    }

    async fn save(&self, record: &DomainRecord) -> CoreResult<()> {
        if let Some(ref msg) = *self.save_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        self.records
            .write()
            .await
            .insert(record.domain.clone(), record.clone());
        Ok(())
    }
}

// ===== ScriptedProcessRunner =====

/// One recorded external command invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

/// Records every invocation and replays scripted outcomes by label.
/// Unscripted invocations succeed with empty output.
pub struct ScriptedProcessRunner {
    scripts: Mutex<HashMap<String, VecDeque<CoreResult<ProcessOutput>>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedProcessRunner {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues the next outcome for invocations with this label.
    pub async fn script(&self, label: &str, outcome: CoreResult<ProcessOutput>) {
        self.scripts
            .lock()
            .await
            .entry(label.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Makes invocations with this label take `delay` before completing.
    pub async fn set_delay(&self, label: &str, delay: Duration) {
        self.delays.lock().await.insert(label.to_string(), delay);
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_labels(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|c| c.label.clone()).collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedProcessRunner {
    async fn run(&self, spec: CommandSpec) -> CoreResult<ProcessOutput> {
        if let Some(delay) = self.delays.lock().await.get(&spec.label).copied() {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().await.push(RecordedCall {
            label: spec.label.clone(),
            program: spec.program.to_string_lossy().into_owned(),
            args: spec.args,
            env: spec.env,
        });

        if let Some(queue) = self.scripts.lock().await.get_mut(&spec.label) {
            if let Some(outcome) = queue.pop_front() {
                return outcome;
            }
        }
        Ok(ProcessOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

// ===== Factories =====

/// Context rooted in a temp directory, with a fake agent script present and
/// an empty mock repository.
pub fn test_context(runner: Arc<ScriptedProcessRunner>) -> (Arc<ServiceContext>, tempfile::TempDir) {
    test_context_with_repo(runner, Arc::new(MockDomainRepository::new()))
}

/// Context rooted in a temp directory with the given repository.
pub fn test_context_with_repo(
    runner: Arc<ScriptedProcessRunner>,
    repo: Arc<MockDomainRepository>,
) -> (Arc<ServiceContext>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = CertConfig {
        certs_dir: dir.path().join("certs"),
        acme_home: dir.path().join("acme"),
        ..CertConfig::default()
    };
    std::fs::create_dir_all(&config.certs_dir).unwrap();
    std::fs::create_dir_all(&config.acme_home).unwrap();
    std::fs::write(config.acme_sh(), "#!/bin/sh\n").unwrap();

    let ctx = Arc::new(ServiceContext::new(config, repo, runner));
    (ctx, dir)
}

/// A standalone auto-renew record; when `valid_to` is given the matching
/// `valid_from` sits 90 days earlier.
pub fn domain_record(domain: &str, valid_to: Option<DateTime<Utc>>) -> DomainRecord {
    let mut record = DomainRecord::new(domain, "ops@example.com", ProviderId::Standalone);
    if let Some(to) = valid_to {
        record.cert_valid_from = Some(to - ChronoDuration::days(90));
        record.cert_valid_to = Some(to);
    }
    record
}

/// Builds a credential map from key/value pairs.
pub fn creds(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
