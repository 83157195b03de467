//! 业务逻辑服务层

mod acme_agent_service;
mod certificate_inspector;
mod challenge_engine;
mod renewal_scheduler;
mod web_server_coordinator;

pub use acme_agent_service::AcmeAgentService;
pub use certificate_inspector::CertificateInspector;
pub use challenge_engine::ChallengeEngine;
pub use renewal_scheduler::{RenewalScheduler, ScanSummary};
pub use web_server_coordinator::WebServerCoordinator;

use std::sync::Arc;

use crate::config::CertConfig;
use crate::traits::{DomainRepository, ProcessRunner};

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储实现。
/// One instance per process, created at startup; no module-level globals.
pub struct ServiceContext {
    /// Runtime configuration
    pub config: CertConfig,
    /// 域名记录仓库
    pub domain_repository: Arc<dyn DomainRepository>,
    /// External command execution
    pub process_runner: Arc<dyn ProcessRunner>,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        config: CertConfig,
        domain_repository: Arc<dyn DomainRepository>,
        process_runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            config,
            domain_repository,
            process_runner,
        }
    }
}
