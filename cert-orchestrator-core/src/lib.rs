//! Cert Orchestrator Core Library
//!
//! Provides the certificate lifecycle logic for the surrounding product:
//! - Issuance and renewal through an external ACME agent (Challenge Engine)
//! - Exclusive use of the validation port during standalone challenges
//! - A periodic renewal scanner for certificates nearing expiry
//! - On-disk certificate inspection
//!
//! This library is platform-independent: the persistence layer and the
//! subprocess layer are abstracted through traits, and the platform wires
//! its implementations into a [`ServiceContext`] at startup.

pub mod config;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::CertConfig;
pub use error::{CoreError, CoreResult};
pub use services::{
    AcmeAgentService, CertificateInspector, ChallengeEngine, RenewalScheduler, ServiceContext,
    WebServerCoordinator,
};
pub use traits::{DomainRepository, ProcessRunner, TokioProcessRunner};
