//! 类型定义模块

mod certificate;
mod domain;

pub use certificate::{AcmeAgentStatus, CertificateMetadata, IssuedCertificate};
pub use domain::{DomainRecord, ExpiringDomain};

// Re-export provider 库的公共类型
pub use cert_orchestrator_provider::{
    all_providers, ChallengeType, CredentialField, CredentialValidationError, ProviderDescriptor,
    ProviderId,
};
