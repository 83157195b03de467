//! Validation provider catalog for cert-orchestrator.
//!
//! A self-contained library describing the fixed set of supported domain
//! validation providers:
//! - DNS API providers (Cloudflare, Aliyun, DNSPod, GoDaddy), validated via
//!   a DNS-01 style record published through the provider's API
//! - Standalone mode, validated by answering the CA's HTTP request on the
//!   shared well-known port
//!
//! Each provider declares the credential fields the external ACME agent
//! expects in its environment, together with human-readable labels for UI
//! rendering. [`validate_credentials`] checks a flat credential map against
//! a chosen provider before anything is spawned.

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{all_providers, validate_credentials};
pub use error::CredentialValidationError;
pub use types::{ChallengeType, CredentialField, ProviderDescriptor, ProviderId};
