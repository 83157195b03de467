//! The fixed provider catalog and credential validation.

use std::collections::HashMap;

use crate::error::CredentialValidationError;
use crate::types::{ChallengeType, CredentialField, ProviderDescriptor, ProviderId};

impl ProviderId {
    /// Build the static descriptor for this provider.
    #[must_use]
    pub fn descriptor(self) -> ProviderDescriptor {
        match self {
            Self::Cloudflare => ProviderDescriptor {
                id: self,
                display_name: "Cloudflare".to_string(),
                challenge: ChallengeType::Dns {
                    hook: "dns_cf".to_string(),
                },
                required_fields: vec![
                    CredentialField::new("CF_Key", "API Key"),
                    CredentialField::new("CF_Email", "Email"),
                ],
            },
            Self::Aliyun => ProviderDescriptor {
                id: self,
                display_name: "Aliyun".to_string(),
                challenge: ChallengeType::Dns {
                    hook: "dns_ali".to_string(),
                },
                required_fields: vec![
                    CredentialField::new("Ali_Key", "Access Key ID"),
                    CredentialField::new("Ali_Secret", "Access Key Secret"),
                ],
            },
            Self::Dnspod => ProviderDescriptor {
                id: self,
                display_name: "DNSPod".to_string(),
                challenge: ChallengeType::Dns {
                    hook: "dns_dp".to_string(),
                },
                required_fields: vec![
                    CredentialField::new("DP_Id", "API ID"),
                    CredentialField::new("DP_Key", "API Key"),
                ],
            },
            Self::Godaddy => ProviderDescriptor {
                id: self,
                display_name: "GoDaddy".to_string(),
                challenge: ChallengeType::Dns {
                    hook: "dns_gd".to_string(),
                },
                required_fields: vec![
                    CredentialField::new("GD_Key", "API Key"),
                    CredentialField::new("GD_Secret", "API Secret"),
                ],
            },
            Self::Standalone => ProviderDescriptor {
                id: self,
                display_name: "Standalone (requires port 80)".to_string(),
                challenge: ChallengeType::Standalone,
                required_fields: Vec::new(),
            },
        }
    }
}

/// Returns descriptors for every supported provider, in catalog order.
///
/// Useful for building dynamic UIs that enumerate available providers and
/// their required credential fields.
#[must_use]
pub fn all_providers() -> Vec<ProviderDescriptor> {
    [
        ProviderId::Cloudflare,
        ProviderId::Aliyun,
        ProviderId::Dnspod,
        ProviderId::Godaddy,
        ProviderId::Standalone,
    ]
    .into_iter()
    .map(ProviderId::descriptor)
    .collect()
}

/// Validates a flat credential map against the chosen provider.
///
/// Standalone requires nothing and always succeeds. DNS providers require
/// every declared field to be present and non-empty; the first offending
/// field (declaration order) is reported so callers remediate one at a time.
pub fn validate_credentials(
    provider: ProviderId,
    credentials: &HashMap<String, String>,
) -> Result<(), CredentialValidationError> {
    for field in provider.descriptor().required_fields {
        match credentials.get(&field.key) {
            None => {
                return Err(CredentialValidationError::MissingField {
                    provider,
                    field: field.key,
                    label: field.label,
                });
            }
            Some(v) if v.trim().is_empty() => {
                return Err(CredentialValidationError::EmptyField {
                    provider,
                    field: field.key,
                    label: field.label,
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}
