use serde::{Deserialize, Serialize};

/// Identifies a supported validation provider.
///
/// This is a closed set: adding a provider means adding a variant here and a
/// descriptor arm in [`ProviderId::descriptor`](crate::catalog).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Cloudflare DNS API.
    Cloudflare,
    /// Aliyun DNS API.
    Aliyun,
    /// Tencent Cloud `DNSPod` API.
    Dnspod,
    /// `GoDaddy` DNS API.
    Godaddy,
    /// Standalone HTTP validation on the shared port. No credentials.
    Standalone,
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloudflare => write!(f, "cloudflare"),
            Self::Aliyun => write!(f, "aliyun"),
            Self::Dnspod => write!(f, "dnspod"),
            Self::Godaddy => write!(f, "godaddy"),
            Self::Standalone => write!(f, "standalone"),
        }
    }
}

impl std::str::FromStr for ProviderId {
    type Err = crate::error::CredentialValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cloudflare" => Ok(Self::Cloudflare),
            "aliyun" => Ok(Self::Aliyun),
            "dnspod" => Ok(Self::Dnspod),
            "godaddy" => Ok(Self::Godaddy),
            "standalone" => Ok(Self::Standalone),
            other => Err(crate::error::CredentialValidationError::UnknownProvider(
                other.to_string(),
            )),
        }
    }
}

/// How a provider proves control of the domain to the CA.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChallengeType {
    /// HTTP validation answered directly on the shared port. Requires
    /// temporary exclusive use of that port.
    Standalone,
    /// DNS record published through the provider's API.
    Dns {
        /// ACME agent DNS hook name (e.g. `dns_cf`), passed as `--dns <hook>`.
        hook: String,
    },
}

impl ChallengeType {
    /// Whether this challenge needs exclusive use of the validation port.
    #[must_use]
    pub const fn is_standalone(&self) -> bool {
        matches!(self, Self::Standalone)
    }

    /// The agent DNS hook name, if this is a DNS challenge.
    #[must_use]
    pub fn dns_hook(&self) -> Option<&str> {
        match self {
            Self::Standalone => None,
            Self::Dns { hook } => Some(hook),
        }
    }
}

/// A credential field a provider requires, with its UI label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialField {
    /// Environment variable name the ACME agent expects (e.g. `CF_Key`).
    pub key: String,
    /// Human-readable label for configuration UIs.
    pub label: String,
}

impl CredentialField {
    pub(crate) fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Static metadata describing a validation provider.
///
/// Obtain via [`ProviderId::descriptor`] or [`all_providers`](crate::all_providers).
///
/// # Invariant
///
/// A descriptor whose challenge is [`ChallengeType::Standalone`] declares no
/// required credential fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderId,
    /// Human-readable provider name.
    pub display_name: String,
    /// Challenge strategy this provider uses.
    pub challenge: ChallengeType,
    /// Credential fields required by the ACME agent, in declaration order.
    pub required_fields: Vec<CredentialField>,
}
