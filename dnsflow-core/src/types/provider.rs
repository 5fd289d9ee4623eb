//! Provider (configured vendor account) types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use dnsflow_provider::log_sanitizer::redact_secret;
use dnsflow_provider::{ProviderCredentials, ProviderType};

use crate::error::CoreResult;

/// Last known connectivity of a provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Never tested
    #[default]
    Unknown,
    Connected,
    /// Last test or sync failed, see `last_error`
    Failed,
}

impl ProviderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Self::Unknown),
            "connected" => Some(Self::Connected),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

fn redacted<S: Serializer>(secret: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&redact_secret(secret))
}

/// A configured DNS vendor account.
///
/// Serializing never exposes the secret; the access key is masked.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub provider_type: ProviderType,
    #[serde(serialize_with = "redacted")]
    pub access_key: String,
    #[serde(skip_serializing, default)]
    pub secret_key: String,
    pub region: Option<String>,
    pub enabled: bool,
    pub status: ProviderStatus,
    pub last_error: Option<String>,
    pub last_test_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    /// Credentials for the provider factory.
    pub fn credentials(&self) -> CoreResult<ProviderCredentials> {
        Ok(ProviderCredentials::from_parts(
            self.provider_type,
            &self.access_key,
            &self.secret_key,
        )?)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("provider_type", &self.provider_type)
            .field("access_key", &redact_secret(&self.access_key))
            .field("region", &self.region)
            .field("enabled", &self.enabled)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Create provider request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProviderRequest {
    pub name: String,
    pub provider_type: ProviderType,
    /// Unused by Cloudflare
    #[serde(default)]
    pub access_key: String,
    pub secret_key: String,
    pub region: Option<String>,
}

/// Update provider request; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProviderRequest {
    pub name: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
    pub enabled: Option<bool>,
}

impl UpdateProviderRequest {
    /// Whether applying this request changes how the client authenticates.
    pub fn changes_credentials(&self) -> bool {
        self.access_key.is_some() || self.secret_key.is_some() || self.region.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Provider {
        let now = Utc::now();
        Provider {
            id: "p1".into(),
            name: "prod".into(),
            provider_type: ProviderType::Aliyun,
            access_key: "LTAI5tAbCdEfGh".into(),
            secret_key: "very-secret-value".into(),
            region: None,
            enabled: true,
            status: ProviderStatus::Unknown,
            last_error: None,
            last_test_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn serialization_hides_secrets() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("very-secret-value"));
        assert!(!json.contains("LTAI5tAbCdEfGh"));
        assert!(json.contains("LTAI****"));
    }

    #[test]
    fn debug_hides_secrets() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("very-secret-value"));
    }

    #[test]
    fn builds_vendor_credentials() {
        let creds = sample().credentials().unwrap();
        assert_eq!(creds.provider_type(), ProviderType::Aliyun);
    }
}
