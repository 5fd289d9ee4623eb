use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Separator used to fold multi-value answers (e.g. a Huawei Cloud record set
/// with several `records`) into the single `value` string of a record.
///
/// Reading joins with this separator, writing splits on it, so the two
/// directions are inverse of each other.
pub const MULTI_VALUE_SEPARATOR: &str = ",";

/// Supported DNS provider kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Aliyun DNS (RPC API, HMAC-SHA1 signing).
    Aliyun,
    /// Huawei Cloud DNS (SDK-HMAC-SHA256 signing).
    Huaweicloud,
    /// Tencent Cloud `DNSPod` (TC3-HMAC-SHA256 signing).
    Dnspod,
    /// Cloudflare (bearer token).
    Cloudflare,
}

impl ProviderType {
    /// Stable lowercase identifier, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aliyun => "aliyun",
            Self::Huaweicloud => "huaweicloud",
            Self::Dnspod => "dnspod",
            Self::Cloudflare => "cloudflare",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aliyun" => Ok(Self::Aliyun),
            "huaweicloud" | "huawei" => Ok(Self::Huaweicloud),
            "dnspod" | "tencent" => Ok(Self::Dnspod),
            "cloudflare" => Ok(Self::Cloudflare),
            other => Err(ProviderError::InvalidParameter {
                provider: "factory".to_string(),
                param: "provider_type".to_string(),
                detail: format!("unknown provider type: {other}"),
            }),
        }
    }
}

/// DNS record types handled across all providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
}

impl RecordType {
    /// Wire representation used by every vendor API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
        }
    }

    /// Parses a vendor record type, returning `None` for types this crate
    /// does not manage (SOA, SRV, CAA, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Some(Self::A),
            "AAAA" => Some(Self::Aaaa),
            "CNAME" => Some(Self::Cname),
            "MX" => Some(Self::Mx),
            "TXT" => Some(Self::Txt),
            "NS" => Some(Self::Ns),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ProviderError::UnsupportedRecordType {
            provider: "common".to_string(),
            record_type: s.to_string(),
        })
    }
}

/// A zone as reported by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderZone {
    /// Provider-assigned zone identifier.
    pub id: String,
    /// Zone name without trailing dot.
    pub name: String,
    /// Raw vendor status (e.g. `ENABLE`, `ACTIVE`, `active`).
    pub status: String,
    /// Default TTL, when the vendor reports one.
    pub ttl: Option<u32>,
}

/// A record as reported by a provider, normalized across vendors.
///
/// `name` is relative to the zone (`@` for the apex) and never carries a
/// trailing dot. Multi-value answers are joined with [`MULTI_VALUE_SEPARATOR`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderRecord {
    /// Provider-assigned record identifier (the local `external_id`).
    pub id: String,
    pub name: String,
    pub record_type: RecordType,
    pub value: String,
    pub ttl: u32,
    /// MX priority.
    pub priority: Option<u16>,
    /// Raw vendor status.
    pub status: String,
}

/// Record payload for create/update calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordInput {
    /// Relative name (`@` or empty for the zone apex).
    pub name: String,
    pub record_type: RecordType,
    pub value: String,
    pub ttl: u32,
    pub priority: Option<u16>,
}

impl RecordInput {
    pub fn new(name: impl Into<String>, record_type: RecordType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type,
            value: value.into(),
            ttl: 600,
            priority: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Option<u16>) -> Self {
        self.priority = priority;
        self
    }
}

/// Credentials needed to construct a provider client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "provider", content = "credentials")]
pub enum ProviderCredentials {
    /// Aliyun DNS credentials. Requires feature `aliyun`.
    #[cfg(feature = "aliyun")]
    #[serde(rename = "aliyun")]
    Aliyun {
        access_key_id: String,
        access_key_secret: String,
    },

    /// Huawei Cloud DNS credentials. Requires feature `huaweicloud`.
    #[cfg(feature = "huaweicloud")]
    #[serde(rename = "huaweicloud")]
    Huaweicloud {
        access_key_id: String,
        secret_access_key: String,
    },

    /// Tencent Cloud `DNSPod` credentials. Requires feature `dnspod`.
    #[cfg(feature = "dnspod")]
    #[serde(rename = "dnspod")]
    Dnspod {
        secret_id: String,
        secret_key: String,
    },

    /// Cloudflare API token. Requires feature `cloudflare`.
    #[cfg(feature = "cloudflare")]
    #[serde(rename = "cloudflare")]
    Cloudflare { api_token: String },
}

impl ProviderCredentials {
    /// Builds credentials from the generic access/secret pair stored for a
    /// provider. Cloudflare only uses the secret, as its API token.
    pub fn from_parts(
        provider_type: ProviderType,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, ProviderError> {
        let missing = |param: &str| ProviderError::InvalidParameter {
            provider: provider_type.to_string(),
            param: param.to_string(),
            detail: "must not be empty".to_string(),
        };
        if secret_key.trim().is_empty() {
            return Err(missing("secret_key"));
        }
        if provider_type != ProviderType::Cloudflare && access_key.trim().is_empty() {
            return Err(missing("access_key"));
        }

        match provider_type {
            #[cfg(feature = "aliyun")]
            ProviderType::Aliyun => Ok(Self::Aliyun {
                access_key_id: access_key.to_string(),
                access_key_secret: secret_key.to_string(),
            }),
            #[cfg(feature = "huaweicloud")]
            ProviderType::Huaweicloud => Ok(Self::Huaweicloud {
                access_key_id: access_key.to_string(),
                secret_access_key: secret_key.to_string(),
            }),
            #[cfg(feature = "dnspod")]
            ProviderType::Dnspod => Ok(Self::Dnspod {
                secret_id: access_key.to_string(),
                secret_key: secret_key.to_string(),
            }),
            #[cfg(feature = "cloudflare")]
            ProviderType::Cloudflare => Ok(Self::Cloudflare {
                api_token: secret_key.to_string(),
            }),
            #[allow(unreachable_patterns)]
            other => Err(ProviderError::InvalidParameter {
                provider: other.to_string(),
                param: "provider_type".to_string(),
                detail: "provider support not compiled in".to_string(),
            }),
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        match self {
            #[cfg(feature = "aliyun")]
            Self::Aliyun { .. } => ProviderType::Aliyun,
            #[cfg(feature = "huaweicloud")]
            Self::Huaweicloud { .. } => ProviderType::Huaweicloud,
            #[cfg(feature = "dnspod")]
            Self::Dnspod { .. } => ProviderType::Dnspod,
            #[cfg(feature = "cloudflare")]
            Self::Cloudflare { .. } => ProviderType::Cloudflare,
        }
    }
}
