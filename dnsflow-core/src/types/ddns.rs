//! DDNS types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dnsflow_provider::RecordType;

/// Whether the scheduler drives a configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DdnsMode {
    #[default]
    Auto,
    /// Only updated on explicit request
    Manual,
}

impl DdnsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DdnsStatus {
    Success,
    Failed,
}

impl DdnsStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Keeps one A/AAAA record pointed at this host's public address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DdnsConfig {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    /// Fully qualified name, equal to or below the domain
    pub subdomain: String,
    /// A or AAAA
    pub record_type: RecordType,
    pub interval_secs: u64,
    pub mode: DdnsMode,
    pub enabled: bool,
    pub last_ip: Option<String>,
    pub last_update_at: Option<DateTime<Utc>>,
    pub last_status: Option<DdnsStatus>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DdnsConfig {
    /// Whether the interval has elapsed since the last successful update.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.last_update_at.is_none_or(|last| {
            let elapsed = now.signed_duration_since(last).num_seconds();
            elapsed < 0 || elapsed.unsigned_abs() >= self.interval_secs
        })
    }

    pub fn is_scheduled(&self) -> bool {
        self.enabled && self.mode == DdnsMode::Auto
    }
}

/// Append-only audit entry for one update attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DdnsLog {
    pub id: String,
    pub config_id: String,
    pub old_ip: Option<String>,
    pub new_ip: Option<String>,
    pub status: DdnsStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDdnsRequest {
    pub name: String,
    pub domain_id: String,
    pub subdomain: String,
    pub record_type: RecordType,
    pub interval_secs: u64,
    #[serde(default)]
    pub mode: DdnsMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDdnsRequest {
    pub name: Option<String>,
    pub interval_secs: Option<u64>,
    pub mode: Option<DdnsMode>,
    pub enabled: Option<bool>,
}

/// Outcome of one update cycle. Failures are values, not errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DdnsUpdateResult {
    pub config_id: String,
    pub status: DdnsStatus,
    /// Whether the remote record was touched
    pub changed: bool,
    pub old_ip: Option<String>,
    pub new_ip: Option<String>,
    pub message: String,
}

impl DdnsUpdateResult {
    pub fn is_success(&self) -> bool {
        self.status == DdnsStatus::Success
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DdnsBatchResult {
    pub success_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
}

/// DDNS overview over the configurations and the last day of updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DdnsSummary {
    pub total_configs: usize,
    pub enabled_configs: usize,
    pub disabled_configs: usize,
    /// Successful updates in the window
    pub recent_updates: usize,
    pub recent_failures: usize,
    pub window_start: DateTime<Utc>,
    pub checked_at: DateTime<Utc>,
}
