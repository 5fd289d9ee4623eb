//! Record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dnsflow_provider::{RecordInput, RecordType};

use crate::utils::domain_name::normalize_record_name;

/// TTL bounds accepted for manual and DDNS-managed records.
pub const MIN_TTL: u32 = 1;
pub const MAX_TTL: u32 = 86_400;

/// Reconciliation identity of a record within its domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub name: String,
    pub record_type: RecordType,
}

impl RecordKey {
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            name: normalize_record_name(name),
            record_type,
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.record_type)
    }
}

/// Local copy of a DNS record.
///
/// A record without `external_id` has never been confirmed by its provider
/// and cannot be updated or deleted remotely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub domain_id: String,
    /// Relative name, `@` for the apex
    pub name: String,
    pub record_type: RecordType,
    /// Multi-value answers joined with `dnsflow_provider::MULTI_VALUE_SEPARATOR`
    pub value: String,
    pub ttl: u32,
    /// MX only
    pub priority: Option<u16>,
    pub enabled: bool,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.name, self.record_type)
    }

    /// Payload for provider create/update calls.
    pub fn to_input(&self) -> RecordInput {
        RecordInput::new(&self.name, self.record_type, &self.value)
            .with_ttl(self.ttl)
            .with_priority(self.priority)
    }
}

/// Manual record creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    pub domain_id: String,
    pub name: String,
    pub record_type: RecordType,
    pub value: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    pub priority: Option<u16>,
}

/// Manual record update request; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecordRequest {
    pub value: Option<String>,
    pub ttl: Option<u32>,
    pub priority: Option<u16>,
    pub enabled: Option<bool>,
}

fn default_ttl() -> u32 {
    600
}
