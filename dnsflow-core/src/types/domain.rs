//! Domain (zone) types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A DNS zone owned by exactly one provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    pub id: String,
    /// Zone name, lowercase, no trailing dot
    pub name: String,
    pub provider_id: String,
    /// Raw vendor zone status from the last sync
    pub status: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
