//! DDNS configuration and log persistence abstract Trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::{DdnsConfig, DdnsLog};

#[async_trait]
pub trait DdnsRepository: Send + Sync {
    async fn find_all(&self) -> CoreResult<Vec<DdnsConfig>>;

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DdnsConfig>>;

    async fn save(&self, config: &DdnsConfig) -> CoreResult<()>;

    /// Removes the configuration together with its log
    async fn delete(&self, id: &str) -> CoreResult<()>;

    /// Logs are never mutated after this call
    async fn append_log(&self, log: &DdnsLog) -> CoreResult<()>;

    /// Newest first
    async fn find_logs(&self, config_id: &str, limit: usize) -> CoreResult<Vec<DdnsLog>>;

    /// Logs of every configuration written at or after `since`, newest first
    async fn find_logs_since(&self, since: DateTime<Utc>) -> CoreResult<Vec<DdnsLog>>;
}
