//! Provider persistence abstract Trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreResult;
use crate::types::{Provider, ProviderStatus};

/// Provider Warehouse Trait
///
/// Platform implementation:
/// - CLI / daemon: `SqliteStore` (`SeaORM`)
/// - Tests: `MockStore`
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_all(&self) -> CoreResult<Vec<Provider>>;

    async fn find_enabled(&self) -> CoreResult<Vec<Provider>>;

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Provider>>;

    /// Insert or replace
    async fn save(&self, provider: &Provider) -> CoreResult<()>;

    async fn delete(&self, id: &str) -> CoreResult<()>;

    /// Record the outcome of a connectivity check or sync
    ///
    /// # Arguments
    /// * `id` - Provider ID
    /// * `status` - new status
    /// * `error` - error message (if status is Failed)
    /// * `tested_at` - when the check happened
    async fn update_status(
        &self,
        id: &str,
        status: ProviderStatus,
        error: Option<String>,
        tested_at: DateTime<Utc>,
    ) -> CoreResult<()>;
}
