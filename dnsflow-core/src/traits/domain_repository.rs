//! Domain and record persistence abstract Traits

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{Domain, Record, RecordKey};

#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn find_all(&self) -> CoreResult<Vec<Domain>>;

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>>;

    /// Zone names are unique across providers
    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Domain>>;

    async fn find_by_provider(&self, provider_id: &str) -> CoreResult<Vec<Domain>>;

    async fn save(&self, domain: &Domain) -> CoreResult<()>;

    /// Also removes the domain's records
    async fn delete(&self, id: &str) -> CoreResult<()>;
}

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn find_by_domain(&self, domain_id: &str) -> CoreResult<Vec<Record>>;

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Record>>;

    /// Lookup by reconciliation identity
    async fn find_by_key(&self, domain_id: &str, key: &RecordKey) -> CoreResult<Option<Record>>;

    async fn save(&self, record: &Record) -> CoreResult<()>;

    async fn delete(&self, id: &str) -> CoreResult<()>;
}
