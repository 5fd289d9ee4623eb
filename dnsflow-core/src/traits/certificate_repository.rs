//! Certificate persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::Certificate;

#[async_trait]
pub trait CertificateRepository: Send + Sync {
    async fn find_all(&self) -> CoreResult<Vec<Certificate>>;

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Certificate>>;

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Certificate>>;

    async fn save(&self, certificate: &Certificate) -> CoreResult<()>;

    async fn delete(&self, id: &str) -> CoreResult<()>;
}
