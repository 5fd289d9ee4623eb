//! 业务逻辑服务层

mod acme;
mod certificate_service;
mod challenge_hook_service;
mod ddns_service;
mod domain_locks;
mod ip_resolver;
mod propagation;
mod provider_service;
mod record_service;
mod scheduler_service;
mod sync_service;

pub use acme::{AcmeRequest, AcmeRunner, CertbotRunner};
pub use certificate_service::CertificateService;
pub use challenge_hook_service::{ChallengeHookService, ChallengeTarget};
pub use ddns_service::DdnsService;
pub use domain_locks::DomainLocks;
pub use ip_resolver::{is_valid_ipv4, is_valid_ipv6, HttpIpResolver, IpResolver};
pub use propagation::{HickoryTxtResolver, PropagationCheck, TxtResolver};
pub use provider_service::ProviderService;
pub use record_service::RecordService;
pub use scheduler_service::{
    ddns_job_key, SchedulerService, CHECK_CERTIFICATES_JOB, SYNC_DOMAINS_JOB,
};
pub use sync_service::{plan_reconcile, ReconcilePlan, SyncOutcome, SyncReport, SyncService};

use std::sync::Arc;

use chrono::Utc;
use dnsflow_provider::{create_provider, DnsProvider, ProviderError};
use tokio::sync::OwnedMutexGuard;

use crate::error::{CoreError, CoreResult};
use crate::traits::{
    CertificateRepository, DdnsRepository, DomainRepository, ProviderRegistry,
    ProviderRepository, RecordRepository,
};
use crate::types::{Domain, Provider, ProviderStatus};

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储实现。
pub struct ServiceContext {
    provider_repository: Arc<dyn ProviderRepository>,
    domain_repository: Arc<dyn DomainRepository>,
    record_repository: Arc<dyn RecordRepository>,
    ddns_repository: Arc<dyn DdnsRepository>,
    certificate_repository: Arc<dyn CertificateRepository>,
    provider_registry: Arc<dyn ProviderRegistry>,
    domain_locks: DomainLocks,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(
        provider_repository: Arc<dyn ProviderRepository>,
        domain_repository: Arc<dyn DomainRepository>,
        record_repository: Arc<dyn RecordRepository>,
        ddns_repository: Arc<dyn DdnsRepository>,
        certificate_repository: Arc<dyn CertificateRepository>,
        provider_registry: Arc<dyn ProviderRegistry>,
    ) -> Self {
        Self {
            provider_repository,
            domain_repository,
            record_repository,
            ddns_repository,
            certificate_repository,
            provider_registry,
            domain_locks: DomainLocks::new(),
        }
    }

    pub fn provider_repository(&self) -> &Arc<dyn ProviderRepository> {
        &self.provider_repository
    }

    pub fn domain_repository(&self) -> &Arc<dyn DomainRepository> {
        &self.domain_repository
    }

    pub fn record_repository(&self) -> &Arc<dyn RecordRepository> {
        &self.record_repository
    }

    pub fn ddns_repository(&self) -> &Arc<dyn DdnsRepository> {
        &self.ddns_repository
    }

    pub fn certificate_repository(&self) -> &Arc<dyn CertificateRepository> {
        &self.certificate_repository
    }

    pub fn provider_registry(&self) -> &Arc<dyn ProviderRegistry> {
        &self.provider_registry
    }

    /// 锁定域名的本地写入阶段
    pub async fn lock_domain(&self, zone: &str) -> OwnedMutexGuard<()> {
        self.domain_locks.lock(zone).await
    }

    pub async fn load_provider(&self, provider_id: &str) -> CoreResult<Provider> {
        self.provider_repository
            .find_by_id(provider_id)
            .await?
            .ok_or_else(|| CoreError::ProviderNotFound(provider_id.to_string()))
    }

    pub async fn load_domain(&self, domain_id: &str) -> CoreResult<Domain> {
        self.domain_repository
            .find_by_id(domain_id)
            .await?
            .ok_or_else(|| CoreError::DomainNotFound(domain_id.to_string()))
    }

    /// 获取 Provider 实例
    ///
    /// Cached clients are reused; otherwise one is built from the stored
    /// credentials and cached.
    pub async fn get_provider(&self, provider_id: &str) -> CoreResult<Arc<dyn DnsProvider>> {
        if let Some(client) = self.provider_registry.get(provider_id).await {
            return Ok(client);
        }
        let provider = self.load_provider(provider_id).await?;
        let client = create_provider(provider.credentials()?)?;
        self.provider_registry
            .register(provider_id.to_string(), Arc::clone(&client))
            .await;
        Ok(client)
    }

    /// Client for the provider owning `domain`.
    pub async fn client_for_domain(&self, domain: &Domain) -> CoreResult<Arc<dyn DnsProvider>> {
        self.get_provider(&domain.provider_id).await
    }

    pub async fn mark_provider_connected(&self, provider_id: &str) {
        if let Err(e) = self
            .provider_repository
            .update_status(provider_id, ProviderStatus::Connected, None, Utc::now())
            .await
        {
            log::error!("Failed to mark provider {provider_id} as connected: {e}");
        }
    }

    /// 标记 Provider 为失败状态
    pub async fn mark_provider_failed(&self, provider_id: &str, error_msg: &str) {
        if let Err(e) = self
            .provider_repository
            .update_status(
                provider_id,
                ProviderStatus::Failed,
                Some(error_msg.to_string()),
                Utc::now(),
            )
            .await
        {
            log::error!("Failed to mark provider {provider_id} as failed: {e}");
            return;
        }
        log::warn!("Provider {provider_id} marked as failed: {error_msg}");
    }

    /// 处理 Provider 错误，如果是凭证失效则更新 Provider 状态
    pub async fn handle_provider_error(&self, provider_id: &str, err: ProviderError) -> CoreError {
        if matches!(
            err,
            ProviderError::InvalidCredentials { .. } | ProviderError::PermissionDenied { .. }
        ) {
            self.mark_provider_failed(provider_id, &err.to_string()).await;
        }
        if err.is_expected() {
            log::warn!("[{provider_id}] {err}");
        } else {
            log::error!("[{provider_id}] {err}");
        }
        CoreError::Provider(err)
    }
}
