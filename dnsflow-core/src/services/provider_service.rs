//! Provider 管理服务

use std::sync::Arc;

use chrono::Utc;
use dnsflow_provider::create_provider;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{CreateProviderRequest, Provider, ProviderStatus, UpdateProviderRequest};

pub struct ProviderService {
    ctx: Arc<ServiceContext>,
}

impl ProviderService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    pub async fn list_providers(&self) -> CoreResult<Vec<Provider>> {
        self.ctx.provider_repository().find_all().await
    }

    pub async fn get_provider(&self, provider_id: &str) -> CoreResult<Provider> {
        self.ctx.load_provider(provider_id).await
    }

    /// 创建 Provider
    ///
    /// Credentials are checked for shape only; use [`Self::test_connection`]
    /// to verify them against the vendor.
    pub async fn create_provider(&self, request: CreateProviderRequest) -> CoreResult<Provider> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "provider name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let provider = Provider {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            provider_type: request.provider_type,
            access_key: request.access_key.trim().to_string(),
            secret_key: request.secret_key.trim().to_string(),
            region: request.region,
            enabled: true,
            status: ProviderStatus::Unknown,
            last_error: None,
            last_test_at: None,
            created_at: now,
            updated_at: now,
        };

        let client = create_provider(provider.credentials()?)?;
        self.ctx.provider_repository().save(&provider).await?;
        self.ctx
            .provider_registry()
            .register(provider.id.clone(), client)
            .await;

        log::info!(
            "Provider {} ({}) created: {}",
            provider.name,
            provider.provider_type,
            provider.id
        );
        Ok(provider)
    }

    /// 更新 Provider
    ///
    /// A credential change drops the cached client and resets the status.
    pub async fn update_provider(
        &self,
        provider_id: &str,
        request: UpdateProviderRequest,
    ) -> CoreResult<Provider> {
        let mut provider = self.ctx.load_provider(provider_id).await?;
        let credentials_changed = request.changes_credentials();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CoreError::ValidationError(
                    "provider name must not be empty".to_string(),
                ));
            }
            provider.name = name;
        }
        if let Some(access_key) = request.access_key {
            provider.access_key = access_key.trim().to_string();
        }
        if let Some(secret_key) = request.secret_key {
            provider.secret_key = secret_key.trim().to_string();
        }
        if let Some(region) = request.region {
            provider.region = Some(region).filter(|r| !r.trim().is_empty());
        }
        if let Some(enabled) = request.enabled {
            provider.enabled = enabled;
        }

        if credentials_changed {
            // Reject malformed credentials before touching the store.
            provider.credentials()?;
            provider.status = ProviderStatus::Unknown;
            provider.last_error = None;
        }
        provider.updated_at = Utc::now();

        self.ctx.provider_repository().save(&provider).await?;
        if credentials_changed {
            self.ctx.provider_registry().unregister(provider_id).await;
        }
        Ok(provider)
    }

    /// 删除 Provider
    ///
    /// Refused while any domain still belongs to the provider.
    pub async fn delete_provider(&self, provider_id: &str) -> CoreResult<()> {
        let provider = self.ctx.load_provider(provider_id).await?;
        let domains = self
            .ctx
            .domain_repository()
            .find_by_provider(provider_id)
            .await?;
        if !domains.is_empty() {
            return Err(CoreError::Conflict(format!(
                "provider {} still owns {} domain(s)",
                provider.name,
                domains.len()
            )));
        }

        self.ctx.provider_repository().delete(provider_id).await?;
        self.ctx.provider_registry().unregister(provider_id).await;
        log::info!("Provider {} deleted", provider.name);
        Ok(())
    }

    /// 测试连接，并记录 `connected` / `failed`
    pub async fn test_connection(&self, provider_id: &str) -> CoreResult<Provider> {
        let client = self.ctx.get_provider(provider_id).await?;
        match client.test_connection().await {
            Ok(()) => self.ctx.mark_provider_connected(provider_id).await,
            Err(e) => {
                self.ctx
                    .mark_provider_failed(provider_id, &e.to_string())
                    .await;
                return Err(CoreError::Provider(e));
            }
        }
        self.ctx.load_provider(provider_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_domain, add_provider, create_test_context, MockDnsProvider};
    use dnsflow_provider::{ProviderError, ProviderType};

    fn request() -> CreateProviderRequest {
        CreateProviderRequest {
            name: "prod".to_string(),
            provider_type: ProviderType::Aliyun,
            access_key: "LTAI5tAbCdEfGh".to_string(),
            secret_key: "secret".to_string(),
            region: None,
        }
    }

    #[tokio::test]
    async fn create_provider_registers_client() {
        let (ctx, _) = create_test_context();
        let svc = ProviderService::new(ctx.clone());

        let provider = svc.create_provider(request()).await.unwrap();
        assert_eq!(provider.status, ProviderStatus::Unknown);
        assert!(ctx.provider_registry().get(&provider.id).await.is_some());
        assert_eq!(svc.list_providers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_provider_rejects_missing_access_key() {
        let (ctx, _) = create_test_context();
        let svc = ProviderService::new(ctx);
        let mut req = request();
        req.access_key = String::new();

        let err = svc.create_provider(req).await.unwrap_err();
        assert!(matches!(err, CoreError::Provider(ProviderError::InvalidParameter { .. })));
        assert!(svc.list_providers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn credential_change_drops_cached_client() {
        let (ctx, _) = create_test_context();
        let svc = ProviderService::new(ctx.clone());
        let provider = svc.create_provider(request()).await.unwrap();

        let updated = svc
            .update_provider(
                &provider.id,
                UpdateProviderRequest {
                    secret_key: Some("rotated".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.secret_key, "rotated");
        assert!(ctx.provider_registry().get(&provider.id).await.is_none());
    }

    #[tokio::test]
    async fn rename_keeps_cached_client() {
        let (ctx, _) = create_test_context();
        let svc = ProviderService::new(ctx.clone());
        let provider = svc.create_provider(request()).await.unwrap();

        svc.update_provider(
            &provider.id,
            UpdateProviderRequest {
                name: Some("staging".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(ctx.provider_registry().get(&provider.id).await.is_some());
    }

    #[tokio::test]
    async fn delete_refused_while_domains_exist() {
        let (ctx, _) = create_test_context();
        let svc = ProviderService::new(ctx.clone());
        add_provider(&ctx, "p1", Arc::new(MockDnsProvider::new("mock"))).await;
        add_domain(&ctx, "d1", "example.com", "p1").await;

        let err = svc.delete_provider("p1").await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        ctx.domain_repository().delete("d1").await.unwrap();
        svc.delete_provider("p1").await.unwrap();
        assert!(ctx.provider_registry().get("p1").await.is_none());
    }

    #[tokio::test]
    async fn test_connection_records_status() {
        let (ctx, _) = create_test_context();
        let svc = ProviderService::new(ctx.clone());
        let client = Arc::new(MockDnsProvider::new("mock").with_zone("example.com"));
        add_provider(&ctx, "p1", client.clone()).await;

        let provider = svc.test_connection("p1").await.unwrap();
        assert_eq!(provider.status, ProviderStatus::Connected);
        assert!(provider.last_test_at.is_some());

        client.set_failure(Some(ProviderError::InvalidCredentials {
            provider: "mock".to_string(),
            raw_message: None,
        }));
        assert!(svc.test_connection("p1").await.is_err());
        let provider = svc.get_provider("p1").await.unwrap();
        assert_eq!(provider.status, ProviderStatus::Failed);
        assert!(provider.last_error.unwrap().contains("Invalid credentials"));
    }
}
