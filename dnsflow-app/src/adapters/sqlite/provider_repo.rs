//! `ProviderRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use dnsflow_core::error::{CoreError, CoreResult};
use dnsflow_core::traits::ProviderRepository;
use dnsflow_core::types::{Provider, ProviderStatus, ProviderType};

use super::entity::provider;
use super::{parse_enum, parse_opt_time, parse_time, storage_err, SqliteStore};

impl provider::Model {
    /// Convert a `SeaORM` row model into a domain `Provider`.
    fn into_provider(self) -> CoreResult<Provider> {
        let provider_type: ProviderType = self
            .provider_type
            .parse()
            .map_err(|e| CoreError::SerializationError(format!("Invalid provider_type: {e}")))?;

        Ok(Provider {
            provider_type,
            status: parse_enum(&self.status, "status", ProviderStatus::parse)?,
            last_test_at: parse_opt_time(self.last_test_at.as_deref(), "last_test_at")?,
            created_at: parse_time(&self.created_at, "created_at")?,
            updated_at: parse_time(&self.updated_at, "updated_at")?,
            id: self.id,
            name: self.name,
            access_key: self.access_key,
            secret_key: self.secret_key,
            region: self.region,
            enabled: self.enabled,
            last_error: self.last_error,
        })
    }
}

fn provider_to_active_model(p: &Provider) -> provider::ActiveModel {
    provider::ActiveModel {
        id: Set(p.id.clone()),
        name: Set(p.name.clone()),
        provider_type: Set(p.provider_type.as_str().to_string()),
        access_key: Set(p.access_key.clone()),
        secret_key: Set(p.secret_key.clone()),
        region: Set(p.region.clone()),
        enabled: Set(p.enabled),
        status: Set(p.status.as_str().to_string()),
        last_error: Set(p.last_error.clone()),
        last_test_at: Set(p.last_test_at.map(|t| t.to_rfc3339())),
        created_at: Set(p.created_at.to_rfc3339()),
        updated_at: Set(p.updated_at.to_rfc3339()),
    }
}

#[async_trait]
impl ProviderRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Provider>> {
        let rows = provider::Entity::find()
            .order_by_asc(provider::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(storage_err("query providers"))?;

        rows.into_iter().map(provider::Model::into_provider).collect()
    }

    async fn find_enabled(&self) -> CoreResult<Vec<Provider>> {
        let rows = provider::Entity::find()
            .filter(provider::Column::Enabled.eq(true))
            .order_by_asc(provider::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(storage_err("query providers"))?;

        rows.into_iter().map(provider::Model::into_provider).collect()
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Provider>> {
        let row = provider::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage_err("query provider"))?;

        row.map(provider::Model::into_provider).transpose()
    }

    async fn save(&self, provider: &Provider) -> CoreResult<()> {
        provider::Entity::insert(provider_to_active_model(provider))
            .on_conflict(
                OnConflict::column(provider::Column::Id)
                    .update_columns([
                        provider::Column::Name,
                        provider::Column::AccessKey,
                        provider::Column::SecretKey,
                        provider::Column::Region,
                        provider::Column::Enabled,
                        provider::Column::Status,
                        provider::Column::LastError,
                        provider::Column::LastTestAt,
                        provider::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_err("save provider"))?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        let result = provider::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(storage_err("delete provider"))?;

        if result.rows_affected == 0 {
            return Err(CoreError::ProviderNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        status: ProviderStatus,
        error: Option<String>,
        tested_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let exists = provider::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage_err("query provider"))?
            .is_some();
        if !exists {
            return Err(CoreError::ProviderNotFound(id.to_string()));
        }

        let active = provider::ActiveModel {
            id: Set(id.to_string()),
            status: Set(status.as_str().to_string()),
            last_error: Set(error),
            last_test_at: Set(Some(tested_at.to_rfc3339())),
            ..Default::default()
        };
        active
            .update(&self.db)
            .await
            .map_err(storage_err("update provider status"))?;
        Ok(())
    }
}
