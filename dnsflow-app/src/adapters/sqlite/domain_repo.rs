//! `DomainRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};

use dnsflow_core::error::CoreResult;
use dnsflow_core::traits::DomainRepository;
use dnsflow_core::types::Domain;

use super::entity::{domain, record};
use super::{parse_opt_time, parse_time, storage_err, SqliteStore};

impl domain::Model {
    fn into_domain(self) -> CoreResult<Domain> {
        Ok(Domain {
            last_synced_at: parse_opt_time(self.last_synced_at.as_deref(), "last_synced_at")?,
            created_at: parse_time(&self.created_at, "created_at")?,
            updated_at: parse_time(&self.updated_at, "updated_at")?,
            id: self.id,
            name: self.name,
            provider_id: self.provider_id,
            status: self.status,
        })
    }
}

fn domain_to_active_model(d: &Domain) -> domain::ActiveModel {
    domain::ActiveModel {
        id: Set(d.id.clone()),
        name: Set(d.name.clone()),
        provider_id: Set(d.provider_id.clone()),
        status: Set(d.status.clone()),
        last_synced_at: Set(d.last_synced_at.map(|t| t.to_rfc3339())),
        created_at: Set(d.created_at.to_rfc3339()),
        updated_at: Set(d.updated_at.to_rfc3339()),
    }
}

#[async_trait]
impl DomainRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Domain>> {
        let rows = domain::Entity::find()
            .order_by_asc(domain::Column::Name)
            .all(&self.db)
            .await
            .map_err(storage_err("query domains"))?;

        rows.into_iter().map(domain::Model::into_domain).collect()
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>> {
        let row = domain::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage_err("query domain"))?;

        row.map(domain::Model::into_domain).transpose()
    }

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Domain>> {
        let row = domain::Entity::find()
            .filter(domain::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(storage_err("query domain"))?;

        row.map(domain::Model::into_domain).transpose()
    }

    async fn find_by_provider(&self, provider_id: &str) -> CoreResult<Vec<Domain>> {
        let rows = domain::Entity::find()
            .filter(domain::Column::ProviderId.eq(provider_id))
            .order_by_asc(domain::Column::Name)
            .all(&self.db)
            .await
            .map_err(storage_err("query domains"))?;

        rows.into_iter().map(domain::Model::into_domain).collect()
    }

    async fn save(&self, domain: &Domain) -> CoreResult<()> {
        domain::Entity::insert(domain_to_active_model(domain))
            .on_conflict(
                OnConflict::column(domain::Column::Id)
                    .update_columns([
                        domain::Column::Name,
                        domain::Column::ProviderId,
                        domain::Column::Status,
                        domain::Column::LastSyncedAt,
                        domain::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_err("save domain"))?;

        Ok(())
    }

    /// Removes the domain together with its records.
    async fn delete(&self, id: &str) -> CoreResult<()> {
        let txn = self.db.begin().await.map_err(storage_err("begin transaction"))?;
        record::Entity::delete_many()
            .filter(record::Column::DomainId.eq(id))
            .exec(&txn)
            .await
            .map_err(storage_err("delete records"))?;
        domain::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(storage_err("delete domain"))?;
        txn.commit().await.map_err(storage_err("commit transaction"))?;
        Ok(())
    }
}
