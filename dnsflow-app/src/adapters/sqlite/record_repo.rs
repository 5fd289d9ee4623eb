//! `RecordRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use dnsflow_core::error::{CoreError, CoreResult};
use dnsflow_core::traits::RecordRepository;
use dnsflow_core::types::{Record, RecordKey, RecordType};

use super::entity::record;
use super::{parse_enum, parse_time, storage_err, SqliteStore};

impl record::Model {
    fn into_record(self) -> CoreResult<Record> {
        let ttl = u32::try_from(self.ttl)
            .map_err(|_| CoreError::SerializationError(format!("Invalid ttl: {}", self.ttl)))?;
        let priority = self
            .priority
            .map(u16::try_from)
            .transpose()
            .map_err(|e| CoreError::SerializationError(format!("Invalid priority: {e}")))?;

        Ok(Record {
            record_type: parse_enum(&self.record_type, "record_type", RecordType::parse)?,
            created_at: parse_time(&self.created_at, "created_at")?,
            updated_at: parse_time(&self.updated_at, "updated_at")?,
            ttl,
            priority,
            id: self.id,
            domain_id: self.domain_id,
            name: self.name,
            value: self.value,
            enabled: self.enabled,
            external_id: self.external_id,
        })
    }
}

fn record_to_active_model(r: &Record) -> CoreResult<record::ActiveModel> {
    let ttl = i32::try_from(r.ttl)
        .map_err(|_| CoreError::ValidationError(format!("TTL out of range: {}", r.ttl)))?;

    Ok(record::ActiveModel {
        id: Set(r.id.clone()),
        domain_id: Set(r.domain_id.clone()),
        name: Set(r.name.clone()),
        record_type: Set(r.record_type.as_str().to_string()),
        value: Set(r.value.clone()),
        ttl: Set(ttl),
        priority: Set(r.priority.map(i32::from)),
        enabled: Set(r.enabled),
        external_id: Set(r.external_id.clone()),
        created_at: Set(r.created_at.to_rfc3339()),
        updated_at: Set(r.updated_at.to_rfc3339()),
    })
}

#[async_trait]
impl RecordRepository for SqliteStore {
    async fn find_by_domain(&self, domain_id: &str) -> CoreResult<Vec<Record>> {
        let rows = record::Entity::find()
            .filter(record::Column::DomainId.eq(domain_id))
            .order_by_asc(record::Column::Name)
            .order_by_asc(record::Column::RecordType)
            .all(&self.db)
            .await
            .map_err(storage_err("query records"))?;

        rows.into_iter().map(record::Model::into_record).collect()
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Record>> {
        let row = record::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage_err("query record"))?;

        row.map(record::Model::into_record).transpose()
    }

    async fn find_by_key(&self, domain_id: &str, key: &RecordKey) -> CoreResult<Option<Record>> {
        let row = record::Entity::find()
            .filter(record::Column::DomainId.eq(domain_id))
            .filter(record::Column::Name.eq(key.name.as_str()))
            .filter(record::Column::RecordType.eq(key.record_type.as_str()))
            .order_by_asc(record::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(storage_err("query record"))?;

        row.map(record::Model::into_record).transpose()
    }

    async fn save(&self, record: &Record) -> CoreResult<()> {
        record::Entity::insert(record_to_active_model(record)?)
            .on_conflict(
                OnConflict::column(record::Column::Id)
                    .update_columns([
                        record::Column::Name,
                        record::Column::RecordType,
                        record::Column::Value,
                        record::Column::Ttl,
                        record::Column::Priority,
                        record::Column::Enabled,
                        record::Column::ExternalId,
                        record::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_err("save record"))?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        let result = record::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(storage_err("delete record"))?;

        if result.rows_affected == 0 {
            return Err(CoreError::RecordNotFound(id.to_string()));
        }
        Ok(())
    }
}
