//! `DdnsRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use dnsflow_core::error::{CoreError, CoreResult};
use dnsflow_core::traits::DdnsRepository;
use dnsflow_core::types::{DdnsConfig, DdnsLog, DdnsMode, DdnsStatus, RecordType};

use super::entity::{ddns_config, ddns_log};
use super::{parse_enum, parse_opt_time, parse_time, storage_err, SqliteStore};

impl ddns_config::Model {
    fn into_config(self) -> CoreResult<DdnsConfig> {
        let interval_secs = u64::try_from(self.interval_secs).map_err(|_| {
            CoreError::SerializationError(format!("Invalid interval_secs: {}", self.interval_secs))
        })?;
        let last_status = self
            .last_status
            .as_deref()
            .map(|s| parse_enum(s, "last_status", DdnsStatus::parse))
            .transpose()?;

        Ok(DdnsConfig {
            record_type: parse_enum(&self.record_type, "record_type", RecordType::parse)?,
            mode: parse_enum(&self.mode, "mode", DdnsMode::parse)?,
            last_update_at: parse_opt_time(self.last_update_at.as_deref(), "last_update_at")?,
            created_at: parse_time(&self.created_at, "created_at")?,
            updated_at: parse_time(&self.updated_at, "updated_at")?,
            interval_secs,
            last_status,
            id: self.id,
            name: self.name,
            domain_id: self.domain_id,
            subdomain: self.subdomain,
            enabled: self.enabled,
            last_ip: self.last_ip,
            last_error: self.last_error,
        })
    }
}

impl ddns_log::Model {
    fn into_log(self) -> CoreResult<DdnsLog> {
        Ok(DdnsLog {
            status: parse_enum(&self.status, "status", DdnsStatus::parse)?,
            created_at: parse_time(&self.created_at, "created_at")?,
            id: self.id,
            config_id: self.config_id,
            old_ip: self.old_ip,
            new_ip: self.new_ip,
            message: self.message,
        })
    }
}

fn config_to_active_model(c: &DdnsConfig) -> CoreResult<ddns_config::ActiveModel> {
    let interval_secs = i64::try_from(c.interval_secs).map_err(|_| {
        CoreError::ValidationError(format!("Interval out of range: {}", c.interval_secs))
    })?;

    Ok(ddns_config::ActiveModel {
        id: Set(c.id.clone()),
        name: Set(c.name.clone()),
        domain_id: Set(c.domain_id.clone()),
        subdomain: Set(c.subdomain.clone()),
        record_type: Set(c.record_type.as_str().to_string()),
        interval_secs: Set(interval_secs),
        mode: Set(c.mode.as_str().to_string()),
        enabled: Set(c.enabled),
        last_ip: Set(c.last_ip.clone()),
        last_update_at: Set(c.last_update_at.map(|t| t.to_rfc3339())),
        last_status: Set(c.last_status.map(|s| s.as_str().to_string())),
        last_error: Set(c.last_error.clone()),
        created_at: Set(c.created_at.to_rfc3339()),
        updated_at: Set(c.updated_at.to_rfc3339()),
    })
}

#[async_trait]
impl DdnsRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<DdnsConfig>> {
        let rows = ddns_config::Entity::find()
            .order_by_asc(ddns_config::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(storage_err("query DDNS configs"))?;

        rows.into_iter().map(ddns_config::Model::into_config).collect()
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DdnsConfig>> {
        let row = ddns_config::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage_err("query DDNS config"))?;

        row.map(ddns_config::Model::into_config).transpose()
    }

    async fn save(&self, config: &DdnsConfig) -> CoreResult<()> {
        ddns_config::Entity::insert(config_to_active_model(config)?)
            .on_conflict(
                OnConflict::column(ddns_config::Column::Id)
                    .update_columns([
                        ddns_config::Column::Name,
                        ddns_config::Column::Subdomain,
                        ddns_config::Column::RecordType,
                        ddns_config::Column::IntervalSecs,
                        ddns_config::Column::Mode,
                        ddns_config::Column::Enabled,
                        ddns_config::Column::LastIp,
                        ddns_config::Column::LastUpdateAt,
                        ddns_config::Column::LastStatus,
                        ddns_config::Column::LastError,
                        ddns_config::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_err("save DDNS config"))?;

        Ok(())
    }

    /// Removes the configuration and its log.
    async fn delete(&self, id: &str) -> CoreResult<()> {
        let txn = self.db.begin().await.map_err(storage_err("begin transaction"))?;
        ddns_log::Entity::delete_many()
            .filter(ddns_log::Column::ConfigId.eq(id))
            .exec(&txn)
            .await
            .map_err(storage_err("delete DDNS logs"))?;
        ddns_config::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(storage_err("delete DDNS config"))?;
        txn.commit().await.map_err(storage_err("commit transaction"))?;
        Ok(())
    }

    async fn append_log(&self, log: &DdnsLog) -> CoreResult<()> {
        let active = ddns_log::ActiveModel {
            seq: NotSet,
            id: Set(log.id.clone()),
            config_id: Set(log.config_id.clone()),
            old_ip: Set(log.old_ip.clone()),
            new_ip: Set(log.new_ip.clone()),
            status: Set(log.status.as_str().to_string()),
            message: Set(log.message.clone()),
            created_at: Set(log.created_at.to_rfc3339()),
        };
        ddns_log::Entity::insert(active)
            .exec(&self.db)
            .await
            .map_err(storage_err("append DDNS log"))?;
        Ok(())
    }

    /// Newest first.
    async fn find_logs(&self, config_id: &str, limit: usize) -> CoreResult<Vec<DdnsLog>> {
        let rows = ddns_log::Entity::find()
            .filter(ddns_log::Column::ConfigId.eq(config_id))
            .order_by_desc(ddns_log::Column::Seq)
            .limit(u64::try_from(limit).unwrap_or(u64::MAX))
            .all(&self.db)
            .await
            .map_err(storage_err("query DDNS logs"))?;

        rows.into_iter().map(ddns_log::Model::into_log).collect()
    }

    async fn find_logs_since(&self, since: DateTime<Utc>) -> CoreResult<Vec<DdnsLog>> {
        // Stored timestamps are RFC 3339 text; the string filter narrows the
        // scan and the parsed time decides.
        let rows = ddns_log::Entity::find()
            .filter(ddns_log::Column::CreatedAt.gte(since.to_rfc3339()))
            .order_by_desc(ddns_log::Column::Seq)
            .all(&self.db)
            .await
            .map_err(storage_err("query recent DDNS logs"))?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in rows {
            let log = row.into_log()?;
            if log.created_at >= since {
                logs.push(log);
            }
        }
        Ok(logs)
    }
}
