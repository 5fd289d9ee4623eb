//! DNS 记录管理服务
//!
//! Manual record changes go to the provider first and are persisted locally
//! only once the provider has accepted them.

use std::sync::Arc;

use chrono::Utc;
use dnsflow_provider::RecordType;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{
    CreateRecordRequest, Record, RecordKey, UpdateRecordRequest, MAX_TTL, MIN_TTL,
};
use crate::utils::domain_name::normalize_record_name;

pub struct RecordService {
    ctx: Arc<ServiceContext>,
}

pub(crate) fn validate_ttl(ttl: u32) -> CoreResult<()> {
    if (MIN_TTL..=MAX_TTL).contains(&ttl) {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!(
            "ttl must be between {MIN_TTL} and {MAX_TTL}, got {ttl}"
        )))
    }
}

fn validate_fields(record_type: RecordType, value: &str, priority: Option<u16>) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "record value must not be empty".to_string(),
        ));
    }
    if record_type == RecordType::Mx && priority.is_none() {
        return Err(CoreError::ValidationError(
            "MX records require a priority".to_string(),
        ));
    }
    Ok(())
}

impl RecordService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// 列出域名下的本地记录
    pub async fn list_records(&self, domain_id: &str) -> CoreResult<Vec<Record>> {
        let domain = self.ctx.load_domain(domain_id).await?;
        self.ctx.record_repository().find_by_domain(&domain.id).await
    }

    /// 创建 DNS 记录
    pub async fn create_record(&self, request: CreateRecordRequest) -> CoreResult<Record> {
        let domain = self.ctx.load_domain(&request.domain_id).await?;
        validate_ttl(request.ttl)?;
        validate_fields(request.record_type, &request.value, request.priority)?;

        let key = RecordKey::new(&request.name, request.record_type);
        if self
            .ctx
            .record_repository()
            .find_by_key(&domain.id, &key)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(format!(
                "record {key} already exists in {}",
                domain.name
            )));
        }

        let now = Utc::now();
        let mut record = Record {
            id: uuid::Uuid::new_v4().to_string(),
            domain_id: domain.id.clone(),
            name: normalize_record_name(&request.name),
            record_type: request.record_type,
            value: request.value.trim().to_string(),
            ttl: request.ttl,
            priority: request.priority.filter(|_| request.record_type == RecordType::Mx),
            enabled: true,
            external_id: None,
            created_at: now,
            updated_at: now,
        };

        let client = self.ctx.client_for_domain(&domain).await?;
        let external_id = match client.create_record(&domain.name, &record.to_input()).await {
            Ok(id) => id,
            Err(e) => return Err(self.ctx.handle_provider_error(&domain.provider_id, e).await),
        };
        record.external_id = Some(external_id);

        let _guard = self.ctx.lock_domain(&domain.name).await;
        if let Err(e) = self.ctx.record_repository().save(&record).await {
            log::error!(
                "Record {key} created at provider as {:?} but not stored locally: {e}",
                record.external_id
            );
            return Err(e);
        }
        Ok(record)
    }

    /// 更新 DNS 记录
    pub async fn update_record(
        &self,
        record_id: &str,
        request: UpdateRecordRequest,
    ) -> CoreResult<Record> {
        let mut record = self
            .ctx
            .record_repository()
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| CoreError::RecordNotFound(record_id.to_string()))?;
        let domain = self.ctx.load_domain(&record.domain_id).await?;
        let Some(external_id) = record.external_id.clone() else {
            return Err(CoreError::ValidationError(format!(
                "record {} has no provider id and cannot be updated remotely",
                record.key()
            )));
        };

        if let Some(value) = request.value {
            record.value = value.trim().to_string();
        }
        if let Some(ttl) = request.ttl {
            validate_ttl(ttl)?;
            record.ttl = ttl;
        }
        if request.priority.is_some() {
            record.priority = request.priority;
        }
        if let Some(enabled) = request.enabled {
            record.enabled = enabled;
        }
        validate_fields(record.record_type, &record.value, record.priority)?;
        record.updated_at = Utc::now();

        let client = self.ctx.client_for_domain(&domain).await?;
        if let Err(e) = client
            .update_record(&domain.name, &external_id, &record.to_input())
            .await
        {
            return Err(self.ctx.handle_provider_error(&domain.provider_id, e).await);
        }

        let _guard = self.ctx.lock_domain(&domain.name).await;
        self.ctx.record_repository().save(&record).await?;
        Ok(record)
    }

    /// 删除 DNS 记录
    ///
    /// Records never confirmed by the provider are only removed locally.
    pub async fn delete_record(&self, record_id: &str) -> CoreResult<()> {
        let record = self
            .ctx
            .record_repository()
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| CoreError::RecordNotFound(record_id.to_string()))?;
        let domain = self.ctx.load_domain(&record.domain_id).await?;

        if let Some(external_id) = &record.external_id {
            let client = self.ctx.client_for_domain(&domain).await?;
            if let Err(e) = client.delete_record(&domain.name, external_id).await {
                return Err(self.ctx.handle_provider_error(&domain.provider_id, e).await);
            }
        }

        let _guard = self.ctx.lock_domain(&domain.name).await;
        self.ctx.record_repository().delete(&record.id).await
    }
}
