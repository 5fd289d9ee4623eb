//! DDNS 更新服务
//!
//! Keeps one A/AAAA record per configuration equal to the host's public
//! address. Remote calls always happen before local writes, and a failed
//! cycle is reported as a value so the scheduler can keep going.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dnsflow_provider::{RecordInput, RecordType};

use crate::config::{DdnsSettings, MIN_DDNS_INTERVAL_SECS};
use crate::error::{CoreError, CoreResult};
use crate::services::{IpResolver, ServiceContext};
use crate::types::{
    CreateDdnsRequest, DdnsBatchResult, DdnsConfig, DdnsLog, DdnsStatus, DdnsSummary,
    DdnsUpdateResult, Domain, Record, RecordKey, UpdateDdnsRequest,
};
use crate::utils::domain_name::{is_within_zone, normalize_zone, relative_name};

/// TTL used for DDNS-managed records.
const DDNS_TTL: u32 = 300;

pub struct DdnsService {
    ctx: Arc<ServiceContext>,
    resolver: Arc<dyn IpResolver>,
    min_interval_secs: u64,
}

impl DdnsService {
    #[must_use]
    pub fn new(
        ctx: Arc<ServiceContext>,
        resolver: Arc<dyn IpResolver>,
        settings: &DdnsSettings,
    ) -> Self {
        Self {
            ctx,
            resolver,
            min_interval_secs: settings.min_interval_secs.max(MIN_DDNS_INTERVAL_SECS),
        }
    }

    pub async fn list_configs(&self) -> CoreResult<Vec<DdnsConfig>> {
        self.ctx.ddns_repository().find_all().await
    }

    pub async fn get_config(&self, config_id: &str) -> CoreResult<DdnsConfig> {
        self.ctx
            .ddns_repository()
            .find_by_id(config_id)
            .await?
            .ok_or_else(|| CoreError::DdnsConfigNotFound(config_id.to_string()))
    }

    /// Newest first.
    pub async fn list_logs(&self, config_id: &str, limit: usize) -> CoreResult<Vec<DdnsLog>> {
        self.get_config(config_id).await?;
        self.ctx.ddns_repository().find_logs(config_id, limit).await
    }

    /// Configuration counts plus update outcomes of the 24 hours before `now`.
    pub async fn status_summary(&self, now: DateTime<Utc>) -> CoreResult<DdnsSummary> {
        let configs = self.ctx.ddns_repository().find_all().await?;
        let enabled_configs = configs.iter().filter(|c| c.enabled).count();

        let window_start = now - Duration::hours(24);
        let logs = self.ctx.ddns_repository().find_logs_since(window_start).await?;
        let recent = logs.iter().filter(|l| l.created_at <= now);
        let (recent_updates, recent_failures) =
            recent.fold((0, 0), |(ok, failed), l| match l.status {
                DdnsStatus::Success => (ok + 1, failed),
                DdnsStatus::Failed => (ok, failed + 1),
            });

        Ok(DdnsSummary {
            total_configs: configs.len(),
            enabled_configs,
            disabled_configs: configs.len() - enabled_configs,
            recent_updates,
            recent_failures,
            window_start,
            checked_at: now,
        })
    }

    fn validate_interval(&self, interval_secs: u64) -> CoreResult<()> {
        if interval_secs < self.min_interval_secs {
            return Err(CoreError::ValidationError(format!(
                "update interval must be at least {}s, got {interval_secs}s",
                self.min_interval_secs
            )));
        }
        Ok(())
    }

    /// 创建 DDNS 配置
    ///
    /// The record is upserted at the provider first; nothing is stored
    /// locally unless that succeeds.
    pub async fn create_config(&self, request: CreateDdnsRequest) -> CoreResult<DdnsConfig> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "DDNS config name must not be empty".to_string(),
            ));
        }
        self.validate_interval(request.interval_secs)?;
        if !matches!(request.record_type, RecordType::A | RecordType::Aaaa) {
            return Err(CoreError::ValidationError(format!(
                "DDNS only manages A and AAAA records, got {}",
                request.record_type
            )));
        }

        let domain = self.ctx.load_domain(&request.domain_id).await?;
        let subdomain = normalize_zone(&request.subdomain);
        if subdomain.is_empty() || !is_within_zone(&subdomain, &domain.name) {
            return Err(CoreError::ValidationError(format!(
                "{} does not belong to {}",
                request.subdomain, domain.name
            )));
        }

        let duplicate = self
            .ctx
            .ddns_repository()
            .find_all()
            .await?
            .into_iter()
            .any(|c| c.subdomain == subdomain && c.record_type == request.record_type);
        if duplicate {
            return Err(CoreError::Conflict(format!(
                "a DDNS config for {subdomain} {} already exists",
                request.record_type
            )));
        }

        let ip = self.resolver.resolve(request.record_type).await?;
        let key = RecordKey::new(&relative_name(&subdomain, &domain.name), request.record_type);
        let external_id = match self.upsert_remote(&domain, &key, &ip).await {
            Ok(id) => id,
            Err(e) => return Err(self.report(&domain, e).await),
        };

        let now = Utc::now();
        let config = DdnsConfig {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            domain_id: domain.id.clone(),
            subdomain,
            record_type: request.record_type,
            interval_secs: request.interval_secs,
            mode: request.mode,
            enabled: true,
            last_ip: Some(ip.clone()),
            last_update_at: Some(now),
            last_status: Some(DdnsStatus::Success),
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        {
            let _guard = self.ctx.lock_domain(&domain.name).await;
            self.store_record(&domain, &key, &ip, &external_id).await?;
            self.ctx.ddns_repository().save(&config).await?;
        }
        self.append_log(&config.id, None, Some(ip), DdnsStatus::Success, "created")
            .await;

        log::info!(
            "DDNS config {} created for {} {}",
            config.id,
            config.subdomain,
            config.record_type
        );
        Ok(config)
    }

    /// Changes name, interval, mode or enabled flag. Rescheduling is the
    /// caller's concern.
    pub async fn update_config(
        &self,
        config_id: &str,
        request: UpdateDdnsRequest,
    ) -> CoreResult<DdnsConfig> {
        let mut config = self.get_config(config_id).await?;
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CoreError::ValidationError(
                    "DDNS config name must not be empty".to_string(),
                ));
            }
            config.name = name;
        }
        if let Some(interval_secs) = request.interval_secs {
            self.validate_interval(interval_secs)?;
            config.interval_secs = interval_secs;
        }
        if let Some(mode) = request.mode {
            config.mode = mode;
        }
        if let Some(enabled) = request.enabled {
            config.enabled = enabled;
        }
        config.updated_at = Utc::now();
        self.ctx.ddns_repository().save(&config).await?;
        Ok(config)
    }

    /// 删除 DDNS 配置
    ///
    /// Removing the managed record is best effort; failures are logged and
    /// the configuration is deleted regardless.
    pub async fn delete_config(&self, config_id: &str) -> CoreResult<()> {
        let config = self.get_config(config_id).await?;
        if let Err(e) = self.remove_managed_record(&config).await {
            log::warn!(
                "Failed to remove record for DDNS config {} ({}): {e}",
                config.id,
                config.subdomain
            );
        }
        self.ctx.ddns_repository().delete(&config.id).await?;
        log::info!("DDNS config {} deleted", config.id);
        Ok(())
    }

    async fn remove_managed_record(&self, config: &DdnsConfig) -> CoreResult<()> {
        let domain = self.ctx.load_domain(&config.domain_id).await?;
        let key = RecordKey::new(&relative_name(&config.subdomain, &domain.name), config.record_type);
        let Some(record) = self
            .ctx
            .record_repository()
            .find_by_key(&domain.id, &key)
            .await?
        else {
            return Ok(());
        };

        if let Some(external_id) = &record.external_id {
            let client = self.ctx.client_for_domain(&domain).await?;
            client.delete_record(&domain.name, external_id).await?;
        }
        let _guard = self.ctx.lock_domain(&domain.name).await;
        self.ctx.record_repository().delete(&record.id).await
    }

    /// Runs one update cycle.
    ///
    /// Only a missing configuration or domain is an `Err`; discovery and
    /// provider failures come back as a failed [`DdnsUpdateResult`].
    pub async fn update_one(&self, config_id: &str, force: bool) -> CoreResult<DdnsUpdateResult> {
        let config = self.get_config(config_id).await?;
        let domain = self.ctx.load_domain(&config.domain_id).await?;
        let old_ip = config.last_ip.clone();

        let ip = match self.resolver.resolve(config.record_type).await {
            Ok(ip) => ip,
            Err(e) => {
                log::warn!("DDNS {}: {e}", config.subdomain);
                return Ok(self.record_failure(config, None, &e.to_string()).await);
            }
        };

        if !force && old_ip.as_deref() == Some(ip.as_str()) {
            self.append_log(&config.id, old_ip.clone(), Some(ip.clone()), DdnsStatus::Success, "no change")
                .await;
            return Ok(DdnsUpdateResult {
                config_id: config.id,
                status: DdnsStatus::Success,
                changed: false,
                old_ip,
                new_ip: Some(ip),
                message: "no change".to_string(),
            });
        }

        let key = RecordKey::new(&relative_name(&config.subdomain, &domain.name), config.record_type);
        let external_id = match self.upsert_remote(&domain, &key, &ip).await {
            Ok(id) => id,
            Err(e) => {
                let err = self.report(&domain, e).await;
                return Ok(self.record_failure(config, Some(ip), &err.to_string()).await);
            }
        };

        let now = Utc::now();
        let mut config = config;
        config.last_ip = Some(ip.clone());
        config.last_update_at = Some(now);
        config.last_status = Some(DdnsStatus::Success);
        config.last_error = None;
        config.updated_at = now;
        {
            let _guard = self.ctx.lock_domain(&domain.name).await;
            self.store_record(&domain, &key, &ip, &external_id).await?;
            self.ctx.ddns_repository().save(&config).await?;
        }

        let message = format!(
            "{} -> {ip}",
            old_ip.as_deref().unwrap_or("none")
        );
        self.append_log(&config.id, old_ip.clone(), Some(ip.clone()), DdnsStatus::Success, &message)
            .await;
        log::info!("DDNS {} updated: {message}", config.subdomain);

        Ok(DdnsUpdateResult {
            config_id: config.id,
            status: DdnsStatus::Success,
            changed: true,
            old_ip,
            new_ip: Some(ip),
            message,
        })
    }

    /// Updates every enabled automatic configuration whose interval has
    /// elapsed (all of them when `force`).
    pub async fn update_all(&self, force: bool) -> CoreResult<DdnsBatchResult> {
        let now = Utc::now();
        let mut result = DdnsBatchResult::default();

        for config in self.ctx.ddns_repository().find_all().await? {
            if !config.is_scheduled() {
                continue;
            }
            if !force && !config.is_due(now) {
                result.skipped_count += 1;
                continue;
            }
            match self.update_one(&config.id, force).await {
                Ok(outcome) if outcome.is_success() => result.success_count += 1,
                Ok(_) => result.failed_count += 1,
                Err(e) => {
                    log::error!("DDNS update for {} failed: {e}", config.id);
                    result.failed_count += 1;
                }
            }
        }

        log::info!(
            "DDNS batch: {} succeeded, {} skipped, {} failed",
            result.success_count,
            result.skipped_count,
            result.failed_count
        );
        Ok(result)
    }

    /// Updates the remote record matching `key`, or creates it.
    async fn upsert_remote(
        &self,
        domain: &Domain,
        key: &RecordKey,
        ip: &str,
    ) -> CoreResult<String> {
        let client = self.ctx.client_for_domain(domain).await?;
        let input = RecordInput::new(&key.name, key.record_type, ip).with_ttl(DDNS_TTL);

        let existing = client
            .list_records(&domain.name)
            .await?
            .into_iter()
            .find(|r| RecordKey::new(&r.name, r.record_type) == *key);

        match existing {
            Some(record) => {
                client.update_record(&domain.name, &record.id, &input).await?;
                Ok(record.id)
            }
            None => Ok(client.create_record(&domain.name, &input).await?),
        }
    }

    async fn report(&self, domain: &Domain, err: CoreError) -> CoreError {
        match err {
            CoreError::Provider(e) => self.ctx.handle_provider_error(&domain.provider_id, e).await,
            other => other,
        }
    }

    /// Mirrors the managed record locally. Caller holds the domain lock.
    async fn store_record(
        &self,
        domain: &Domain,
        key: &RecordKey,
        ip: &str,
        external_id: &str,
    ) -> CoreResult<()> {
        let now = Utc::now();
        let record = match self
            .ctx
            .record_repository()
            .find_by_key(&domain.id, key)
            .await?
        {
            Some(mut record) => {
                record.value = ip.to_string();
                record.external_id = Some(external_id.to_string());
                record.updated_at = now;
                record
            }
            None => Record {
                id: uuid::Uuid::new_v4().to_string(),
                domain_id: domain.id.clone(),
                name: key.name.clone(),
                record_type: key.record_type,
                value: ip.to_string(),
                ttl: DDNS_TTL,
                priority: None,
                enabled: true,
                external_id: Some(external_id.to_string()),
                created_at: now,
                updated_at: now,
            },
        };
        self.ctx.record_repository().save(&record).await
    }

    async fn record_failure(
        &self,
        mut config: DdnsConfig,
        new_ip: Option<String>,
        message: &str,
    ) -> DdnsUpdateResult {
        let old_ip = config.last_ip.clone();
        config.last_status = Some(DdnsStatus::Failed);
        config.last_error = Some(message.to_string());
        config.updated_at = Utc::now();
        if let Err(e) = self.ctx.ddns_repository().save(&config).await {
            log::error!("Failed to store DDNS status for {}: {e}", config.id);
        }
        self.append_log(&config.id, old_ip.clone(), new_ip.clone(), DdnsStatus::Failed, message)
            .await;

        DdnsUpdateResult {
            config_id: config.id,
            status: DdnsStatus::Failed,
            changed: false,
            old_ip,
            new_ip,
            message: message.to_string(),
        }
    }

    async fn append_log(
        &self,
        config_id: &str,
        old_ip: Option<String>,
        new_ip: Option<String>,
        status: DdnsStatus,
        message: &str,
    ) {
        let entry = DdnsLog {
            id: uuid::Uuid::new_v4().to_string(),
            config_id: config_id.to_string(),
            old_ip,
            new_ip,
            status,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.ctx.ddns_repository().append_log(&entry).await {
            log::error!("Failed to append DDNS log for {config_id}: {e}");
        }
    }
}
