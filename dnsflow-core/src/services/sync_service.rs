//! Zone/record synchronization.
//!
//! The provider is authoritative for synced zones: for every zone it
//! reports, local records are brought in line with the remote set using
//! `(name, type)` as identity.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::types::{Domain, Provider, ProviderRecord, Record, RecordKey};
use crate::utils::domain_name::{normalize_record_name, normalize_zone};

/// Local mutations needed to mirror one zone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub creates: Vec<Record>,
    pub updates: Vec<Record>,
    pub deletes: Vec<Record>,
    /// Local records without a provider id, kept as-is
    pub pending: Vec<Record>,
    /// Remote entries that were unusable or shadowed by an earlier duplicate
    pub skipped: usize,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Diffs `remote` against `local` for one domain.
///
/// Pure; `now` only stamps created/updated rows.
pub fn plan_reconcile(
    domain_id: &str,
    local: &[Record],
    remote: &[ProviderRecord],
    now: chrono::DateTime<Utc>,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    let mut remote_by_key: BTreeMap<RecordKey, &ProviderRecord> = BTreeMap::new();
    for record in remote {
        if record.id.trim().is_empty()
            || record.name.trim().is_empty()
            || record.value.trim().is_empty()
        {
            plan.skipped += 1;
            continue;
        }
        let key = RecordKey::new(&record.name, record.record_type);
        if remote_by_key.contains_key(&key) {
            log::debug!("Duplicate remote record {key} ({}) ignored", record.id);
            plan.skipped += 1;
            continue;
        }
        remote_by_key.insert(key, record);
    }

    let mut matched: HashSet<RecordKey> = HashSet::new();
    for record in local {
        let key = record.key();
        match remote_by_key.get(&key) {
            Some(remote) if matched.insert(key) => {
                let external_id = Some(remote.id.clone());
                if record.value != remote.value
                    || record.ttl != remote.ttl
                    || record.priority != remote.priority
                    || record.external_id != external_id
                {
                    let mut updated = record.clone();
                    updated.value.clone_from(&remote.value);
                    updated.ttl = remote.ttl;
                    updated.priority = remote.priority;
                    updated.external_id = external_id;
                    updated.updated_at = now;
                    plan.updates.push(updated);
                }
            }
            // A second local row with an already matched key is stale.
            Some(_) => plan.deletes.push(record.clone()),
            None if record.external_id.is_some() => plan.deletes.push(record.clone()),
            None => plan.pending.push(record.clone()),
        }
    }

    for (key, remote) in remote_by_key {
        if matched.contains(&key) {
            continue;
        }
        plan.creates.push(Record {
            id: uuid::Uuid::new_v4().to_string(),
            domain_id: domain_id.to_string(),
            name: normalize_record_name(&remote.name),
            record_type: remote.record_type,
            value: remote.value.clone(),
            ttl: remote.ttl,
            priority: remote.priority,
            enabled: true,
            external_id: Some(remote.id.clone()),
            created_at: now,
            updated_at: now,
        });
    }

    plan
}

/// Counts for one provider sync.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub provider_id: String,
    pub zones: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub pending: usize,
    pub skipped: usize,
    /// Zones reported by this provider but owned by another one locally
    pub conflicts: Vec<String>,
}

/// Per-provider result of [`SyncService::sync_all`].
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub provider_id: String,
    pub report: Option<SyncReport>,
    pub error: Option<String>,
}

pub struct SyncService {
    ctx: Arc<ServiceContext>,
}

impl SyncService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Syncs every enabled provider concurrently.
    ///
    /// One provider failing never aborts the others.
    pub async fn sync_all(&self) -> CoreResult<Vec<SyncOutcome>> {
        let providers = self.ctx.provider_repository().find_enabled().await?;
        let outcomes = join_all(providers.iter().map(|provider| async move {
            match self.sync_provider(&provider.id).await {
                Ok(report) => SyncOutcome {
                    provider_id: provider.id.clone(),
                    report: Some(report),
                    error: None,
                },
                Err(e) => SyncOutcome {
                    provider_id: provider.id.clone(),
                    report: None,
                    error: Some(e.to_string()),
                },
            }
        }))
        .await;

        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        log::info!(
            "Sync finished: {} provider(s), {failed} failed",
            outcomes.len()
        );
        Ok(outcomes)
    }

    /// Mirrors every zone of one provider into the local store.
    ///
    /// Any provider failure marks the provider failed and stops its zone
    /// loop; zones already processed keep their changes.
    pub async fn sync_provider(&self, provider_id: &str) -> CoreResult<SyncReport> {
        let provider = self.ctx.load_provider(provider_id).await?;
        let client = self.ctx.get_provider(provider_id).await?;
        let mut report = SyncReport {
            provider_id: provider_id.to_string(),
            ..SyncReport::default()
        };

        let zones = match client.list_zones().await {
            Ok(zones) => zones,
            Err(e) => return Err(self.fail(provider_id, CoreError::Provider(e)).await),
        };

        for zone in zones {
            let zone_name = normalize_zone(&zone.name);
            if zone_name.is_empty() {
                continue;
            }

            if let Some(owner) = self.foreign_owner(&provider, &zone_name).await? {
                log::warn!(
                    "Zone {zone_name} reported by provider {} is owned by provider {owner}, skipped",
                    provider.name
                );
                report.conflicts.push(zone_name);
                continue;
            }

            let remote = match client.list_records(&zone_name).await {
                Ok(records) => records,
                Err(e) => return Err(self.fail(provider_id, CoreError::Provider(e)).await),
            };

            let applied = match self
                .reconcile_zone(&provider, &zone_name, &zone.status, &remote)
                .await
            {
                Ok(plan) => plan,
                Err(e) => return Err(self.fail(provider_id, e).await),
            };

            report.zones += 1;
            report.created += applied.creates.len();
            report.updated += applied.updates.len();
            report.deleted += applied.deletes.len();
            report.pending += applied.pending.len();
            report.skipped += applied.skipped;
        }

        self.ctx.mark_provider_connected(provider_id).await;
        log::info!(
            "Provider {} synced: {} zone(s), +{} ~{} -{}",
            provider.name,
            report.zones,
            report.created,
            report.updated,
            report.deleted
        );
        Ok(report)
    }

    /// The id of another provider already owning `zone_name`, if any.
    async fn foreign_owner(&self, provider: &Provider, zone_name: &str) -> CoreResult<Option<String>> {
        Ok(self
            .ctx
            .domain_repository()
            .find_by_name(zone_name)
            .await?
            .filter(|d| d.provider_id != provider.id)
            .map(|d| d.provider_id))
    }

    /// Local write phase for one zone, under the zone's lock.
    async fn reconcile_zone(
        &self,
        provider: &Provider,
        zone_name: &str,
        zone_status: &str,
        remote: &[ProviderRecord],
    ) -> CoreResult<ReconcilePlan> {
        let _guard = self.ctx.lock_domain(zone_name).await;
        let now = Utc::now();

        let mut domain = match self.ctx.domain_repository().find_by_name(zone_name).await? {
            // Re-checked under the lock: ownership may have changed meanwhile.
            Some(d) if d.provider_id != provider.id => {
                return Err(CoreError::Conflict(format!(
                    "zone {zone_name} is owned by provider {}",
                    d.provider_id
                )));
            }
            Some(d) => d,
            None => Domain {
                id: uuid::Uuid::new_v4().to_string(),
                name: zone_name.to_string(),
                provider_id: provider.id.clone(),
                status: zone_status.to_string(),
                last_synced_at: None,
                created_at: now,
                updated_at: now,
            },
        };

        let local = self
            .ctx
            .record_repository()
            .find_by_domain(&domain.id)
            .await?;
        let plan = plan_reconcile(&domain.id, &local, remote, now);

        let domain_changed = domain.status != zone_status || domain.last_synced_at.is_none();
        if domain_changed {
            domain.status = zone_status.to_string();
            domain.last_synced_at = Some(now);
            domain.updated_at = now;
            self.ctx.domain_repository().save(&domain).await?;
        }

        let records = self.ctx.record_repository();
        for record in plan.creates.iter().chain(&plan.updates) {
            records.save(record).await?;
        }
        for record in &plan.deletes {
            records.delete(&record.id).await?;
        }

        if !plan.is_noop() {
            log::debug!(
                "Zone {zone_name}: +{} ~{} -{} ({} pending, {} skipped)",
                plan.creates.len(),
                plan.updates.len(),
                plan.deletes.len(),
                plan.pending.len(),
                plan.skipped
            );
        }
        Ok(plan)
    }

    async fn fail(&self, provider_id: &str, err: CoreError) -> CoreError {
        self.ctx
            .mark_provider_failed(provider_id, &err.to_string())
            .await;
        err
    }
}
