//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dnsflow_provider::{
    DnsProvider, ProviderError, ProviderRecord, ProviderType, ProviderZone, RecordInput,
    RecordType, Result as ProviderResult,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{CoreError, CoreResult};
use crate::services::{AcmeRequest, AcmeRunner, IpResolver, ServiceContext};
use crate::traits::{
    CertificateRepository, DdnsRepository, DomainRepository, InMemoryProviderRegistry,
    ProviderRegistry, ProviderRepository, RecordRepository,
};
use crate::types::{
    Certificate, DdnsConfig, DdnsLog, Domain, Provider, ProviderStatus, Record, RecordKey,
};

// ===== MockStore =====

/// In-memory implementation of every repository.
#[derive(Default)]
pub struct MockStore {
    providers: RwLock<HashMap<String, Provider>>,
    domains: RwLock<HashMap<String, Domain>>,
    records: RwLock<HashMap<String, Record>>,
    ddns: RwLock<HashMap<String, DdnsConfig>>,
    logs: RwLock<Vec<DdnsLog>>,
    certificates: RwLock<HashMap<String, Certificate>>,
    /// Number of domain/record saves and deletes
    writes: AtomicUsize,
    /// 如果 Some，record save 时返回此错误
    record_save_error: RwLock<Option<String>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn set_record_save_error(&self, err: Option<String>) {
        *self.record_save_error.write().await = err;
    }

    pub async fn all_logs(&self) -> Vec<DdnsLog> {
        self.logs.read().await.clone()
    }

    fn touch(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProviderRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<Provider>> {
        let mut all: Vec<_> = self.providers.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn find_enabled(&self) -> CoreResult<Vec<Provider>> {
        let all = ProviderRepository::find_all(self).await?;
        Ok(all.into_iter().filter(|p| p.enabled).collect())
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Provider>> {
        Ok(self.providers.read().await.get(id).cloned())
    }

    async fn save(&self, provider: &Provider) -> CoreResult<()> {
        self.providers
            .write()
            .await
            .insert(provider.id.clone(), provider.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.providers
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::ProviderNotFound(id.to_string()))
    }

    async fn update_status(
        &self,
        id: &str,
        status: ProviderStatus,
        error: Option<String>,
        tested_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut store = self.providers.write().await;
        let provider = store
            .get_mut(id)
            .ok_or_else(|| CoreError::ProviderNotFound(id.to_string()))?;
        provider.status = status;
        provider.last_error = error;
        provider.last_test_at = Some(tested_at);
        Ok(())
    }
}

#[async_trait]
impl DomainRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<Domain>> {
        let mut all: Vec<_> = self.domains.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>> {
        Ok(self.domains.read().await.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Domain>> {
        Ok(self
            .domains
            .read()
            .await
            .values()
            .find(|d| d.name == name)
            .cloned())
    }

    async fn find_by_provider(&self, provider_id: &str) -> CoreResult<Vec<Domain>> {
        Ok(self
            .domains
            .read()
            .await
            .values()
            .filter(|d| d.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn save(&self, domain: &Domain) -> CoreResult<()> {
        self.touch();
        self.domains
            .write()
            .await
            .insert(domain.id.clone(), domain.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.touch();
        self.domains.write().await.remove(id);
        self.records.write().await.retain(|_, r| r.domain_id != id);
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for MockStore {
    async fn find_by_domain(&self, domain_id: &str) -> CoreResult<Vec<Record>> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.domain_id == domain_id)
            .cloned()
            .collect();
        records.sort_by_key(Record::key);
        Ok(records)
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Record>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_key(&self, domain_id: &str, key: &RecordKey) -> CoreResult<Option<Record>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.domain_id == domain_id && &r.key() == key)
            .cloned())
    }

    async fn save(&self, record: &Record) -> CoreResult<()> {
        if let Some(ref msg) = *self.record_save_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        self.touch();
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.touch();
        self.records
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))
    }
}

#[async_trait]
impl DdnsRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<DdnsConfig>> {
        let mut all: Vec<_> = self.ddns.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<DdnsConfig>> {
        Ok(self.ddns.read().await.get(id).cloned())
    }

    async fn save(&self, config: &DdnsConfig) -> CoreResult<()> {
        self.ddns
            .write()
            .await
            .insert(config.id.clone(), config.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.ddns.write().await.remove(id);
        self.logs.write().await.retain(|l| l.config_id != id);
        Ok(())
    }

    async fn append_log(&self, log: &DdnsLog) -> CoreResult<()> {
        self.logs.write().await.push(log.clone());
        Ok(())
    }

    async fn find_logs(&self, config_id: &str, limit: usize) -> CoreResult<Vec<DdnsLog>> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .rev()
            .filter(|l| l.config_id == config_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_logs_since(&self, since: DateTime<Utc>) -> CoreResult<Vec<DdnsLog>> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .rev()
            .filter(|l| l.created_at >= since)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CertificateRepository for MockStore {
    async fn find_all(&self) -> CoreResult<Vec<Certificate>> {
        let mut all: Vec<_> = self.certificates.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Certificate>> {
        Ok(self.certificates.read().await.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Certificate>> {
        Ok(self
            .certificates
            .read()
            .await
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn save(&self, certificate: &Certificate) -> CoreResult<()> {
        self.certificates
            .write()
            .await
            .insert(certificate.id.clone(), certificate.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        self.certificates
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CoreError::CertificateNotFound(id.to_string()))
    }
}

// ===== MockDnsProvider =====

/// One call made against [`MockDnsProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListZones,
    ListRecords(String),
    Create(String, RecordInput),
    Update(String, String, RecordInput),
    Delete(String, String),
}

impl MockCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Create(..) | Self::Update(..) | Self::Delete(..))
    }
}

/// Scripted vendor client that keeps records in memory and logs every call.
pub struct MockDnsProvider {
    id: &'static str,
    zones: Mutex<Vec<ProviderZone>>,
    records: Mutex<HashMap<String, Vec<ProviderRecord>>>,
    calls: Mutex<Vec<MockCall>>,
    next_id: AtomicUsize,
    /// Returned (once per call) by every operation while set
    failure: Mutex<Option<ProviderError>>,
}

impl MockDnsProvider {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            zones: Mutex::new(Vec::new()),
            records: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            failure: Mutex::new(None),
        }
    }

    /// Adds a zone as the vendor reports it (trailing dot allowed).
    pub fn with_zone(self, name: &str) -> Self {
        {
            let mut zones = self.zones.lock().unwrap();
            let id = format!("zone-{}", zones.len() + 1);
            zones.push(ProviderZone {
                id,
                name: name.to_string(),
                status: "ENABLE".to_string(),
                ttl: Some(600),
            });
        }
        self.records
            .lock()
            .unwrap()
            .entry(zone_key(name))
            .or_default();
        self
    }

    pub fn with_record(self, zone: &str, name: &str, record_type: RecordType, value: &str) -> Self {
        let id = self.fresh_id();
        self.records
            .lock()
            .unwrap()
            .entry(zone_key(zone))
            .or_default()
            .push(ProviderRecord {
                id,
                name: name.to_string(),
                record_type,
                value: value.to_string(),
                ttl: 600,
                priority: None,
                status: "ENABLE".to_string(),
            });
        self
    }

    pub fn set_failure(&self, err: Option<ProviderError>) {
        *self.failure.lock().unwrap() = err;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn records(&self, zone: &str) -> Vec<ProviderRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&zone_key(zone))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_value(&self, zone: &str, record_id: &str, value: &str) {
        if let Some(records) = self.records.lock().unwrap().get_mut(&zone_key(zone)) {
            for r in records.iter_mut().filter(|r| r.id == record_id) {
                r.value = value.to_string();
            }
        }
    }

    pub fn remove_record(&self, zone: &str, record_id: &str) {
        if let Some(records) = self.records.lock().unwrap().get_mut(&zone_key(zone)) {
            records.retain(|r| r.id != record_id);
        }
    }

    fn fresh_id(&self) -> String {
        format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn enter(&self, call: MockCall) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn zone_key(zone: &str) -> String {
    zone.trim_end_matches('.').to_ascii_lowercase()
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn list_zones(&self) -> ProviderResult<Vec<ProviderZone>> {
        self.enter(MockCall::ListZones)?;
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn list_records(&self, zone_name: &str) -> ProviderResult<Vec<ProviderRecord>> {
        self.enter(MockCall::ListRecords(zone_name.to_string()))?;
        self.records
            .lock()
            .unwrap()
            .get(&zone_key(zone_name))
            .cloned()
            .ok_or_else(|| ProviderError::DomainNotFound {
                provider: self.id.to_string(),
                domain: zone_name.to_string(),
                raw_message: None,
            })
    }

    async fn create_record(&self, zone_name: &str, input: &RecordInput) -> ProviderResult<String> {
        self.enter(MockCall::Create(zone_name.to_string(), input.clone()))?;
        let id = self.fresh_id();
        self.records
            .lock()
            .unwrap()
            .entry(zone_key(zone_name))
            .or_default()
            .push(ProviderRecord {
                id: id.clone(),
                name: input.name.clone(),
                record_type: input.record_type,
                value: input.value.clone(),
                ttl: input.ttl,
                priority: input.priority,
                status: "ENABLE".to_string(),
            });
        Ok(id)
    }

    async fn update_record(
        &self,
        zone_name: &str,
        record_id: &str,
        input: &RecordInput,
    ) -> ProviderResult<()> {
        self.enter(MockCall::Update(
            zone_name.to_string(),
            record_id.to_string(),
            input.clone(),
        ))?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&zone_key(zone_name))
            .and_then(|rs| rs.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| ProviderError::RecordNotFound {
                provider: self.id.to_string(),
                record_id: record_id.to_string(),
                raw_message: None,
            })?;
        record.value = input.value.clone();
        record.ttl = input.ttl;
        record.priority = input.priority;
        Ok(())
    }

    async fn delete_record(&self, zone_name: &str, record_id: &str) -> ProviderResult<()> {
        self.enter(MockCall::Delete(
            zone_name.to_string(),
            record_id.to_string(),
        ))?;
        if let Some(records) = self.records.lock().unwrap().get_mut(&zone_key(zone_name)) {
            records.retain(|r| r.id != record_id);
        }
        Ok(())
    }
}

// ===== MockIpResolver =====

/// Returns a fixed address (or error) and counts lookups.
pub struct MockIpResolver {
    ip: Mutex<Option<String>>,
    lookups: AtomicUsize,
}

impl MockIpResolver {
    pub fn new(ip: Option<&str>) -> Self {
        Self {
            ip: Mutex::new(ip.map(str::to_string)),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn set_ip(&self, ip: Option<&str>) {
        *self.ip.lock().unwrap() = ip.map(str::to_string);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpResolver for MockIpResolver {
    async fn resolve(&self, _record_type: RecordType) -> CoreResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.ip
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CoreError::IpDiscovery("all endpoints failed".to_string()))
    }
}

// ===== MockAcmeRunner =====

/// Scripted ACME client.
pub enum AcmeScript {
    Succeed,
    Fail(String),
    TimeOut,
    /// Runs until cancelled, then takes `teardown` to exit.
    UntilCancelled { teardown: std::time::Duration },
}

pub struct MockAcmeRunner {
    script: Mutex<AcmeScript>,
    requests: Mutex<Vec<AcmeRequest>>,
}

impl MockAcmeRunner {
    pub fn new(script: AcmeScript) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_script(&self, script: AcmeScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn requests(&self) -> Vec<AcmeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AcmeRunner for MockAcmeRunner {
    async fn run(&self, request: &AcmeRequest, cancel: CancellationToken) -> CoreResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        let teardown = match &*self.script.lock().unwrap() {
            AcmeScript::Succeed => return Ok("Successfully received certificate.".to_string()),
            AcmeScript::Fail(message) => {
                return Err(CoreError::AcmeFailed {
                    exit_code: Some(1),
                    message: message.clone(),
                })
            }
            AcmeScript::TimeOut => return Err(CoreError::AcmeTimeout { secs: 600 }),
            AcmeScript::UntilCancelled { teardown } => *teardown,
        };
        cancel.cancelled().await;
        tokio::time::sleep(teardown).await;
        Err(CoreError::AcmeCancelled)
    }
}

// ===== 工厂方法 =====

/// 创建测试用 `ServiceContext`
pub fn create_test_context() -> (Arc<ServiceContext>, Arc<MockStore>) {
    let store = Arc::new(MockStore::new());
    let ctx = Arc::new(ServiceContext::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(InMemoryProviderRegistry::new()),
    ));
    (ctx, store)
}

/// Stores a provider row and registers `client` for it.
pub async fn add_provider(
    ctx: &ServiceContext,
    id: &str,
    client: Arc<MockDnsProvider>,
) -> Provider {
    let now = Utc::now();
    let provider = Provider {
        id: id.to_string(),
        name: format!("{id}-name"),
        provider_type: ProviderType::Cloudflare,
        access_key: String::new(),
        secret_key: "test-token-12345".to_string(),
        region: None,
        enabled: true,
        status: ProviderStatus::Unknown,
        last_error: None,
        last_test_at: None,
        created_at: now,
        updated_at: now,
    };
    ctx.provider_repository().save(&provider).await.unwrap();
    ctx.provider_registry()
        .register(id.to_string(), client)
        .await;
    provider
}

/// Stores a domain row owned by `provider_id`.
pub async fn add_domain(ctx: &ServiceContext, id: &str, name: &str, provider_id: &str) -> Domain {
    let now = Utc::now();
    let domain = Domain {
        id: id.to_string(),
        name: name.to_string(),
        provider_id: provider_id.to_string(),
        status: "ENABLE".to_string(),
        last_synced_at: None,
        created_at: now,
        updated_at: now,
    };
    ctx.domain_repository().save(&domain).await.unwrap();
    domain
}
