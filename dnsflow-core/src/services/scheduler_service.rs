//! Background jobs: zone sync, certificate checks and one job per
//! automatic DDNS configuration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::config::SchedulerSettings;
use crate::error::CoreResult;
use crate::scheduler::Scheduler;
use crate::services::{CertificateService, DdnsService, SyncService};
use crate::types::DdnsConfig;

pub const SYNC_DOMAINS_JOB: &str = "sync_domains";
pub const CHECK_CERTIFICATES_JOB: &str = "check_certificates";

pub fn ddns_job_key(config_id: &str) -> String {
    format!("ddns_update_{config_id}")
}

pub struct SchedulerService {
    scheduler: Arc<Scheduler>,
    sync: Arc<SyncService>,
    ddns: Arc<DdnsService>,
    certificates: Arc<CertificateService>,
    settings: SchedulerSettings,
    started: AtomicBool,
}

impl SchedulerService {
    #[must_use]
    pub fn new(
        scheduler: Arc<Scheduler>,
        sync: Arc<SyncService>,
        ddns: Arc<DdnsService>,
        certificates: Arc<CertificateService>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            scheduler,
            sync,
            ddns,
            certificates,
            settings,
            started: AtomicBool::new(false),
        }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Registers the periodic jobs. A second call is a no-op.
    pub async fn start(&self) -> CoreResult<()> {
        if !self.settings.enabled {
            log::info!("Scheduler disabled by configuration");
            return Ok(());
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let sync = Arc::clone(&self.sync);
        self.scheduler.add_job(
            SYNC_DOMAINS_JOB,
            Duration::from_secs(self.settings.sync_interval_secs),
            move || {
                let sync = Arc::clone(&sync);
                async move {
                    match sync.sync_all().await {
                        Ok(outcomes) => {
                            for outcome in outcomes.iter().filter(|o| o.error.is_some()) {
                                log::warn!(
                                    "Scheduled sync of {} failed: {}",
                                    outcome.provider_id,
                                    outcome.error.as_deref().unwrap_or_default()
                                );
                            }
                        }
                        Err(e) => log::error!("Scheduled sync failed: {e}"),
                    }
                }
            },
        );

        let certificates = Arc::clone(&self.certificates);
        self.scheduler.add_job(
            CHECK_CERTIFICATES_JOB,
            Duration::from_secs(self.settings.certificate_check_interval_secs),
            move || {
                let certificates = Arc::clone(&certificates);
                async move {
                    if let Err(e) = certificates.refresh_statuses(Utc::now()).await {
                        log::error!("Certificate status refresh failed: {e}");
                    }
                    match certificates.renew_due(Utc::now()).await {
                        Ok(summary) if !summary.renewed.is_empty() || !summary.failed.is_empty() => {
                            log::info!(
                                "Certificate renewal: {} renewed, {} failed",
                                summary.renewed.len(),
                                summary.failed.len()
                            );
                        }
                        Ok(_) => {}
                        Err(e) => log::error!("Certificate renewal check failed: {e}"),
                    }
                }
            },
        );

        for config in self.ddns.list_configs().await? {
            self.schedule_ddns(&config);
        }
        log::info!("Scheduler started with {} job(s)", self.scheduler.job_keys().len());
        Ok(())
    }

    /// Adds, replaces or drops the job for `config` to match its state.
    pub fn schedule_ddns(&self, config: &DdnsConfig) {
        if !self.is_started() {
            return;
        }
        let key = ddns_job_key(&config.id);
        if !config.is_scheduled() {
            self.scheduler.remove_job(&key);
            return;
        }

        let ddns = Arc::clone(&self.ddns);
        let config_id = config.id.clone();
        self.scheduler.reschedule(
            &key,
            Duration::from_secs(config.interval_secs),
            move || {
                let ddns = Arc::clone(&ddns);
                let config_id = config_id.clone();
                async move {
                    match ddns.update_one(&config_id, false).await {
                        Ok(result) if !result.is_success() => {
                            log::warn!("DDNS {config_id}: {}", result.message);
                        }
                        Ok(_) => {}
                        Err(e) => log::error!("DDNS job {config_id} failed: {e}"),
                    }
                }
            },
        );
    }

    pub fn unschedule_ddns(&self, config_id: &str) {
        self.scheduler.remove_job(&ddns_job_key(config_id));
    }

    /// Runs a job now unless it is already in flight.
    pub fn trigger(&self, key: &str) -> Option<JoinHandle<()>> {
        self.scheduler.trigger(key)
    }

    /// Stops every job and terminates in-flight ACME processes.
    ///
    /// Returns once the in-flight runs have finished, or after the ACME
    /// teardown limit has passed.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown();
        self.certificates.cancel_all();
        self.started.store(false, Ordering::Release);
        self.scheduler
            .wait_idle(self.certificates.teardown_limit())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CertificateSettings, DdnsSettings};
    use crate::services::ServiceContext;
    use crate::test_utils::{
        add_domain, add_provider, create_test_context, AcmeScript, MockAcmeRunner, MockDnsProvider,
        MockIpResolver,
    };
    use crate::types::{DdnsMode, DdnsStatus};
    use dnsflow_provider::RecordType;

    fn config(id: &str, mode: DdnsMode) -> DdnsConfig {
        let now = Utc::now();
        DdnsConfig {
            id: id.to_string(),
            name: id.to_string(),
            domain_id: "d1".to_string(),
            subdomain: "home.example.com".to_string(),
            record_type: RecordType::A,
            interval_secs: 120,
            mode,
            enabled: true,
            last_ip: Some("1.2.3.4".to_string()),
            last_update_at: None,
            last_status: Some(DdnsStatus::Success),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn service(
        settings: SchedulerSettings,
    ) -> (SchedulerService, Arc<ServiceContext>, Arc<MockDnsProvider>) {
        service_with_acme(settings, AcmeScript::Succeed).await
    }

    async fn service_with_acme(
        settings: SchedulerSettings,
        acme: AcmeScript,
    ) -> (SchedulerService, Arc<ServiceContext>, Arc<MockDnsProvider>) {
        let (ctx, _) = create_test_context();
        let client = Arc::new(
            MockDnsProvider::new("mock")
                .with_zone("example.com")
                .with_record("example.com", "www", RecordType::A, "1.2.3.4"),
        );
        add_provider(&ctx, "p1", client.clone()).await;
        add_domain(&ctx, "d1", "example.com", "p1").await;
        ctx.ddns_repository().save(&config("auto", DdnsMode::Auto)).await.unwrap();
        ctx.ddns_repository().save(&config("manual", DdnsMode::Manual)).await.unwrap();

        let storage = std::env::temp_dir();
        let svc = SchedulerService::new(
            Arc::new(Scheduler::new()),
            Arc::new(SyncService::new(ctx.clone())),
            Arc::new(DdnsService::new(
                ctx.clone(),
                Arc::new(MockIpResolver::new(Some("1.2.3.4"))),
                &DdnsSettings::default(),
            )),
            Arc::new(CertificateService::new(
                ctx.clone(),
                Arc::new(MockAcmeRunner::new(acme)),
                CertificateSettings::default(),
                &storage,
                "dnsflow".to_string(),
            )),
            settings,
        );
        (svc, ctx, client)
    }

    #[tokio::test(start_paused = true)]
    async fn start_registers_fixed_and_ddns_jobs() {
        let (svc, _, _) = service(SchedulerSettings::default()).await;
        svc.start().await.unwrap();
        svc.start().await.unwrap();

        assert_eq!(
            svc.scheduler().job_keys(),
            vec![
                CHECK_CERTIFICATES_JOB.to_string(),
                "ddns_update_auto".to_string(),
                SYNC_DOMAINS_JOB.to_string(),
            ]
        );
        assert_eq!(
            svc.scheduler().interval_of("ddns_update_auto"),
            Some(Duration::from_secs(120))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_scheduler_registers_nothing() {
        let settings = SchedulerSettings {
            enabled: false,
            ..SchedulerSettings::default()
        };
        let (svc, _, _) = service(settings).await;
        svc.start().await.unwrap();
        svc.schedule_ddns(&config("auto", DdnsMode::Auto));
        assert!(svc.scheduler().job_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_ddns_follows_config_state() {
        let (svc, _, _) = service(SchedulerSettings::default()).await;
        svc.start().await.unwrap();

        let mut cfg = config("auto", DdnsMode::Auto);
        cfg.interval_secs = 600;
        svc.schedule_ddns(&cfg);
        assert_eq!(
            svc.scheduler().interval_of("ddns_update_auto"),
            Some(Duration::from_secs(600))
        );

        cfg.enabled = false;
        svc.schedule_ddns(&cfg);
        assert!(!svc.scheduler().has_job("ddns_update_auto"));

        svc.schedule_ddns(&config("other", DdnsMode::Auto));
        svc.unschedule_ddns("other");
        assert!(!svc.scheduler().has_job("ddns_update_other"));
    }

    #[tokio::test(start_paused = true)]
    async fn triggered_sync_reaches_the_provider() {
        let (svc, ctx, client) = service(SchedulerSettings::default()).await;
        svc.start().await.unwrap();

        svc.trigger(SYNC_DOMAINS_JOB).unwrap().await.unwrap();
        assert!(client.calls().contains(&crate::test_utils::MockCall::ListZones));
        let domain = ctx.domain_repository().find_by_name("example.com").await.unwrap().unwrap();
        assert_eq!(ctx.record_repository().find_by_domain(&domain.id).await.unwrap().len(), 1);

        svc.shutdown().await;
        assert!(svc.scheduler().job_keys().is_empty());
        assert!(!svc.is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_waits_for_acme_teardown() {
        let acme = AcmeScript::UntilCancelled {
            teardown: Duration::from_secs(4),
        };
        let (svc, ctx, _) = service_with_acme(SchedulerSettings::default(), acme).await;
        let now = Utc::now();
        let mut cert = crate::types::Certificate {
            id: "c1".to_string(),
            domain_id: "d1".to_string(),
            name: "www.example.com".to_string(),
            kind: crate::types::CertificateKind::Single,
            status: crate::types::CertificateStatus::Valid,
            issuer: None,
            subject: None,
            serial_number: None,
            not_before: Some(now - chrono::Duration::days(80)),
            not_after: Some(now + chrono::Duration::days(10)),
            auto_renew: true,
            renewal_days: 30,
            last_renewed_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        ctx.certificate_repository().save(&cert).await.unwrap();
        svc.start().await.unwrap();

        drop(svc.trigger(CHECK_CERTIFICATES_JOB).unwrap());
        tokio::task::yield_now().await;
        svc.shutdown().await;

        cert = ctx.certificate_repository().find_by_id("c1").await.unwrap().unwrap();
        assert_eq!(cert.status, crate::types::CertificateStatus::Invalid);
        assert!(cert.last_error.unwrap().contains("cancelled"));
    }
}
