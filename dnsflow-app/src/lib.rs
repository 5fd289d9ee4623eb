//! Application bootstrap for dnsflow.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter
//! injection), the `SQLite` store and config file loading.

pub mod adapters;
pub mod config;

use std::path::PathBuf;
use std::sync::Arc;

use dnsflow_core::config::AppConfig;
use dnsflow_core::error::{CoreError, CoreResult};
use dnsflow_core::services::{
    AcmeRunner, CertbotRunner, CertificateService, ChallengeHookService, DdnsService,
    HickoryTxtResolver, HttpIpResolver, IpResolver, ProviderService, RecordService,
    SchedulerService, ServiceContext, SyncService, TxtResolver,
};
use dnsflow_core::traits::{
    CertificateRepository, DdnsRepository, DomainRepository, InMemoryProviderRegistry,
    ProviderRegistry, ProviderRepository, RecordRepository,
};
use dnsflow_core::types::{CreateDdnsRequest, DdnsConfig, UpdateDdnsRequest};
use dnsflow_core::Scheduler;

/// Program name handed to the ACME client as the hook command.
pub const DEFAULT_HOOK_COMMAND: &str = "dnsflow";

/// Application state.
///
/// Holds all services and the `ServiceContext`. The CLI constructs this
/// once per invocation via `AppStateBuilder`.
pub struct AppState {
    pub config: AppConfig,
    /// Service context (holds all storage adapters)
    pub ctx: Arc<ServiceContext>,
    pub provider_service: ProviderService,
    pub record_service: RecordService,
    pub sync_service: Arc<SyncService>,
    pub ddns_service: Arc<DdnsService>,
    pub certificate_service: Arc<CertificateService>,
    pub challenge_hooks: ChallengeHookService,
    pub scheduler: SchedulerService,
}

impl AppState {
    /// Register the periodic jobs (daemon mode).
    pub async fn start_scheduler(&self) -> CoreResult<()> {
        self.scheduler.start().await
    }

    /// Stop every job and terminate in-flight ACME runs, waiting for them
    /// to record their outcome.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    /// Create a DDNS configuration and schedule it when the scheduler runs.
    pub async fn create_ddns(&self, request: CreateDdnsRequest) -> CoreResult<DdnsConfig> {
        let config = self.ddns_service.create_config(request).await?;
        self.scheduler.schedule_ddns(&config);
        Ok(config)
    }

    pub async fn update_ddns(
        &self,
        config_id: &str,
        request: UpdateDdnsRequest,
    ) -> CoreResult<DdnsConfig> {
        let config = self.ddns_service.update_config(config_id, request).await?;
        self.scheduler.schedule_ddns(&config);
        Ok(config)
    }

    pub async fn delete_ddns(&self, config_id: &str) -> CoreResult<()> {
        self.ddns_service.delete_config(config_id).await?;
        self.scheduler.unschedule_ddns(config_id);
        Ok(())
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - the five repositories, either one by one or via [`Self::store`]
///
/// # Optional
/// - `config`: defaults to `AppConfig::default()`
/// - `provider_registry`: defaults to `InMemoryProviderRegistry`
/// - `ip_resolver`: defaults to `HttpIpResolver` over the configured endpoints
/// - `acme_runner`: defaults to `CertbotRunner`
/// - `txt_resolver`: defaults to `HickoryTxtResolver`
/// - `certificate_root`: defaults to the configured or platform data path
/// - `hook_command`: defaults to [`DEFAULT_HOOK_COMMAND`]
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<AppConfig>,
    provider_repository: Option<Arc<dyn ProviderRepository>>,
    domain_repository: Option<Arc<dyn DomainRepository>>,
    record_repository: Option<Arc<dyn RecordRepository>>,
    ddns_repository: Option<Arc<dyn DdnsRepository>>,
    certificate_repository: Option<Arc<dyn CertificateRepository>>,
    provider_registry: Option<Arc<dyn ProviderRegistry>>,
    ip_resolver: Option<Arc<dyn IpResolver>>,
    acme_runner: Option<Arc<dyn AcmeRunner>>,
    txt_resolver: Option<Arc<dyn TxtResolver>>,
    certificate_root: Option<PathBuf>,
    hook_command: Option<String>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use one store for every repository.
    #[must_use]
    pub fn store<S>(self, store: Arc<S>) -> Self
    where
        S: ProviderRepository
            + DomainRepository
            + RecordRepository
            + DdnsRepository
            + CertificateRepository
            + 'static,
    {
        self.provider_repository(store.clone())
            .domain_repository(store.clone())
            .record_repository(store.clone())
            .ddns_repository(store.clone())
            .certificate_repository(store)
    }

    #[must_use]
    pub fn provider_repository(mut self, repo: Arc<dyn ProviderRepository>) -> Self {
        self.provider_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn domain_repository(mut self, repo: Arc<dyn DomainRepository>) -> Self {
        self.domain_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn record_repository(mut self, repo: Arc<dyn RecordRepository>) -> Self {
        self.record_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn ddns_repository(mut self, repo: Arc<dyn DdnsRepository>) -> Self {
        self.ddns_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn certificate_repository(mut self, repo: Arc<dyn CertificateRepository>) -> Self {
        self.certificate_repository = Some(repo);
        self
    }

    #[must_use]
    pub fn provider_registry(mut self, registry: Arc<dyn ProviderRegistry>) -> Self {
        self.provider_registry = Some(registry);
        self
    }

    #[must_use]
    pub fn ip_resolver(mut self, resolver: Arc<dyn IpResolver>) -> Self {
        self.ip_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn acme_runner(mut self, runner: Arc<dyn AcmeRunner>) -> Self {
        self.acme_runner = Some(runner);
        self
    }

    /// Resolver the auth hook polls for challenge propagation.
    #[must_use]
    pub fn txt_resolver(mut self, resolver: Arc<dyn TxtResolver>) -> Self {
        self.txt_resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn certificate_root(mut self, root: PathBuf) -> Self {
        self.certificate_root = Some(root);
        self
    }

    #[must_use]
    pub fn hook_command(mut self, command: impl Into<String>) -> Self {
        self.hook_command = Some(command.into());
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if a repository is missing, and
    /// `CoreError::ConfigError` if the configuration is invalid.
    pub fn build(self) -> CoreResult<AppState> {
        fn required<T: ?Sized>(value: Option<Arc<T>>, name: &str) -> CoreResult<Arc<T>> {
            value.ok_or_else(|| CoreError::ValidationError(format!("{name} is required")))
        }

        let config = self.config.unwrap_or_default();
        config.validate()?;

        let provider_repository = required(self.provider_repository, "provider_repository")?;
        let domain_repository = required(self.domain_repository, "domain_repository")?;
        let record_repository = required(self.record_repository, "record_repository")?;
        let ddns_repository = required(self.ddns_repository, "ddns_repository")?;
        let certificate_repository =
            required(self.certificate_repository, "certificate_repository")?;
        let provider_registry = self
            .provider_registry
            .unwrap_or_else(|| Arc::new(InMemoryProviderRegistry::new()));

        let ip_resolver: Arc<dyn IpResolver> = match self.ip_resolver {
            Some(resolver) => resolver,
            None => Arc::new(HttpIpResolver::new(&config.ddns)?),
        };
        let acme_runner: Arc<dyn AcmeRunner> = self
            .acme_runner
            .unwrap_or_else(|| Arc::new(CertbotRunner::new(&config.certificate)));
        let txt_resolver: Arc<dyn TxtResolver> = self
            .txt_resolver
            .unwrap_or_else(|| Arc::new(HickoryTxtResolver::new()));
        let certificate_root = match self.certificate_root {
            Some(root) => root,
            None => config::resolve_paths(&config)?.certificate_root,
        };
        let hook_command = self
            .hook_command
            .unwrap_or_else(|| DEFAULT_HOOK_COMMAND.to_string());

        let ctx = Arc::new(ServiceContext::new(
            provider_repository,
            domain_repository,
            record_repository,
            ddns_repository,
            certificate_repository,
            provider_registry,
        ));

        let sync_service = Arc::new(SyncService::new(Arc::clone(&ctx)));
        let ddns_service = Arc::new(DdnsService::new(
            Arc::clone(&ctx),
            ip_resolver,
            &config.ddns,
        ));
        let certificate_service = Arc::new(CertificateService::new(
            Arc::clone(&ctx),
            acme_runner,
            config.certificate.clone(),
            &certificate_root,
            hook_command,
        ));
        let scheduler = SchedulerService::new(
            Arc::new(Scheduler::new()),
            Arc::clone(&sync_service),
            Arc::clone(&ddns_service),
            Arc::clone(&certificate_service),
            config.scheduler.clone(),
        );

        Ok(AppState {
            provider_service: ProviderService::new(Arc::clone(&ctx)),
            record_service: RecordService::new(Arc::clone(&ctx)),
            challenge_hooks: ChallengeHookService::new(
                Arc::clone(&ctx),
                txt_resolver,
                config.certificate.propagation_check(),
            ),
            ctx,
            sync_service,
            ddns_service,
            certificate_service,
            scheduler,
            config,
        })
    }
}
