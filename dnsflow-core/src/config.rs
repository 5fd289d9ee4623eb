//! Runtime configuration.
//!
//! Every field has a default so an empty (or missing) config file is valid.
//! Paths left unset are resolved by the application layer against the
//! platform data directory.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::services::PropagationCheck;

/// Lower bound for any DDNS update interval.
pub const MIN_DDNS_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub scheduler: SchedulerSettings,
    pub ddns: DdnsSettings,
    pub certificate: CertificateSettings,
}

impl AppConfig {
    /// Rejects values that would make the scheduler or the engines misbehave.
    pub fn validate(&self) -> CoreResult<()> {
        if self.scheduler.sync_interval_secs == 0 {
            return Err(CoreError::ConfigError(
                "scheduler.sync_interval_secs must be positive".to_string(),
            ));
        }
        if self.scheduler.certificate_check_interval_secs == 0 {
            return Err(CoreError::ConfigError(
                "scheduler.certificate_check_interval_secs must be positive".to_string(),
            ));
        }
        if self.ddns.min_interval_secs < MIN_DDNS_INTERVAL_SECS {
            return Err(CoreError::ConfigError(format!(
                "ddns.min_interval_secs must be at least {MIN_DDNS_INTERVAL_SECS}"
            )));
        }
        if self.ddns.ipv4_endpoints.is_empty() && self.ddns.ipv6_endpoints.is_empty() {
            return Err(CoreError::ConfigError(
                "at least one IP-echo endpoint is required".to_string(),
            ));
        }
        if self.certificate.process_timeout_secs == 0 {
            return Err(CoreError::ConfigError(
                "certificate.process_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `SQLite` file. Defaults to `<data dir>/dnsflow/dnsflow.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `dnsflow_core=debug,info`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub sync_interval_secs: u64,
    pub certificate_check_interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sync_interval_secs: 900,
            certificate_check_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DdnsSettings {
    /// Plain-text IPv4 echo endpoints, tried in order.
    pub ipv4_endpoints: Vec<String>,
    /// Plain-text IPv6 echo endpoints, tried in order.
    pub ipv6_endpoints: Vec<String>,
    /// Per-endpoint timeout.
    pub lookup_timeout_secs: u64,
    pub min_interval_secs: u64,
}

impl DdnsSettings {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

impl Default for DdnsSettings {
    fn default() -> Self {
        Self {
            ipv4_endpoints: [
                "https://api.ipify.org",
                "https://ipv4.icanhazip.com",
                "https://api.ip.sb/ip",
                "https://ifconfig.me/ip",
                "https://checkip.amazonaws.com",
            ]
            .map(String::from)
            .to_vec(),
            ipv6_endpoints: [
                "https://api6.ipify.org",
                "https://ipv6.icanhazip.com",
                "https://api-ipv6.ip.sb/ip",
            ]
            .map(String::from)
            .to_vec(),
            lookup_timeout_secs: 5,
            min_interval_secs: MIN_DDNS_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CertificateSettings {
    /// ACME client executable.
    pub acme_client: String,
    /// Root for the persistent ACME config dir. Defaults to
    /// `<data dir>/dnsflow/certificates`.
    pub storage_path: Option<PathBuf>,
    pub process_timeout_secs: u64,
    /// Time between SIGTERM and SIGKILL.
    pub terminate_grace_secs: u64,
    /// Time to wait for the process to be reaped after SIGKILL.
    pub kill_wait_secs: u64,
    /// How long the auth hook waits for the TXT record to propagate.
    pub propagation_wait_secs: u64,
    /// Pause between TXT lookups while waiting.
    pub dns_check_interval_secs: u64,
    /// Validity assumed when the issued certificate cannot be parsed.
    pub validity_days: i64,
    /// Renewal lead window for new certificates.
    pub renewal_days: i64,
    pub auto_renewal_enabled: bool,
    /// ACME account email; registration happens without one when unset.
    pub email: Option<String>,
    /// Issuer assumed when the issued certificate cannot be parsed.
    pub default_issuer: String,
}

impl CertificateSettings {
    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    /// `propagation_wait_secs = 0` turns the check off.
    pub fn propagation_check(&self) -> PropagationCheck {
        PropagationCheck::new(
            Duration::from_secs(self.propagation_wait_secs),
            Duration::from_secs(self.dns_check_interval_secs),
        )
    }

    /// Upper bound for an ACME run to wind down once cancelled.
    pub fn teardown_limit(&self) -> Duration {
        Duration::from_secs(self.terminate_grace_secs + self.kill_wait_secs + 1)
    }
}

impl Default for CertificateSettings {
    fn default() -> Self {
        Self {
            acme_client: "certbot".to_string(),
            storage_path: None,
            process_timeout_secs: 600,
            terminate_grace_secs: 5,
            kill_wait_secs: 2,
            propagation_wait_secs: 30,
            dns_check_interval_secs: 10,
            validity_days: 90,
            renewal_days: 30,
            auto_renewal_enabled: true,
            email: None,
            default_issuer: "Let's Encrypt".to_string(),
        }
    }
}
