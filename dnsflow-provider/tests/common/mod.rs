//! Helpers for the live provider tests.

#![allow(dead_code)]

use std::env;
use std::sync::Arc;

use dnsflow_provider::{DnsProvider, ProviderCredentials, ProviderType, create_provider};

/// Returns early from the test when any of the variables is missing.
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("skipping: {} is not set", $var);
                return;
            }
        )+
    };
}

/// `_dnsflow-test-xxxxxxxx`, unique per call.
pub fn test_record_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("_dnsflow-test-{}", &id[..8])
}

pub struct LiveContext {
    pub provider: Arc<dyn DnsProvider>,
    pub zone: String,
}

impl LiveContext {
    /// Builds a provider from `<PREFIX>_ACCESS_KEY`, `<PREFIX>_SECRET_KEY` and
    /// `TEST_DOMAIN`.
    pub fn from_env(provider_type: ProviderType, prefix: &str) -> Option<Self> {
        let access_key = env::var(format!("{prefix}_ACCESS_KEY")).unwrap_or_default();
        let secret_key = env::var(format!("{prefix}_SECRET_KEY")).ok()?;
        let zone = env::var("TEST_DOMAIN").ok()?;

        let credentials =
            ProviderCredentials::from_parts(provider_type, &access_key, &secret_key).ok()?;
        let provider = create_provider(credentials).ok()?;
        Some(Self { provider, zone })
    }

    /// Deletes every record this test suite may have left behind.
    pub async fn cleanup(&self) {
        if let Ok(records) = self.provider.list_records(&self.zone).await {
            for record in records {
                if record.name.starts_with("_dnsflow-test-") {
                    let _ = self.provider.delete_record(&self.zone, &record.id).await;
                }
            }
        }
    }
}
