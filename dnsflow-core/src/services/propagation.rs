//! DNS 传播检查
//!
//! After the auth hook publishes a challenge, the TXT record is queried
//! until the token shows up or the wait runs out.

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use tokio::time::Instant;

use crate::error::{CoreError, CoreResult};

/// Resolves TXT records for propagation checks.
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Every TXT string published at `name`; an empty list when none are.
    async fn txt_values(&self, name: &str) -> CoreResult<Vec<String>>;
}

/// Queries the public resolvers hickory ships as its default configuration.
///
/// A fresh resolver is built per lookup so a cached negative answer never
/// hides a record that has just been published.
#[derive(Debug, Default)]
pub struct HickoryTxtResolver;

impl HickoryTxtResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn txt_values(&self, name: &str) -> CoreResult<Vec<String>> {
        let mut opts = ResolverOpts::default();
        opts.cache_size = 0;
        let resolver = TokioResolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        )
        .with_options(opts)
        .build();

        let fqdn = format!("{}.", name.trim_end_matches('.'));
        match resolver.txt_lookup(fqdn.as_str()).await {
            Ok(response) => Ok(response
                .iter()
                .map(|txt| {
                    txt.iter()
                        .map(|data| String::from_utf8_lossy(data).to_string())
                        .collect::<String>()
                })
                .collect()),
            Err(e) if e.is_no_records_found() => Ok(Vec::new()),
            Err(e) => Err(CoreError::NetworkError(format!("TXT lookup for {name} failed: {e}"))),
        }
    }
}

/// How long to wait for a challenge and how often to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationCheck {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PropagationCheck {
    /// Never polls faster than once per second.
    const MIN_INTERVAL: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(Self::MIN_INTERVAL),
        }
    }

    /// No waiting at all.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Self::MIN_INTERVAL)
    }

    pub fn is_disabled(&self) -> bool {
        self.timeout.is_zero()
    }

    /// Polls `name` until one of its TXT values equals `token`.
    ///
    /// Returns `false` once the timeout passes; lookup errors count as
    /// "not visible yet".
    pub async fn wait_for_txt(&self, resolver: &dyn TxtResolver, name: &str, token: &str) -> bool {
        let deadline = Instant::now() + self.timeout;
        loop {
            match resolver.txt_values(name).await {
                Ok(values) if values.iter().any(|v| v == token) => {
                    log::info!("{name} TXT is visible");
                    return true;
                }
                Ok(_) => log::debug!("{name} TXT not visible yet"),
                Err(e) => log::debug!("{e}"),
            }

            let now = Instant::now();
            if now >= deadline {
                log::warn!(
                    "{name} TXT still not visible after {}s",
                    self.timeout.as_secs()
                );
                return false;
            }
            tokio::time::sleep(self.interval.min(deadline - now)).await;
        }
    }
}
