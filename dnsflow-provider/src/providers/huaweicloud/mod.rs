//! Huawei Cloud DNS Provider

mod error;
mod http;
mod provider;
mod sign;
mod types;

use reqwest::Client;

use crate::error::Result;
use crate::http_client::READ_RETRIES;
use crate::providers::common::{ZoneIdCache, create_http_client};

pub(crate) const HUAWEICLOUD_DNS_HOST: &str = "dns.myhuaweicloud.com";
pub(crate) const PAGE_SIZE: u32 = 500;

/// Huawei Cloud DNS client (public zones, AK/SK request signing).
///
/// ```rust,no_run
/// use dnsflow_provider::HuaweicloudProvider;
///
/// let provider = HuaweicloudProvider::new(
///     "your-access-key-id".to_string(),
///     "your-secret-access-key".to_string(),
/// )?;
/// # Ok::<(), dnsflow_provider::ProviderError>(())
/// ```
pub struct HuaweicloudProvider {
    pub(crate) client: Client,
    pub(crate) host: String,
    pub(crate) access_key_id: String,
    pub(crate) secret_access_key: String,
    pub(crate) max_retries: u32,
    pub(crate) zone_ids: ZoneIdCache,
}

/// Builder for [`HuaweicloudProvider`].
pub struct HuaweicloudProviderBuilder {
    access_key_id: String,
    secret_access_key: String,
    host: String,
    max_retries: u32,
}

impl HuaweicloudProviderBuilder {
    /// Retries for list calls (default 2).
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Regional endpoint host, e.g. `dns.ap-southeast-1.myhuaweicloud.com`.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn build(self) -> Result<HuaweicloudProvider> {
        Ok(HuaweicloudProvider {
            client: create_http_client("huaweicloud")?,
            host: self.host,
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            max_retries: self.max_retries,
            zone_ids: ZoneIdCache::new(),
        })
    }
}

impl HuaweicloudProvider {
    pub fn new(access_key_id: String, secret_access_key: String) -> Result<Self> {
        Self::builder(access_key_id, secret_access_key).build()
    }

    pub fn builder(access_key_id: String, secret_access_key: String) -> HuaweicloudProviderBuilder {
        HuaweicloudProviderBuilder {
            access_key_id,
            secret_access_key,
            host: HUAWEICLOUD_DNS_HOST.to_string(),
            max_retries: READ_RETRIES,
        }
    }
}
