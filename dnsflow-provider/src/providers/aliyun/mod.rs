//! 阿里云 DNS Provider (RPC API, HMAC-SHA1 signature v1.0)

mod error;
mod http;
mod provider;
mod sign;
mod types;

use reqwest::Client;

use crate::error::Result;
use crate::http_client::READ_RETRIES;
use crate::providers::common::create_http_client;

pub(crate) const ALIYUN_DNS_ENDPOINT: &str = "https://alidns.aliyuncs.com";
pub(crate) const ALIYUN_DNS_VERSION: &str = "2015-01-09";
/// `DescribeDomains` caps pages at 100.
pub(crate) const PAGE_SIZE: u32 = 100;

/// Aliyun DNS client.
///
/// ```rust,no_run
/// use dnsflow_provider::AliyunProvider;
///
/// let provider = AliyunProvider::new(
///     "your-access-key-id".to_string(),
///     "your-access-key-secret".to_string(),
/// )?;
/// # Ok::<(), dnsflow_provider::ProviderError>(())
/// ```
pub struct AliyunProvider {
    pub(crate) client: Client,
    pub(crate) endpoint: String,
    pub(crate) access_key_id: String,
    pub(crate) access_key_secret: String,
    pub(crate) max_retries: u32,
}

/// Builder for [`AliyunProvider`].
pub struct AliyunProviderBuilder {
    access_key_id: String,
    access_key_secret: String,
    endpoint: String,
    max_retries: u32,
}

impl AliyunProviderBuilder {
    /// Retries for list calls (default 2). Mutations are never retried.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Overrides the API endpoint, e.g. a regional one.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn build(self) -> Result<AliyunProvider> {
        Ok(AliyunProvider {
            client: create_http_client("aliyun")?,
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            access_key_id: self.access_key_id,
            access_key_secret: self.access_key_secret,
            max_retries: self.max_retries,
        })
    }
}

impl AliyunProvider {
    pub fn new(access_key_id: String, access_key_secret: String) -> Result<Self> {
        Self::builder(access_key_id, access_key_secret).build()
    }

    pub fn builder(access_key_id: String, access_key_secret: String) -> AliyunProviderBuilder {
        AliyunProviderBuilder {
            access_key_id,
            access_key_secret,
            endpoint: ALIYUN_DNS_ENDPOINT.to_string(),
            max_retries: READ_RETRIES,
        }
    }
}
