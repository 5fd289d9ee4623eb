//! 腾讯云 `DNSPod` Provider (API 3.0)

mod error;
mod http;
mod provider;
mod sign;
mod types;

use reqwest::Client;

use crate::error::Result;
use crate::http_client::READ_RETRIES;
use crate::providers::common::create_http_client;

pub(crate) const DNSPOD_API_HOST: &str = "dnspod.tencentcloudapi.com";
pub(crate) const DNSPOD_SERVICE: &str = "dnspod";
pub(crate) const DNSPOD_VERSION: &str = "2021-03-23";
pub(crate) const CONTENT_TYPE: &str = "application/json; charset=utf-8";
/// Record line used for every write ("default").
pub(crate) const DEFAULT_RECORD_LINE: &str = "默认";
pub(crate) const PAGE_SIZE: u32 = 100;

/// 腾讯云 `DNSPod` client.
pub struct DnspodProvider {
    pub(crate) client: Client,
    pub(crate) secret_id: String,
    pub(crate) secret_key: String,
    pub(crate) max_retries: u32,
}

pub struct DnspodProviderBuilder {
    secret_id: String,
    secret_key: String,
    max_retries: u32,
}

impl DnspodProviderBuilder {
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn build(self) -> Result<DnspodProvider> {
        Ok(DnspodProvider {
            client: create_http_client("dnspod")?,
            secret_id: self.secret_id,
            secret_key: self.secret_key,
            max_retries: self.max_retries,
        })
    }
}

impl DnspodProvider {
    pub fn new(secret_id: String, secret_key: String) -> Result<Self> {
        Self::builder(secret_id, secret_key).build()
    }

    pub fn builder(secret_id: String, secret_key: String) -> DnspodProviderBuilder {
        DnspodProviderBuilder {
            secret_id,
            secret_key,
            max_retries: READ_RETRIES,
        }
    }
}
