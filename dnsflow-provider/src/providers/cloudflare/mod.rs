//! Cloudflare DNS Provider

mod error;
mod http;
mod provider;
mod types;

use reqwest::Client;

use crate::error::Result;
use crate::http_client::READ_RETRIES;
use crate::providers::common::{ZoneIdCache, create_http_client};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
pub(crate) const ZONES_PAGE_SIZE: u32 = 50;
pub(crate) const RECORDS_PAGE_SIZE: u32 = 100;

/// Cloudflare client authenticated with a scoped API token.
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) api_base: String,
    pub(crate) api_token: String,
    pub(crate) max_retries: u32,
    pub(crate) zone_ids: ZoneIdCache,
}

impl CloudflareProvider {
    pub fn new(api_token: String) -> Result<Self> {
        Ok(Self {
            client: create_http_client("cloudflare")?,
            api_base: CF_API_BASE.to_string(),
            api_token,
            max_retries: READ_RETRIES,
            zone_ids: ZoneIdCache::new(),
        })
    }

    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}
