//! # dnsflow-provider
//!
//! Signed API clients for the DNS vendors dnsflow manages, behind one
//! zone/record capability interface.
//!
//! | Provider | Feature Flag | Auth Method |
//! |----------|-------------|-------------|
//! | Aliyun DNS | `aliyun` | RPC signature (HMAC-SHA1) |
//! | Huawei Cloud DNS | `huaweicloud` | SDK-HMAC-SHA256 |
//! | Tencent Cloud `DNSPod` | `dnspod` | TC3-HMAC-SHA256 |
//! | Cloudflare | `cloudflare` | Bearer Token |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dnsflow_provider::{create_provider, ProviderCredentials, ProviderType, RecordInput, RecordType};
//!
//! # async fn run() -> dnsflow_provider::Result<()> {
//! let credentials = ProviderCredentials::from_parts(ProviderType::Aliyun, "ak", "sk")?;
//! let provider = create_provider(credentials)?;
//! provider.test_connection().await?;
//!
//! for zone in provider.list_zones().await? {
//!     let records = provider.list_records(&zone.name).await?;
//!     println!("{}: {} records", zone.name, records.len());
//! }
//!
//! let id = provider
//!     .create_record("example.com", &RecordInput::new("home", RecordType::A, "203.0.113.7"))
//!     .await?;
//! provider.delete_record("example.com", &id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`ProviderError`]. Vendor error codes are mapped
//! onto shared variants; unmapped codes surface as
//! [`ProviderError::Unknown`] with the raw code kept. Reads retry transient
//! failures (`NetworkError`, `Timeout`, `RateLimited`) with exponential
//! backoff, mutations are sent once.

mod error;
mod factory;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

pub use error::{ProviderError, Result};

pub use factory::create_provider;

pub use traits::DnsProvider;

pub use types::{
    MULTI_VALUE_SEPARATOR, ProviderCredentials, ProviderRecord, ProviderType, ProviderZone,
    RecordInput, RecordType,
};

pub use utils::log_sanitizer;

#[cfg(feature = "cloudflare")]
pub use providers::CloudflareProvider;

#[cfg(feature = "aliyun")]
pub use providers::{AliyunProvider, AliyunProviderBuilder};

#[cfg(feature = "dnspod")]
pub use providers::{DnspodProvider, DnspodProviderBuilder};

#[cfg(feature = "huaweicloud")]
pub use providers::{HuaweicloudProvider, HuaweicloudProviderBuilder};
