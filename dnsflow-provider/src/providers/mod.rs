//! Vendor clients, one module per DNS provider.

pub(crate) mod common;

#[cfg(feature = "aliyun")]
mod aliyun;
#[cfg(feature = "cloudflare")]
mod cloudflare;
#[cfg(feature = "dnspod")]
mod dnspod;
#[cfg(feature = "huaweicloud")]
mod huaweicloud;

#[cfg(feature = "aliyun")]
pub use aliyun::{AliyunProvider, AliyunProviderBuilder};
#[cfg(feature = "cloudflare")]
pub use cloudflare::CloudflareProvider;
#[cfg(feature = "dnspod")]
pub use dnspod::{DnspodProvider, DnspodProviderBuilder};
#[cfg(feature = "huaweicloud")]
pub use huaweicloud::{HuaweicloudProvider, HuaweicloudProviderBuilder};
