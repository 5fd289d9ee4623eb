//! Provider construction from stored credentials.

use std::sync::Arc;

use crate::error::Result;
use crate::traits::DnsProvider;
use crate::types::ProviderCredentials;

#[cfg(feature = "aliyun")]
use crate::providers::AliyunProvider;
#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;
#[cfg(feature = "dnspod")]
use crate::providers::DnspodProvider;
#[cfg(feature = "huaweicloud")]
use crate::providers::HuaweicloudProvider;

/// Creates a [`DnsProvider`] for the given credentials.
///
/// Fails only when the HTTP client cannot be built.
///
/// ```rust,no_run
/// use dnsflow_provider::{create_provider, ProviderCredentials};
///
/// let provider = create_provider(ProviderCredentials::Cloudflare {
///     api_token: "your-token".to_string(),
/// }).unwrap();
/// assert_eq!(provider.id(), "cloudflare");
/// ```
pub fn create_provider(credentials: ProviderCredentials) -> Result<Arc<dyn DnsProvider>> {
    let provider: Arc<dyn DnsProvider> = match credentials {
        #[cfg(feature = "aliyun")]
        ProviderCredentials::Aliyun {
            access_key_id,
            access_key_secret,
        } => Arc::new(AliyunProvider::new(access_key_id, access_key_secret)?),
        #[cfg(feature = "huaweicloud")]
        ProviderCredentials::Huaweicloud {
            access_key_id,
            secret_access_key,
        } => Arc::new(HuaweicloudProvider::new(access_key_id, secret_access_key)?),
        #[cfg(feature = "dnspod")]
        ProviderCredentials::Dnspod {
            secret_id,
            secret_key,
        } => Arc::new(DnspodProvider::new(secret_id, secret_key)?),
        #[cfg(feature = "cloudflare")]
        ProviderCredentials::Cloudflare { api_token } => {
            Arc::new(CloudflareProvider::new(api_token)?)
        }
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderType;

    #[test]
    fn factory_dispatches_on_credentials() {
        for (kind, id) in [
            (ProviderType::Aliyun, "aliyun"),
            (ProviderType::Huaweicloud, "huaweicloud"),
            (ProviderType::Dnspod, "dnspod"),
            (ProviderType::Cloudflare, "cloudflare"),
        ] {
            let creds = ProviderCredentials::from_parts(kind, "ak", "sk").unwrap();
            let provider = create_provider(creds).unwrap();
            assert_eq!(provider.id(), id);
        }
    }
}
