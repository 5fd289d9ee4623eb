//! Cloudflare error mapping
//!
//! <https://developers.cloudflare.com/fundamentals/api/troubleshooting/>

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareProvider;

impl ProviderErrorMapper for CloudflareProvider {
    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            // 6003/6103/6111: malformed auth headers, 9109/10000: token rejected
            Some("6003" | "6103" | "6111" | "9109" | "10000") => {
                ProviderError::InvalidCredentials {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            Some("9103" | "10001") => ProviderError::PermissionDenied {
                provider,
                raw_message: Some(raw.message),
            },

            Some(code @ ("1004" | "9000" | "9005" | "9006" | "9009" | "9021")) => {
                let param = match code {
                    "9000" => "name",
                    "9005" | "9006" | "9009" => "value",
                    "9021" => "ttl",
                    _ => "record",
                };
                ProviderError::InvalidParameter {
                    provider,
                    param: param.to_string(),
                    detail: raw.message,
                }
            }

            // 81053..=81058: a conflicting record already exists
            Some("81053" | "81054" | "81055" | "81056" | "81057" | "81058") => {
                ProviderError::RecordExists {
                    provider,
                    record_name: context.record_name.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            Some("81044") => ProviderError::RecordNotFound {
                provider,
                record_id: context.record_id.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            Some("81045") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            Some("971") => ProviderError::RateLimited {
                provider,
                retry_after: None,
                raw_message: Some(raw.message),
            },

            // 7000/7003: unroutable path, usually a bad zone id
            Some("7000" | "7003" | "1001") => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            _ => self.unknown_error(raw),
        }
    }
}
