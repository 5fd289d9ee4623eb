//! 华为云错误映射
//!
//! <https://support.huaweicloud.com/api-dns/ErrorCode.html>
//!
//! Health checks, VPC zones, PTR and DNSSEC codes are not mapped and fall
//! through to `Unknown`.

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::HuaweicloudProvider;

impl HuaweicloudProvider {
    fn invalid(&self, param: &str, detail: String) -> ProviderError {
        ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: param.to_string(),
            detail,
        }
    }
}

impl ProviderErrorMapper for HuaweicloudProvider {
    fn provider_name(&self) -> &'static str {
        "huaweicloud"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            // 认证
            Some(
                "APIGW.0301" | "APIGW.0101" | "APIGW.0303" | "APIGW.0305" | "DNS.0005"
                | "DNS.0013" | "DNS.0040",
            ) => ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            },

            Some("APIGW.0302" | "APIGW.0306" | "DNS.0030" | "DNS.1802") => {
                ProviderError::PermissionDenied {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            // 流控
            Some("APIGW.0308") => ProviderError::RateLimited {
                provider,
                retry_after: None,
                raw_message: Some(raw.message),
            },

            Some("DNS.0403" | "DNS.0404" | "DNS.2002") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            Some("DNS.0312" | "DNS.0335" | "DNS.0016") => ProviderError::RecordExists {
                provider,
                record_name: context.record_name.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            Some("DNS.0313" | "DNS.0004") => ProviderError::RecordNotFound {
                provider,
                record_id: context.record_id.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            Some("DNS.0302" | "DNS.0101" | "DNS.1206") => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            // 暂停 / 冻结
            Some("DNS.0213" | "DNS.0214" | "DNS.0209" | "DNS.2003" | "DNS.2005" | "DNS.2006") => {
                ProviderError::DomainLocked {
                    provider,
                    domain: context.domain.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            Some("DNS.0303" | "DNS.0319") => self.invalid("ttl", raw.message),
            Some("DNS.0307") => self.invalid("type", raw.message),
            Some("DNS.0308") => self.invalid("value", raw.message),
            Some("DNS.0304" | "DNS.0202" | "DNS.0321") => self.invalid("name", raw.message),
            Some("DNS.0309") => self.invalid("record_id", raw.message),

            // Backend dependency outages on Huawei's side.
            Some("APIGW.0201" | "DNS.0012" | "DNS.0015" | "DNS.0022" | "DNS.0036") => {
                ProviderError::NetworkError {
                    provider,
                    detail: raw.message,
                }
            }

            _ => self.unknown_error(raw),
        }
    }
}
