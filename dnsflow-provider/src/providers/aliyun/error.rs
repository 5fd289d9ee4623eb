//! 阿里云错误码映射
//!
//! <https://api.aliyun.com/document/Alidns/2015-01-09/errorCode>

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::AliyunProvider;

impl ProviderErrorMapper for AliyunProvider {
    fn provider_name(&self) -> &'static str {
        "aliyun"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        let invalid = |param: &str, detail: String| ProviderError::InvalidParameter {
            provider: self.provider_name().to_string(),
            param: param.to_string(),
            detail,
        };

        match raw.code.as_deref() {
            Some(
                "InvalidAccessKeyId.NotFound"
                | "InvalidAccessKeyId"
                | "SignatureDoesNotMatch"
                | "IncompleteSignature",
            ) => ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            },

            Some("DomainRecordDuplicate" | "DomainRecordConflict") => ProviderError::RecordExists {
                provider,
                record_name: context.record_name.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            Some(
                "DomainRecordNotBelongToUser" | "InvalidRecordId.NotFound" | "InvalidRR.NoExist",
            ) => ProviderError::RecordNotFound {
                provider,
                record_id: context.record_id.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            Some("InvalidDomainName.NoExist" | "DomainNotFound" | "IncorrectDomainUser") => {
                ProviderError::DomainNotFound {
                    provider,
                    domain: context.domain.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            Some(code) if code.starts_with("QuotaExceeded") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            Some("Throttling" | "Throttling.User" | "Throttling.Api") => {
                ProviderError::RateLimited {
                    provider,
                    retry_after: None,
                    raw_message: Some(raw.message),
                }
            }

            Some("DomainRecordLocked" | "DomainExpiredDNSForbidden" | "Forbidden.DomainExpired") => {
                ProviderError::DomainLocked {
                    provider,
                    domain: context.domain.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            Some("Forbidden" | "Forbidden.RAM" | "Forbidden.RiskControl" | "IllegalUser") => {
                ProviderError::PermissionDenied {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            Some("InvalidRR.TypeEmpty" | "SubDomainInvalid.Type") => invalid("type", raw.message),
            Some("InvalidRR.AValue" | "InvalidRR.AAAAValue" | "InvalidRR.MXValue" | "InvalidRR.NSValue") => {
                invalid("value", raw.message)
            }
            Some("InvalidRR.RrEmpty" | "InvalidRR.Format" | "InvalidRR.Length") => {
                invalid("rr", raw.message)
            }
            Some("SubDomainInvalid.TTL") => invalid("ttl", raw.message),
            Some("SubDomainInvalid.Priority") => invalid("priority", raw.message),

            _ => self.unknown_error(raw),
        }
    }
}
