//! `DNSPod` 错误映射
//!
//! <https://cloud.tencent.com/document/api/1427/56192>

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::DnspodProvider;

/// Returned by `DescribeRecordList` for a zone with no records.
pub(crate) const NO_DATA_OF_RECORD: &str = "ResourceNotFound.NoDataOfRecord";

impl ProviderErrorMapper for DnspodProvider {
    fn provider_name(&self) -> &'static str {
        "dnspod"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        let code = raw.code.as_deref().unwrap_or_default();

        if code.starts_with("AuthFailure")
            || matches!(
                code,
                "InvalidParameter.InvalidSecretId" | "InvalidParameter.InvalidSignature"
            )
        {
            return ProviderError::InvalidCredentials {
                provider,
                raw_message: Some(raw.message),
            };
        }

        match code {
            "RequestLimitExceeded"
            | "RequestLimitExceeded.RequestLimitExceeded"
            | "FailedOperation.FrequencyLimit"
            | "InvalidParameter.OperationIsTooFrequent" => ProviderError::RateLimited {
                provider,
                retry_after: None,
                raw_message: Some(raw.message),
            },

            c if c.starts_with("LimitExceeded") => ProviderError::QuotaExceeded {
                provider,
                raw_message: Some(raw.message),
            },

            "InvalidParameter.DomainRecordExist" => ProviderError::RecordExists {
                provider,
                record_name: context.record_name.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            NO_DATA_OF_RECORD | "InvalidParameter.RecordIdInvalid" => {
                ProviderError::RecordNotFound {
                    provider,
                    record_id: context.record_id.unwrap_or_default(),
                    raw_message: Some(raw.message),
                }
            }

            "ResourceNotFound.NoDataOfDomain"
            | "InvalidParameterValue.DomainNotExists"
            | "InvalidParameter.DomainInvalid" => ProviderError::DomainNotFound {
                provider,
                domain: context.domain.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            "FailedOperation.DomainIsLocked"
            | "FailedOperation.DomainIsSpam"
            | "FailedOperation.AccountIsLocked" => ProviderError::DomainLocked {
                provider,
                domain: context.domain.unwrap_or_default(),
                raw_message: Some(raw.message),
            },

            c if c.starts_with("OperationDenied")
                || c == "UnauthorizedOperation"
                || c == "FailedOperation.NotDomainOwner" =>
            {
                ProviderError::PermissionDenied {
                    provider,
                    raw_message: Some(raw.message),
                }
            }

            "InvalidParameter.RecordTypeInvalid" => ProviderError::InvalidParameter {
                provider,
                param: "type".to_string(),
                detail: raw.message,
            },
            "InvalidParameter.RecordValueInvalid"
            | "InvalidParameter.RecordValueLengthInvalid"
            | "InvalidParameter.MxInvalid" => ProviderError::InvalidParameter {
                provider,
                param: "value".to_string(),
                detail: raw.message,
            },
            "InvalidParameter.SubDomainInvalid" => ProviderError::InvalidParameter {
                provider,
                param: "name".to_string(),
                detail: raw.message,
            },
            "InvalidParameter.RecordLineInvalid" => ProviderError::InvalidParameter {
                provider,
                param: "line".to_string(),
                detail: raw.message,
            },

            _ => self.unknown_error(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(code: &str) -> ProviderError {
        DnspodProvider::new("id".to_string(), "key".to_string())
            .unwrap()
            .map_error(
                RawApiError::with_code(code, "msg"),
                ErrorContext::record("example.com", Some("www"), Some("42")),
            )
    }

    #[test]
    fn auth_failures() {
        assert!(matches!(
            map("AuthFailure.SignatureFailure"),
            ProviderError::InvalidCredentials { .. }
        ));
        assert!(matches!(
            map("AuthFailure.SecretIdNotFound"),
            ProviderError::InvalidCredentials { .. }
        ));
    }

    #[test]
    fn rate_limit_before_quota() {
        assert!(map("RequestLimitExceeded").is_transient());
        assert!(matches!(
            map("LimitExceeded.SubdomainLevelLimit"),
            ProviderError::QuotaExceeded { .. }
        ));
    }

    #[test]
    fn empty_record_list_maps_to_record_not_found() {
        assert!(matches!(
            map(NO_DATA_OF_RECORD),
            ProviderError::RecordNotFound { ref record_id, .. } if record_id == "42"
        ));
    }

    #[test]
    fn fallback_keeps_code() {
        assert_eq!(map("FailedOperation.Whatever").raw_code(), Some("FailedOperation.Whatever"));
    }
}
