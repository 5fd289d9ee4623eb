use serde::{Deserialize, Serialize};

/// Error returned by every provider operation.
///
/// Every variant names the provider that produced it. Variants that originate
/// from a vendor API response keep the vendor's raw message (and code, where
/// the vendor has one) so callers can surface it verbatim.
///
/// `NetworkError`, `Timeout` and `RateLimited` are transient. Read calls retry
/// them with backoff; mutations never do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// Connection failure, DNS failure or a 502/503/504 from the vendor edge.
    NetworkError { provider: String, detail: String },

    /// Credentials rejected (bad key, bad signature, expired token).
    InvalidCredentials {
        provider: String,
        raw_message: Option<String>,
    },

    /// Vendor rejected a duplicate name/type pair.
    RecordExists {
        provider: String,
        record_name: String,
        raw_message: Option<String>,
    },

    RecordNotFound {
        provider: String,
        record_id: String,
        raw_message: Option<String>,
    },

    /// A request parameter was rejected (TTL, value format, name, ...).
    InvalidParameter {
        provider: String,
        param: String,
        detail: String,
    },

    UnsupportedRecordType {
        provider: String,
        record_type: String,
    },

    /// Account quota exhausted. Not transient.
    QuotaExceeded {
        provider: String,
        raw_message: Option<String>,
    },

    /// HTTP 429 or a vendor throttling code.
    RateLimited {
        provider: String,
        retry_after: Option<u64>,
        raw_message: Option<String>,
    },

    Timeout { provider: String, detail: String },

    /// The zone does not exist at the provider (or is not visible to the key).
    DomainNotFound {
        provider: String,
        domain: String,
        raw_message: Option<String>,
    },

    /// The zone is locked, suspended or flagged.
    DomainLocked {
        provider: String,
        domain: String,
        raw_message: Option<String>,
    },

    PermissionDenied {
        provider: String,
        raw_message: Option<String>,
    },

    /// The response did not have the expected shape.
    ParseError { provider: String, detail: String },

    SerializationError { provider: String, detail: String },

    /// Vendor error code without a dedicated mapping.
    Unknown {
        provider: String,
        raw_code: Option<String>,
        raw_message: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// `true` 使用 `warn` 级别，`false` 使用 `error` 级别。
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::RecordExists { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::UnsupportedRecordType { .. }
                | Self::QuotaExceeded { .. }
                | Self::DomainNotFound { .. }
                | Self::DomainLocked { .. }
                | Self::PermissionDenied { .. }
        )
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Name of the provider that produced the error.
    pub fn provider(&self) -> &str {
        match self {
            Self::NetworkError { provider, .. }
            | Self::InvalidCredentials { provider, .. }
            | Self::RecordExists { provider, .. }
            | Self::RecordNotFound { provider, .. }
            | Self::InvalidParameter { provider, .. }
            | Self::UnsupportedRecordType { provider, .. }
            | Self::QuotaExceeded { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::DomainNotFound { provider, .. }
            | Self::DomainLocked { provider, .. }
            | Self::PermissionDenied { provider, .. }
            | Self::ParseError { provider, .. }
            | Self::SerializationError { provider, .. }
            | Self::Unknown { provider, .. } => provider,
        }
    }

    /// Vendor error code, only kept for codes without a dedicated variant.
    pub fn raw_code(&self) -> Option<&str> {
        match self {
            Self::Unknown { raw_code, .. } => raw_code.as_deref(),
            _ => None,
        }
    }

    /// Vendor message, when the error came from an API response.
    pub fn raw_message(&self) -> Option<&str> {
        match self {
            Self::InvalidCredentials { raw_message, .. }
            | Self::RecordExists { raw_message, .. }
            | Self::RecordNotFound { raw_message, .. }
            | Self::QuotaExceeded { raw_message, .. }
            | Self::RateLimited { raw_message, .. }
            | Self::DomainNotFound { raw_message, .. }
            | Self::DomainLocked { raw_message, .. }
            | Self::PermissionDenied { raw_message, .. } => raw_message.as_deref(),
            Self::InvalidParameter { detail, .. } => Some(detail),
            Self::Unknown { raw_message, .. } => Some(raw_message),
            _ => None,
        }
    }
}

fn write_with_message(
    f: &mut std::fmt::Formatter<'_>,
    head: std::fmt::Arguments<'_>,
    raw_message: Option<&String>,
) -> std::fmt::Result {
    match raw_message {
        Some(msg) => write!(f, "{head}: {msg}"),
        None => write!(f, "{head}"),
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{provider}] Invalid credentials"),
                raw_message.as_ref(),
            ),
            Self::RecordExists {
                provider,
                record_name,
                ..
            } => write!(f, "[{provider}] Record '{record_name}' already exists"),
            Self::RecordNotFound {
                provider,
                record_id,
                ..
            } => write!(f, "[{provider}] Record '{record_id}' not found"),
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => write!(f, "[{provider}] Invalid parameter '{param}': {detail}"),
            Self::UnsupportedRecordType {
                provider,
                record_type,
            } => write!(f, "[{provider}] Unsupported record type: {record_type}"),
            Self::QuotaExceeded {
                provider,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{provider}] Quota exceeded"),
                raw_message.as_ref(),
            ),
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => match retry_after {
                Some(secs) => write!(f, "[{provider}] Rate limited (retry after {secs}s)"),
                None => write!(f, "[{provider}] Rate limited"),
            },
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::DomainNotFound {
                provider,
                domain,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{provider}] Domain '{domain}' not found"),
                raw_message.as_ref(),
            ),
            Self::DomainLocked {
                provider,
                domain,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{provider}] Domain '{domain}' is locked"),
                raw_message.as_ref(),
            ),
            Self::PermissionDenied {
                provider,
                raw_message,
            } => write_with_message(
                f,
                format_args!("[{provider}] Permission denied"),
                raw_message.as_ref(),
            ),
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Serialization error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_code,
                raw_message,
            } => match raw_code {
                Some(code) if !code.is_empty() => write!(f, "[{provider}] {code}: {raw_message}"),
                _ => write!(f, "[{provider}] {raw_message}"),
            },
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
