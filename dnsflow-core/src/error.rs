//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

pub use dnsflow_provider::ProviderError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Provider (configured account) not found
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("DDNS config not found: {0}")]
    DdnsConfigNotFound(String),

    #[error("Certificate not found: {0}")]
    CertificateNotFound(String),

    /// Malformed input, rejected before any remote call
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Ownership or uniqueness conflict (zone owned elsewhere, duplicate key)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    /// Every IP-echo endpoint failed
    #[error("IP discovery failed: {0}")]
    IpDiscovery(String),

    /// The ACME client ran past its wall-clock budget and was terminated
    #[error("ACME client timed out after {secs}s")]
    AcmeTimeout { secs: u64 },

    /// The ACME client exited unsuccessfully
    #[error("ACME client failed (exit code {exit_code:?}): {message}")]
    AcmeFailed {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("ACME client cancelled")]
    AcmeCancelled,

    /// The ACME client needs to run with elevated privileges
    #[error("ACME client requires elevated privileges: {0}")]
    ElevatedPrivileges(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ProviderNotFound(_)
            | Self::DomainNotFound(_)
            | Self::RecordNotFound(_)
            | Self::DdnsConfigNotFound(_)
            | Self::CertificateNotFound(_)
            | Self::ValidationError(_)
            | Self::Conflict(_)
            | Self::IpDiscovery(_)
            | Self::AcmeCancelled
            | Self::ElevatedPrivileges(_) => true,
            Self::Provider(e) => e.is_expected(),
            _ => false,
        }
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
