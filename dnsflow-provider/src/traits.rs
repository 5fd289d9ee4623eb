use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{ProviderRecord, ProviderZone, RecordInput};

/// Vendor error as it came off the wire, before mapping.
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// Vendor error code, format differs per vendor.
    pub code: Option<String>,
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// What the caller was operating on when the vendor error happened.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    pub record_name: Option<String>,
    pub record_id: Option<String>,
    pub domain: Option<String>,
}

impl ErrorContext {
    pub fn zone(domain: &str) -> Self {
        Self {
            domain: Some(domain.to_string()),
            ..Self::default()
        }
    }

    pub fn record(domain: &str, record_name: Option<&str>, record_id: Option<&str>) -> Self {
        Self {
            domain: Some(domain.to_string()),
            record_name: record_name.map(str::to_string),
            record_id: record_id.map(str::to_string),
        }
    }
}

/// Maps vendor error codes onto [`ProviderError`]. One impl per vendor.
pub(crate) trait ProviderErrorMapper {
    fn provider_name(&self) -> &'static str;

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// The capability surface every DNS vendor client exposes.
///
/// Zones are addressed by name. Implementations resolve the vendor's zone id
/// internally when the API needs one. Record names in [`RecordInput`] and
/// [`ProviderRecord`] are relative to the zone.
///
/// List operations walk every page before returning.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Stable provider identifier (`aliyun`, `huaweicloud`, ...).
    fn id(&self) -> &'static str;

    async fn list_zones(&self) -> Result<Vec<ProviderZone>>;

    async fn list_records(&self, zone_name: &str) -> Result<Vec<ProviderRecord>>;

    /// Creates a record and returns its provider-assigned id.
    async fn create_record(&self, zone_name: &str, input: &RecordInput) -> Result<String>;

    async fn update_record(
        &self,
        zone_name: &str,
        record_id: &str,
        input: &RecordInput,
    ) -> Result<()>;

    async fn delete_record(&self, zone_name: &str, record_id: &str) -> Result<()>;

    /// Probes the credentials with a cheap authenticated read.
    async fn test_connection(&self) -> Result<()> {
        self.list_zones().await.map(|_| ())
    }
}
