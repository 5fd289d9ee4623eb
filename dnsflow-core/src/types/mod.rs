//! 类型定义模块

mod certificate;
mod ddns;
mod domain;
mod provider;
mod record;

pub use certificate::{
    Certificate, CertificateKind, CertificateMetadata, CertificateStatus, RenewalSummary,
};
pub use ddns::{
    CreateDdnsRequest, DdnsBatchResult, DdnsConfig, DdnsLog, DdnsMode, DdnsStatus, DdnsSummary,
    DdnsUpdateResult, UpdateDdnsRequest,
};
pub use domain::Domain;
pub use provider::{CreateProviderRequest, Provider, ProviderStatus, UpdateProviderRequest};
pub use record::{CreateRecordRequest, Record, RecordKey, UpdateRecordRequest, MAX_TTL, MIN_TTL};

// Re-export provider 库的公共类型
pub use dnsflow_provider::{
    ProviderCredentials, ProviderRecord, ProviderType, ProviderZone, RecordInput, RecordType,
};
