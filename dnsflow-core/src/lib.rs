//! dnsflow Core Library
//!
//! 平台无关的业务逻辑层，包括：
//! - Provider 管理与连接检查 (Provider Service)
//! - 远端 zone 与本地记录的对账同步 (Sync Service)
//! - DNS 记录管理 (Record Service)
//! - DDNS 更新 (DDNS Service)
//! - 基于 DNS-01 的证书签发与续期 (Certificate Service / Challenge Hooks)
//! - 周期任务调度 (Scheduler)
//!
//! Storage is abstracted behind the repository traits in [`traits`]; the
//! `dnsflow-app` crate supplies the SQLite implementation.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::AppConfig;
pub use error::{CoreError, CoreResult};
pub use scheduler::Scheduler;
pub use services::ServiceContext;
pub use traits::{
    CertificateRepository, DdnsRepository, DomainRepository, ProviderRegistry,
    ProviderRepository, RecordRepository,
};
