//! Storage layer abstraction trait definition

mod certificate_repository;
mod ddns_repository;
mod domain_repository;
mod provider_registry;
mod provider_repository;

pub use certificate_repository::CertificateRepository;
pub use ddns_repository::DdnsRepository;
pub use domain_repository::{DomainRepository, RecordRepository};
pub use provider_registry::{InMemoryProviderRegistry, ProviderRegistry};
pub use provider_repository::ProviderRepository;
