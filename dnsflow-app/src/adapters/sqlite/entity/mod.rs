//! `SeaORM` entities, one per table.

pub mod certificate;
pub mod ddns_config;
pub mod ddns_log;
pub mod domain;
pub mod provider;
pub mod record;
