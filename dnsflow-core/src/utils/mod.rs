//! Utility modules.

pub mod domain_name;
