//! Config file loading and default path resolution.

use std::path::{Path, PathBuf};

use dnsflow_core::config::AppConfig;
use dnsflow_core::error::{CoreError, CoreResult};

const APP_DIR: &str = "dnsflow";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "dnsflow.db";
const CERTIFICATES_DIR: &str = "certificates";

/// `<config dir>/dnsflow/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// `<data dir>/dnsflow`
pub fn default_data_dir() -> CoreResult<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| CoreError::ConfigError("Cannot determine the data directory".to_string()))
}

/// Parses a TOML document. Missing keys take their defaults.
pub fn parse_config(text: &str) -> CoreResult<AppConfig> {
    let config: AppConfig =
        toml::from_str(text).map_err(|e| CoreError::ConfigError(format!("Invalid config: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration.
///
/// An explicit `path` must exist. Without one the default location is
/// tried, and a missing default file means all defaults.
pub fn load_config(path: Option<&Path>) -> CoreResult<AppConfig> {
    let (path, required) = match path {
        Some(p) => (Some(p.to_path_buf()), true),
        None => (default_config_path(), false),
    };

    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            log::debug!("Loading config from {}", path.display());
            parse_config(&text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(e) => Err(CoreError::ConfigError(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

/// Filesystem locations after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub database: PathBuf,
    /// Root of the ACME client's persistent state
    pub certificate_root: PathBuf,
}

pub fn resolve_paths(config: &AppConfig) -> CoreResult<ResolvedPaths> {
    let database = match &config.database.path {
        Some(p) => p.clone(),
        None => default_data_dir()?.join(DATABASE_FILE),
    };
    let certificate_root = match &config.certificate.storage_path {
        Some(p) => p.clone(),
        None => default_data_dir()?.join(CERTIFICATES_DIR),
    };
    Ok(ResolvedPaths {
        database,
        certificate_root,
    })
}
