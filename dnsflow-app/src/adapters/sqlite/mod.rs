//! SQLite-based unified store using `SeaORM`.
//!
//! A single `SqliteStore` implements every repository trait of the core
//! crate, backed by a local `SQLite` database file.

mod certificate_repo;
mod ddns_repo;
mod domain_repo;
pub(crate) mod entity;
mod migration;
mod provider_repo;
mod record_repo;

use std::path::Path;

use chrono::{DateTime, Utc};
use dnsflow_core::error::{CoreError, CoreResult};
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use migration::Migrator;

/// SQLite-based store shared by the CLI and the daemon.
///
/// Timestamps are stored as RFC 3339 strings and enums as their lowercase
/// identifiers, so the file stays readable with the `sqlite3` shell.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and bring the schema up
    /// to date.
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        let store = Self { db };

        // Ensure schema is up to date before the store is used.
        Migrator::up(&store.db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        Ok(store)
    }
}

pub(crate) fn storage_err(action: &str) -> impl FnOnce(DbErr) -> CoreError + '_ {
    move |e| CoreError::StorageError(format!("Failed to {action}: {e}"))
}

pub(crate) fn parse_time(value: &str, field: &str) -> CoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CoreError::SerializationError(format!("Invalid {field}: {e}")))
}

pub(crate) fn parse_opt_time(value: Option<&str>, field: &str) -> CoreResult<Option<DateTime<Utc>>> {
    value.map(|v| parse_time(v, field)).transpose()
}

/// Parses a stored enum identifier with the type's own `parse`.
pub(crate) fn parse_enum<T>(value: &str, field: &str, parse: fn(&str) -> Option<T>) -> CoreResult<T> {
    parse(value).ok_or_else(|| CoreError::SerializationError(format!("Invalid {field}: {value}")))
}
