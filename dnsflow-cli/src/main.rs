//! `dnsflow` entry point.
//!
//! Every invocation opens the local store, builds the service container and
//! runs one command. `serve` keeps the scheduler running until a shutdown
//! signal; `hook auth|cleanup` are re-entered by the ACME client.

mod cli;
mod commands;
mod output;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dnsflow_app::adapters::SqliteStore;
use dnsflow_app::config::{load_config, resolve_paths};
use dnsflow_app::{AppStateBuilder, DEFAULT_HOOK_COMMAND};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use output::shell_quote;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(path) = &cli.database {
        config.database.path = Some(path.clone());
    }
    init_tracing(cli.log_level.as_deref(), &config.logging.level);

    let paths = resolve_paths(&config)?;
    tracing::debug!("Using database {}", paths.database.display());
    let store = Arc::new(
        SqliteStore::new(&paths.database)
            .await
            .with_context(|| format!("Failed to open {}", paths.database.display()))?,
    );

    let state = AppStateBuilder::new()
        .hook_command(hook_command(cli.config.as_deref(), &paths.database))
        .certificate_root(paths.certificate_root)
        .config(config)
        .store(store)
        .build()?;

    commands::run(&state, cli.command).await
}

/// Logs go to stderr; stdout carries the JSON results.
///
/// `--log-level` wins over `RUST_LOG`, which wins over `logging.level`.
fn init_tracing(explicit: Option<&str>, configured: &str) {
    let filter = match explicit {
        Some(directive) => EnvFilter::try_new(directive),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(configured)),
    }
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

/// Command line the ACME client runs for its hooks, pointing back at this
/// binary and the same store.
fn hook_command(config: Option<&Path>, database: &Path) -> String {
    let program = std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| {
            log::warn!("Cannot locate the running executable ({e}), using {DEFAULT_HOOK_COMMAND}");
            DEFAULT_HOOK_COMMAND.to_string()
        });

    let mut command = shell_quote(&program);
    if let Some(config) = config {
        command.push_str(" --config ");
        command.push_str(&shell_quote(&config.display().to_string()));
    }
    command.push_str(" --database ");
    command.push_str(&shell_quote(&database.display().to_string()));
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_command_carries_store_location() {
        let command = hook_command(
            Some(Path::new("/etc/dnsflow/config.toml")),
            Path::new("/var/lib/dnsflow/dnsflow.db"),
        );
        assert!(command.ends_with(
            " --config /etc/dnsflow/config.toml --database /var/lib/dnsflow/dnsflow.db"
        ));

        let command = hook_command(None, Path::new("/srv/my data/dnsflow.db"));
        assert!(!command.contains("--config"));
        assert!(command.ends_with(" --database '/srv/my data/dnsflow.db'"));
    }
}
