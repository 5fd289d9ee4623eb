//! One module per command group.

mod cert;
mod ddns;
mod hook;
mod provider;
mod record;
mod serve;
mod sync;

use anyhow::{bail, Result};
use dnsflow_app::AppState;
use dnsflow_core::types::Domain;

use crate::cli::Command;
use crate::output::print_json;

pub async fn run(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Serve => serve::run(state).await,
        Command::Provider(cmd) => provider::run(state, cmd).await,
        Command::Domains => {
            let domains = state.ctx.domain_repository().find_all().await?;
            print_json(&domains)
        }
        Command::Sync { provider } => sync::run(state, provider.as_deref()).await,
        Command::Record(cmd) => record::run(state, cmd).await,
        Command::Ddns(cmd) => ddns::run(state, cmd).await,
        Command::Cert(cmd) => cert::run(state, cmd).await,
        Command::Hook(cmd) => hook::run(state, cmd).await,
    }
}

/// Looks a domain up by name first, then by id.
async fn resolve_domain(state: &AppState, key: &str) -> Result<Domain> {
    let repo = state.ctx.domain_repository();
    let name = key.trim().trim_end_matches('.').to_lowercase();
    if let Some(domain) = repo.find_by_name(&name).await? {
        return Ok(domain);
    }
    if let Some(domain) = repo.find_by_id(key).await? {
        return Ok(domain);
    }
    bail!("domain '{key}' is not known locally, run `dnsflow sync` first")
}
