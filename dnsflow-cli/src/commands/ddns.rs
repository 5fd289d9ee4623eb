use anyhow::{bail, Result};
use chrono::Utc;
use dnsflow_app::AppState;
use dnsflow_core::types::{CreateDdnsRequest, UpdateDdnsRequest};

use super::resolve_domain;
use crate::cli::DdnsCommand;
use crate::output::print_json;

pub async fn run(state: &AppState, command: DdnsCommand) -> Result<()> {
    let service = &state.ddns_service;
    match command {
        DdnsCommand::Add(args) => {
            let domain = resolve_domain(state, &args.domain).await?;
            let config = state
                .create_ddns(CreateDdnsRequest {
                    name: args.name,
                    domain_id: domain.id,
                    subdomain: args.subdomain,
                    record_type: args.record_type,
                    interval_secs: args.interval,
                    mode: args.mode,
                })
                .await?;
            print_json(&config)
        }
        DdnsCommand::List => print_json(&service.list_configs().await?),
        DdnsCommand::Edit(args) => {
            let config = state
                .update_ddns(
                    &args.id,
                    UpdateDdnsRequest {
                        name: args.name,
                        interval_secs: args.interval,
                        mode: args.mode,
                        enabled: args.enabled,
                    },
                )
                .await?;
            print_json(&config)
        }
        DdnsCommand::Update { id, force } => {
            let result = service.update_one(&id, force).await?;
            print_json(&result)?;
            if !result.is_success() {
                bail!("DDNS update failed: {}", result.message);
            }
            Ok(())
        }
        DdnsCommand::UpdateAll { force } => {
            let result = service.update_all(force).await?;
            print_json(&result)?;
            if result.failed_count > 0 {
                bail!("{} DDNS updates failed", result.failed_count);
            }
            Ok(())
        }
        DdnsCommand::Remove { id } => {
            state.delete_ddns(&id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        DdnsCommand::Logs { id, limit } => print_json(&service.list_logs(&id, limit).await?),
        DdnsCommand::Summary => print_json(&service.status_summary(Utc::now()).await?),
    }
}
