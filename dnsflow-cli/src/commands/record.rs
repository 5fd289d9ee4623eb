use anyhow::Result;
use dnsflow_app::AppState;
use dnsflow_core::types::{CreateRecordRequest, UpdateRecordRequest};

use super::resolve_domain;
use crate::cli::RecordCommand;
use crate::output::print_json;

pub async fn run(state: &AppState, command: RecordCommand) -> Result<()> {
    let service = &state.record_service;
    match command {
        RecordCommand::List { domain } => {
            let domain = resolve_domain(state, &domain).await?;
            print_json(&service.list_records(&domain.id).await?)
        }
        RecordCommand::Add(args) => {
            let domain = resolve_domain(state, &args.domain).await?;
            let record = service
                .create_record(CreateRecordRequest {
                    domain_id: domain.id,
                    name: args.name,
                    record_type: args.record_type,
                    value: args.value,
                    ttl: args.ttl,
                    priority: args.priority,
                })
                .await?;
            print_json(&record)
        }
        RecordCommand::Update(args) => {
            let record = service
                .update_record(
                    &args.id,
                    UpdateRecordRequest {
                        value: args.value,
                        ttl: args.ttl,
                        priority: args.priority,
                        enabled: args.enabled,
                    },
                )
                .await?;
            print_json(&record)
        }
        RecordCommand::Remove { id } => {
            service.delete_record(&id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
