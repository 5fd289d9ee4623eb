use anyhow::Result;
use dnsflow_app::AppState;
use dnsflow_core::types::{CreateProviderRequest, UpdateProviderRequest};

use crate::cli::ProviderCommand;
use crate::output::print_json;

pub async fn run(state: &AppState, command: ProviderCommand) -> Result<()> {
    let service = &state.provider_service;
    match command {
        ProviderCommand::Add(args) => {
            let provider = service
                .create_provider(CreateProviderRequest {
                    name: args.name,
                    provider_type: args.provider_type,
                    access_key: args.access_key,
                    secret_key: args.secret_key,
                    region: args.region,
                })
                .await?;
            print_json(&provider)
        }
        ProviderCommand::List => print_json(&service.list_providers().await?),
        ProviderCommand::Test { id } => {
            let provider = service.test_connection(&id).await?;
            print_json(&provider)
        }
        ProviderCommand::Update(args) => {
            let provider = service
                .update_provider(
                    &args.id,
                    UpdateProviderRequest {
                        name: args.name,
                        access_key: args.access_key,
                        secret_key: args.secret_key,
                        region: args.region,
                        enabled: args.enabled,
                    },
                )
                .await?;
            print_json(&provider)
        }
        ProviderCommand::Remove { id } => {
            service.delete_provider(&id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
