//! Invoked by the ACME client as `dnsflow hook auth|cleanup`.
//!
//! The challenge comes in through the environment, not arguments.

use anyhow::Result;
use dnsflow_app::AppState;
use dnsflow_core::services::ChallengeTarget;

use crate::cli::HookCommand;
use crate::output::print_json;

pub async fn run(state: &AppState, command: HookCommand) -> Result<()> {
    let target = ChallengeTarget::from_env()?;
    match command {
        HookCommand::Auth => {
            tracing::info!("Publishing challenge for {}", target.domain);
            let record = state.challenge_hooks.auth(&target).await?;
            print_json(&record)
        }
        HookCommand::Cleanup => {
            tracing::info!("Retracting challenge for {}", target.domain);
            state.challenge_hooks.cleanup(&target).await?;
            print_json(&serde_json::json!({ "cleaned": target.record_name() }))
        }
    }
}
