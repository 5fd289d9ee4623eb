use anyhow::Result;
use dnsflow_app::AppState;

use crate::output::print_json;

pub async fn run(state: &AppState, provider: Option<&str>) -> Result<()> {
    if let Some(provider_id) = provider {
        let report = state.sync_service.sync_provider(provider_id).await?;
        return print_json(&report);
    }

    let outcomes = state.sync_service.sync_all().await?;
    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    print_json(&outcomes)?;
    if failed > 0 {
        anyhow::bail!("{failed} of {} providers failed to sync", outcomes.len());
    }
    Ok(())
}
