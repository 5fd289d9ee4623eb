use anyhow::Result;
use chrono::Utc;
use dnsflow_app::AppState;

use super::resolve_domain;
use crate::cli::CertCommand;
use crate::output::print_json;

pub async fn run(state: &AppState, command: CertCommand) -> Result<()> {
    let service = &state.certificate_service;
    match command {
        CertCommand::Request {
            domain,
            name,
            no_auto_renew,
        } => {
            let domain = resolve_domain(state, &domain).await?;
            let certificate = service
                .request_certificate(&domain.id, &name, !no_auto_renew)
                .await?;
            print_json(&certificate)
        }
        CertCommand::Renew { id } => print_json(&service.renew(&id).await?),
        CertCommand::List => print_json(&service.list_certificates().await?),
        CertCommand::Check => {
            let now = Utc::now();
            let certificates = service.refresh_statuses(now).await?;
            let renewal = service.renew_due(now).await?;
            print_json(&serde_json::json!({
                "certificates": certificates,
                "renewal": renewal,
            }))
        }
        CertCommand::Expiring { days } => {
            print_json(&service.list_expiring(Utc::now(), days).await?)
        }
        CertCommand::Remove { id } => {
            service.delete_certificate(&id).await?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
