//! DNS-01 challenge hooks.
//!
//! The ACME client invokes `dnsflow hook auth` / `dnsflow hook cleanup`
//! once per validated name; both resolve the owning zone locally and talk
//! to that zone's provider.

use std::sync::Arc;

use chrono::Utc;
use dnsflow_provider::{ProviderError, RecordInput, RecordType};

use crate::error::{CoreError, CoreResult};
use crate::services::{PropagationCheck, ServiceContext, TxtResolver};
use crate::types::{Domain, Record, RecordKey};
use crate::utils::domain_name::{
    acme_challenge_name, longest_zone_match, normalize_zone, registrable_guess, relative_name,
};

const CHALLENGE_TTL: u32 = 300;

/// Name and token handed to a hook by the ACME client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTarget {
    pub domain: String,
    pub token: String,
}

impl ChallengeTarget {
    /// Reads `DOMAIN` / `VALIDATION_TOKEN`, falling back to certbot's
    /// `CERTBOT_DOMAIN` / `CERTBOT_VALIDATION`.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |primary: &str, fallback: &str| {
            lookup(primary)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| lookup(fallback).filter(|v| !v.trim().is_empty()))
                .map(|v| v.trim().to_string())
                .ok_or_else(|| {
                    CoreError::ValidationError(format!("{primary} (or {fallback}) is not set"))
                })
        };
        Ok(Self {
            domain: read("DOMAIN", "CERTBOT_DOMAIN")?,
            token: read("VALIDATION_TOKEN", "CERTBOT_VALIDATION")?,
        })
    }

    pub fn record_name(&self) -> String {
        acme_challenge_name(&self.domain)
    }
}

pub struct ChallengeHookService {
    ctx: Arc<ServiceContext>,
    resolver: Arc<dyn TxtResolver>,
    propagation: PropagationCheck,
}

impl ChallengeHookService {
    #[must_use]
    pub fn new(
        ctx: Arc<ServiceContext>,
        resolver: Arc<dyn TxtResolver>,
        propagation: PropagationCheck,
    ) -> Self {
        Self {
            ctx,
            resolver,
            propagation,
        }
    }

    /// The locally known domain owning `name`.
    async fn owning_domain(&self, name: &str) -> CoreResult<Domain> {
        let domains = self.ctx.domain_repository().find_all().await?;
        if let Some(zone) = longest_zone_match(name, domains.iter().map(|d| d.name.as_str())) {
            let zone = zone.to_string();
            if let Some(domain) = domains.into_iter().find(|d| d.name == zone) {
                return Ok(domain);
            }
        }

        let guess = registrable_guess(name);
        self.ctx
            .domain_repository()
            .find_by_name(&guess)
            .await?
            .ok_or_else(|| CoreError::DomainNotFound(normalize_zone(name)))
    }

    /// Publishes the challenge TXT record, then waits until it resolves.
    ///
    /// A record that is still invisible when the wait runs out is left to
    /// the ACME server to validate.
    pub async fn auth(&self, target: &ChallengeTarget) -> CoreResult<Record> {
        let fqdn = target.record_name();
        let domain = self.owning_domain(&target.domain).await?;
        let key = RecordKey::new(&relative_name(&fqdn, &domain.name), RecordType::Txt);
        log::info!("Publishing {fqdn} TXT in zone {}", domain.name);

        let client = self.ctx.client_for_domain(&domain).await?;
        let input = RecordInput::new(&key.name, RecordType::Txt, &target.token).with_ttl(CHALLENGE_TTL);
        let upserted = async {
            let existing = client
                .list_records(&domain.name)
                .await?
                .into_iter()
                .find(|r| RecordKey::new(&r.name, r.record_type) == key);
            match existing {
                Some(r) => client
                    .update_record(&domain.name, &r.id, &input)
                    .await
                    .map(|()| r.id),
                None => client.create_record(&domain.name, &input).await,
            }
        }
        .await;
        let external_id = match upserted {
            Ok(id) => id,
            Err(e) => return Err(self.ctx.handle_provider_error(&domain.provider_id, e).await),
        };

        let now = Utc::now();
        let record = {
            let _guard = self.ctx.lock_domain(&domain.name).await;
            let record = match self.ctx.record_repository().find_by_key(&domain.id, &key).await? {
                Some(mut existing) => {
                    existing.value.clone_from(&target.token);
                    existing.external_id = Some(external_id);
                    existing.updated_at = now;
                    existing
                }
                None => Record {
                    id: uuid::Uuid::new_v4().to_string(),
                    domain_id: domain.id.clone(),
                    name: key.name.clone(),
                    record_type: RecordType::Txt,
                    value: target.token.clone(),
                    ttl: CHALLENGE_TTL,
                    priority: None,
                    enabled: true,
                    external_id: Some(external_id),
                    created_at: now,
                    updated_at: now,
                },
            };
            self.ctx.record_repository().save(&record).await?;
            record
        };

        if !self.propagation.is_disabled() {
            log::info!(
                "Waiting up to {}s for {fqdn} to propagate",
                self.propagation.timeout.as_secs()
            );
            self.propagation
                .wait_for_txt(self.resolver.as_ref(), &fqdn, &target.token)
                .await;
        }
        Ok(record)
    }

    /// Removes the challenge TXT record remotely and locally.
    pub async fn cleanup(&self, target: &ChallengeTarget) -> CoreResult<()> {
        let fqdn = target.record_name();
        let domain = self.owning_domain(&target.domain).await?;
        let key = RecordKey::new(&relative_name(&fqdn, &domain.name), RecordType::Txt);
        let local = self
            .ctx
            .record_repository()
            .find_by_key(&domain.id, &key)
            .await?;

        let client = self.ctx.client_for_domain(&domain).await?;
        let removed = async {
            if let Some(external_id) = local.as_ref().and_then(|r| r.external_id.as_deref()) {
                return client.delete_record(&domain.name, external_id).await;
            }
            // Not tracked locally: find it remotely by name and type.
            let stale: Vec<String> = client
                .list_records(&domain.name)
                .await?
                .into_iter()
                .filter(|r| RecordKey::new(&r.name, r.record_type) == key)
                .map(|r| r.id)
                .collect();
            for id in stale {
                client.delete_record(&domain.name, &id).await?;
            }
            Ok::<(), ProviderError>(())
        }
        .await;
        if let Err(e) = removed {
            return Err(self.ctx.handle_provider_error(&domain.provider_id, e).await);
        }

        if let Some(record) = local {
            let _guard = self.ctx.lock_domain(&domain.name).await;
            self.ctx.record_repository().delete(&record.id).await?;
        }
        log::info!("Removed {fqdn} TXT from zone {}", domain.name);
        Ok(())
    }
}
