//! Cloudflare DnsProvider 实现

use async_trait::async_trait;
use reqwest::Method;

use crate::error::{ProviderError, Result};
use crate::providers::common::{full_name_to_relative, relative_to_full_name, same_zone};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{ProviderRecord, ProviderZone, RecordInput, RecordType};

use super::types::{CloudflareDnsRecord, CloudflareZone, DnsRecordBody, IdOnly};
use super::{CloudflareProvider, RECORDS_PAGE_SIZE, ZONES_PAGE_SIZE};

impl CloudflareProvider {
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        if let Some(id) = self.zone_ids.get(zone_name) {
            return Ok(id);
        }
        let zones = self.list_zones().await?;
        zones
            .into_iter()
            .find(|z| same_zone(&z.name, zone_name))
            .map(|z| z.id)
            .ok_or_else(|| ProviderError::DomainNotFound {
                provider: self.provider_name().to_string(),
                domain: zone_name.to_string(),
                raw_message: None,
            })
    }

    pub(crate) fn convert_record(zone_name: &str, record: CloudflareDnsRecord) -> Option<ProviderRecord> {
        let record_type = RecordType::parse(&record.record_type)?;
        Some(ProviderRecord {
            id: record.id,
            name: full_name_to_relative(&record.name, zone_name),
            record_type,
            value: record.content,
            ttl: record.ttl,
            priority: if record_type == RecordType::Mx {
                record.priority
            } else {
                None
            },
            status: "active".to_string(),
        })
    }

    pub(crate) fn record_body(zone_name: &str, input: &RecordInput) -> DnsRecordBody {
        DnsRecordBody {
            record_type: input.record_type.as_str().to_string(),
            name: relative_to_full_name(&input.name, zone_name),
            content: input.value.clone(),
            ttl: input.ttl,
            proxied: false,
            priority: if input.record_type == RecordType::Mx {
                input.priority
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        let mut zones = Vec::new();
        let mut page = 1u32;
        loop {
            let (batch, total_pages): (Vec<CloudflareZone>, _) = self
                .get(
                    &format!("/zones?page={page}&per_page={ZONES_PAGE_SIZE}"),
                    ErrorContext::default(),
                )
                .await?;

            let fetched = batch.len();
            for zone in batch {
                self.zone_ids.insert(&zone.name, &zone.id);
                zones.push(ProviderZone {
                    id: zone.id,
                    name: zone.name,
                    status: zone.status,
                    ttl: None,
                });
            }

            if fetched == 0 || page >= total_pages.unwrap_or(page) {
                break;
            }
            page += 1;
        }
        Ok(zones)
    }

    async fn list_records(&self, zone_name: &str) -> Result<Vec<ProviderRecord>> {
        let zone_id = self.zone_id(zone_name).await?;
        let mut records = Vec::new();
        let mut page = 1u32;
        loop {
            let (batch, total_pages): (Vec<CloudflareDnsRecord>, _) = self
                .get(
                    &format!(
                        "/zones/{zone_id}/dns_records?page={page}&per_page={RECORDS_PAGE_SIZE}"
                    ),
                    ErrorContext::zone(zone_name),
                )
                .await?;

            let fetched = batch.len();
            records.extend(
                batch
                    .into_iter()
                    .filter_map(|r| Self::convert_record(zone_name, r)),
            );

            if fetched == 0 || page >= total_pages.unwrap_or(page) {
                break;
            }
            page += 1;
        }
        Ok(records)
    }

    async fn create_record(&self, zone_name: &str, input: &RecordInput) -> Result<String> {
        let zone_id = self.zone_id(zone_name).await?;
        let (created, _): (IdOnly, _) = self
            .call(
                Method::POST,
                &format!("/zones/{zone_id}/dns_records"),
                Some(&Self::record_body(zone_name, input)),
                ErrorContext::record(zone_name, Some(&input.name), None),
            )
            .await?;
        Ok(created.id)
    }

    async fn update_record(
        &self,
        zone_name: &str,
        record_id: &str,
        input: &RecordInput,
    ) -> Result<()> {
        let zone_id = self.zone_id(zone_name).await?;
        let _: (IdOnly, _) = self
            .call(
                Method::PUT,
                &format!("/zones/{zone_id}/dns_records/{record_id}"),
                Some(&Self::record_body(zone_name, input)),
                ErrorContext::record(zone_name, Some(&input.name), Some(record_id)),
            )
            .await?;
        Ok(())
    }

    async fn delete_record(&self, zone_name: &str, record_id: &str) -> Result<()> {
        let zone_id = self.zone_id(zone_name).await?;
        let _: (IdOnly, _) = self
            .call::<IdOnly, ()>(
                Method::DELETE,
                &format!("/zones/{zone_id}/dns_records/{record_id}"),
                None,
                ErrorContext::record(zone_name, None, Some(record_id)),
            )
            .await?;
        Ok(())
    }

    /// `/user/tokens/verify` is cheaper than listing zones.
    async fn test_connection(&self) -> Result<()> {
        let _: (serde_json::Value, _) = self
            .get("/user/tokens/verify", ErrorContext::default())
            .await?;
        Ok(())
    }
}
