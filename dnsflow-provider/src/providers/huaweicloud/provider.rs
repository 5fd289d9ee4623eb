//! Huawei Cloud DnsProvider 实现

use async_trait::async_trait;
use reqwest::Method;

use crate::error::{ProviderError, Result};
use crate::providers::common::{
    full_name_to_relative, join_values, normalize_domain_name, quote_txt, relative_to_full_name,
    same_zone, split_values, unquote_txt,
};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{MULTI_VALUE_SEPARATOR, ProviderRecord, ProviderZone, RecordInput, RecordType};

use super::types::{
    CreateRecordSetResponse, HuaweicloudRecordSet, ListRecordSetsResponse, ListZonesResponse,
    RecordSetBody,
};
use super::{HuaweicloudProvider, PAGE_SIZE};

/// Default MX preference when a value is written without one.
const DEFAULT_MX_PRIORITY: u16 = 10;

impl HuaweicloudProvider {
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        if let Some(id) = self.zone_ids.get(zone_name) {
            return Ok(id);
        }
        // list_zones refreshes the cache as a side effect
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

    pub(crate) fn convert_record_set(
        zone_name: &str,
        rs: HuaweicloudRecordSet,
    ) -> Option<ProviderRecord> {
        let Some(record_type) = RecordType::parse(&rs.record_type) else {
            log::debug!("[huaweicloud] skipping {} record {}", rs.record_type, rs.name);
            return None;
        };

        let (value, priority) = match record_type {
            RecordType::Mx => mx_value(&rs.records),
            RecordType::Txt => (txt_value(&rs.records), None),
            _ => (join_values(&rs.records), None),
        };

        Some(ProviderRecord {
            id: rs.id,
            name: full_name_to_relative(&rs.name, zone_name),
            record_type,
            value,
            ttl: rs.ttl.unwrap_or(300),
            priority,
            status: rs.status.unwrap_or_default(),
        })
    }

    pub(crate) fn record_set_body(zone_name: &str, input: &RecordInput) -> RecordSetBody {
        let records = match input.record_type {
            RecordType::Txt => txt_records(&input.value),
            RecordType::Mx => {
                let priority = input.priority.unwrap_or(DEFAULT_MX_PRIORITY);
                split_values(&input.value)
                    .into_iter()
                    .map(|host| match split_mx(&host) {
                        Some(_) => host,
                        None => format!("{priority} {host}"),
                    })
                    .collect()
            }
            _ => split_values(&input.value),
        };

        RecordSetBody {
            name: format!("{}.", relative_to_full_name(&input.name, zone_name)),
            record_type: input.record_type.as_str().to_string(),
            ttl: input.ttl,
            records,
        }
    }
}

/// `"10 mx.example.com."` -> `(10, "mx.example.com.")`
fn split_mx(entry: &str) -> Option<(u16, &str)> {
    let (pref, host) = entry.trim().split_once(' ')?;
    let pref = pref.trim().parse::<u16>().ok()?;
    Some((pref, host.trim()))
}

/// Hosts share one priority field locally. When the set mixes
/// preferences each entry keeps its own `"<pref> <host>"` form.
fn mx_value(records: &[String]) -> (String, Option<u16>) {
    let parsed: Vec<Option<(u16, &str)>> = records.iter().map(|r| split_mx(r)).collect();
    let priority = parsed.iter().flatten().map(|(p, _)| *p).next();
    let uniform = parsed.iter().all(|p| matches!(p, Some((pref, _)) if Some(*pref) == priority));

    let values: Vec<String> = if uniform {
        parsed.iter().flatten().map(|(_, host)| (*host).to_string()).collect()
    } else {
        records.iter().map(|r| r.trim().to_string()).collect()
    };
    (join_values(&values), priority)
}

/// A single string is unquoted. Several strings stay quoted and are joined,
/// so a separator inside a string survives the round trip.
fn txt_value(records: &[String]) -> String {
    match records {
        [single] => unquote_txt(single),
        many => join_values(&many.iter().map(|r| quote_txt(r)).collect::<Vec<_>>()),
    }
}

fn txt_records(value: &str) -> Vec<String> {
    match parse_quoted_list(value) {
        Some(strings) if strings.len() > 1 => strings,
        _ => vec![quote_txt(value)],
    }
}

/// Parses `"a","b"` into its quoted parts. `None` unless the whole value
/// is such a list.
fn parse_quoted_list(value: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut rest = value.trim();
    loop {
        let body = rest.strip_prefix('"')?;
        let mut end = None;
        let mut escaped = false;
        for (i, c) in body.char_indices() {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    end = Some(i);
                    break;
                }
                _ => escaped = false,
            }
        }
        let end = end?;
        parts.push(format!("\"{}\"", &body[..end]));
        rest = body[end + 1..].trim_start();
        if rest.is_empty() {
            return Some(parts);
        }
        rest = rest.strip_prefix(MULTI_VALUE_SEPARATOR)?.trim_start();
    }
}

#[async_trait]
impl DnsProvider for HuaweicloudProvider {
    fn id(&self) -> &'static str {
        "huaweicloud"
    }

    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        let mut zones = Vec::new();
        let mut offset = 0u32;
        loop {
            let query = vec![
                ("type".to_string(), "public".to_string()),
                ("limit".to_string(), PAGE_SIZE.to_string()),
                ("offset".to_string(), offset.to_string()),
            ];
            let response: ListZonesResponse =
                self.get("/v2/zones", &query, ErrorContext::default()).await?;

            let fetched = u32::try_from(response.zones.len()).unwrap_or(u32::MAX);
            for zone in response.zones {
                self.zone_ids.insert(&zone.name, &zone.id);
                zones.push(ProviderZone {
                    id: zone.id,
                    name: normalize_domain_name(&zone.name),
                    status: zone.status.unwrap_or_default(),
                    ttl: zone.ttl,
                });
            }

            offset = offset.saturating_add(fetched);
            let total = response
                .metadata
                .and_then(|m| m.total_count)
                .unwrap_or(offset);
            if fetched == 0 || offset >= total {
                break;
            }
        }
        Ok(zones)
    }

    async fn list_records(&self, zone_name: &str) -> Result<Vec<ProviderRecord>> {
        let zone_id = self.zone_id(zone_name).await?;
        let path = format!("/v2/zones/{zone_id}/recordsets");

        let mut records = Vec::new();
        let mut offset = 0u32;
        loop {
            let query = vec![
                ("limit".to_string(), PAGE_SIZE.to_string()),
                ("offset".to_string(), offset.to_string()),
            ];
            let response: ListRecordSetsResponse = self
                .get(&path, &query, ErrorContext::zone(zone_name))
                .await?;

            let fetched = u32::try_from(response.recordsets.len()).unwrap_or(u32::MAX);
            records.extend(
                response
                    .recordsets
                    .into_iter()
                    .filter_map(|rs| Self::convert_record_set(zone_name, rs)),
            );

            offset = offset.saturating_add(fetched);
            let total = response
                .metadata
                .and_then(|m| m.total_count)
                .unwrap_or(offset);
            if fetched == 0 || offset >= total {
                break;
            }
        }
        Ok(records)
    }

    async fn create_record(&self, zone_name: &str, input: &RecordInput) -> Result<String> {
        let zone_id = self.zone_id(zone_name).await?;
        let body = Self::record_set_body(zone_name, input);
        let response: CreateRecordSetResponse = self
            .send_json(
                Method::POST,
                &format!("/v2/zones/{zone_id}/recordsets"),
                &body,
                ErrorContext::record(zone_name, Some(&input.name), None),
            )
            .await?;
        Ok(response.id)
    }

    async fn update_record(
        &self,
        zone_name: &str,
        record_id: &str,
        input: &RecordInput,
    ) -> Result<()> {
        let zone_id = self.zone_id(zone_name).await?;
        let body = Self::record_set_body(zone_name, input);
        let _: serde_json::Value = self
            .send_json(
                Method::PUT,
                &format!("/v2/zones/{zone_id}/recordsets/{record_id}"),
                &body,
                ErrorContext::record(zone_name, Some(&input.name), Some(record_id)),
            )
            .await?;
        Ok(())
    }

    async fn delete_record(&self, zone_name: &str, record_id: &str) -> Result<()> {
        let zone_id = self.zone_id(zone_name).await?;
        self.delete(
            &format!("/v2/zones/{zone_id}/recordsets/{record_id}"),
            ErrorContext::record(zone_name, None, Some(record_id)),
        )
        .await
    }
}
