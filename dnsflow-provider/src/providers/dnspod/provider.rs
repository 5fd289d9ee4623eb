//! `DNSPod` DnsProvider 实现

use async_trait::async_trait;
use serde_json::json;

use crate::error::{ProviderError, Result};
use crate::providers::common::{apex_or_name, normalize_domain_name};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{ProviderRecord, ProviderZone, RecordInput, RecordType};

use super::types::{
    CreateRecordResponse, DnspodRecord, DomainListResponse, RecordBody, RecordListResponse,
};
use super::{DEFAULT_RECORD_LINE, DnspodProvider, PAGE_SIZE};

impl DnspodProvider {
    fn parse_record_id(&self, record_id: &str) -> Result<u64> {
        record_id
            .parse::<u64>()
            .map_err(|_| ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "record_id".to_string(),
                detail: format!("'{record_id}' is not a numeric DNSPod record id"),
            })
    }

    fn record_body<'a>(
        zone_name: &'a str,
        record_id: Option<u64>,
        input: &'a RecordInput,
    ) -> RecordBody<'a> {
        RecordBody {
            domain: zone_name,
            record_id,
            sub_domain: apex_or_name(&input.name),
            record_type: input.record_type.as_str(),
            record_line: DEFAULT_RECORD_LINE,
            value: &input.value,
            ttl: input.ttl,
            mx: if input.record_type == RecordType::Mx {
                input.priority
            } else {
                None
            },
        }
    }

    pub(crate) fn convert_record(record: DnspodRecord) -> Option<ProviderRecord> {
        let (Some(id), Some(name), Some(raw_type)) =
            (record.record_id, record.name, record.record_type)
        else {
            log::debug!("[dnspod] skipping record without id/name/type");
            return None;
        };
        let record_type = RecordType::parse(&raw_type)?;
        Some(ProviderRecord {
            id: id.to_string(),
            name,
            record_type,
            value: record.value,
            ttl: record.ttl.unwrap_or(600),
            priority: if record_type == RecordType::Mx {
                record.mx
            } else {
                None
            },
            status: record.status.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    fn id(&self) -> &'static str {
        "dnspod"
    }

    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        let mut zones = Vec::new();
        let mut offset = 0u32;
        loop {
            let response: DomainListResponse = self
                .request(
                    "DescribeDomainList",
                    &json!({ "Offset": offset, "Limit": PAGE_SIZE }),
                    ErrorContext::default(),
                    self.max_retries,
                )
                .await?;

            let fetched = u32::try_from(response.domain_list.len()).unwrap_or(u32::MAX);
            zones.extend(response.domain_list.into_iter().map(|d| ProviderZone {
                id: d.domain_id.to_string(),
                name: normalize_domain_name(&d.name),
                status: d.status.unwrap_or_default(),
                ttl: d.ttl,
            }));

            offset = offset.saturating_add(fetched);
            let total = response
                .domain_count_info
                .and_then(|c| c.all_total)
                .unwrap_or(offset);
            if fetched == 0 || offset >= total {
                break;
            }
        }
        Ok(zones)
    }

    async fn list_records(&self, zone_name: &str) -> Result<Vec<ProviderRecord>> {
        let mut records = Vec::new();
        let mut offset = 0u32;
        loop {
            let result: Result<RecordListResponse> = self
                .request(
                    "DescribeRecordList",
                    &json!({ "Domain": zone_name, "Offset": offset, "Limit": PAGE_SIZE }),
                    ErrorContext::zone(zone_name),
                    self.max_retries,
                )
                .await;

            let response = match result {
                Ok(r) => r,
                // empty zone
                Err(ref e) if is_no_data(e) => break,
                Err(e) => return Err(e),
            };

            let fetched = u32::try_from(response.record_list.len()).unwrap_or(u32::MAX);
            records.extend(
                response
                    .record_list
                    .into_iter()
                    .filter_map(Self::convert_record),
            );

            offset = offset.saturating_add(fetched);
            let total = response
                .record_count_info
                .and_then(|c| c.total_count)
                .unwrap_or(offset);
            if fetched == 0 || offset >= total {
                break;
            }
        }
        Ok(records)
    }

    async fn create_record(&self, zone_name: &str, input: &RecordInput) -> Result<String> {
        let response: CreateRecordResponse = self
            .request(
                "CreateRecord",
                &Self::record_body(zone_name, None, input),
                ErrorContext::record(zone_name, Some(&input.name), None),
                0,
            )
            .await?;
        Ok(response.record_id.to_string())
    }

    async fn update_record(
        &self,
        zone_name: &str,
        record_id: &str,
        input: &RecordInput,
    ) -> Result<()> {
        let id = self.parse_record_id(record_id)?;
        let _: serde_json::Value = self
            .request(
                "ModifyRecord",
                &Self::record_body(zone_name, Some(id), input),
                ErrorContext::record(zone_name, Some(&input.name), Some(record_id)),
                0,
            )
            .await?;
        Ok(())
    }

    async fn delete_record(&self, zone_name: &str, record_id: &str) -> Result<()> {
        let id = self.parse_record_id(record_id)?;
        let _: serde_json::Value = self
            .request(
                "DeleteRecord",
                &json!({ "Domain": zone_name, "RecordId": id }),
                ErrorContext::record(zone_name, None, Some(record_id)),
                0,
            )
            .await?;
        Ok(())
    }
}

/// `NoDataOfRecord` maps to `RecordNotFound`. Without a record id in the
/// context it can only come from a list call on an empty zone.
fn is_no_data(error: &ProviderError) -> bool {
    matches!(error, ProviderError::RecordNotFound { record_id, .. } if record_id.is_empty())
}
