//! 阿里云 DnsProvider 实现

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::providers::common::{apex_or_name, normalize_domain_name};
use crate::traits::{DnsProvider, ErrorContext};
use crate::types::{ProviderRecord, ProviderZone, RecordInput, RecordType};

use super::types::{
    AliyunRecord, DescribeDomainRecordsResponse, DescribeDomainsResponse, RecordIdResponse,
};
use super::{AliyunProvider, PAGE_SIZE};

impl AliyunProvider {
    fn record_params(input: &RecordInput) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("RR", apex_or_name(&input.name).to_string()),
            ("Type", input.record_type.as_str().to_string()),
            ("Value", input.value.clone()),
            ("TTL", input.ttl.to_string()),
        ];
        if input.record_type == RecordType::Mx
            && let Some(priority) = input.priority
        {
            params.push(("Priority", priority.to_string()));
        }
        params
    }

    fn convert_record(record: AliyunRecord) -> Option<ProviderRecord> {
        let Some(record_type) = RecordType::parse(&record.record_type) else {
            log::debug!(
                "[aliyun] skipping unsupported record type {} ({})",
                record.record_type,
                record.record_id
            );
            return None;
        };
        Some(ProviderRecord {
            id: record.record_id,
            name: record.rr,
            record_type,
            value: record.value,
            ttl: record.ttl,
            priority: if record_type == RecordType::Mx {
                record.priority
            } else {
                None
            },
            status: record.status.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    fn id(&self) -> &'static str {
        "aliyun"
    }

    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        let mut zones = Vec::new();
        let mut page = 1;
        loop {
            let response: DescribeDomainsResponse = self
                .request(
                    "DescribeDomains",
                    &[
                        ("PageNumber", page.to_string()),
                        ("PageSize", PAGE_SIZE.to_string()),
                    ],
                    ErrorContext::default(),
                    self.max_retries,
                )
                .await?;

            let batch = response.domains.map(|d| d.domain).unwrap_or_default();
            let fetched = batch.len();
            zones.extend(batch.into_iter().map(|d| ProviderZone {
                id: d.domain_id.unwrap_or_else(|| d.domain_name.clone()),
                name: normalize_domain_name(&d.domain_name),
                status: d.domain_status.unwrap_or_else(|| "ENABLE".to_string()),
                ttl: None,
            }));

            if fetched == 0 || zones.len() >= response.total_count as usize {
                break;
            }
            page += 1;
        }
        Ok(zones)
    }

    async fn list_records(&self, zone_name: &str) -> Result<Vec<ProviderRecord>> {
        let mut records = Vec::new();
        let mut seen = 0usize;
        let mut page = 1;
        loop {
            let response: DescribeDomainRecordsResponse = self
                .request(
                    "DescribeDomainRecords",
                    &[
                        ("DomainName", zone_name.to_string()),
                        ("PageNumber", page.to_string()),
                        ("PageSize", PAGE_SIZE.to_string()),
                    ],
                    ErrorContext::zone(zone_name),
                    self.max_retries,
                )
                .await?;

            let batch = response.domain_records.map(|r| r.record).unwrap_or_default();
            seen += batch.len();
            let fetched = batch.len();
            records.extend(batch.into_iter().filter_map(Self::convert_record));

            if fetched == 0 || seen >= response.total_count as usize {
                break;
            }
            page += 1;
        }
        Ok(records)
    }

    async fn create_record(&self, zone_name: &str, input: &RecordInput) -> Result<String> {
        let mut params = vec![("DomainName", zone_name.to_string())];
        params.extend(Self::record_params(input));

        let response: RecordIdResponse = self
            .request(
                "AddDomainRecord",
                &params,
                ErrorContext::record(zone_name, Some(&input.name), None),
                0,
            )
            .await?;
        Ok(response.record_id)
    }

    async fn update_record(
        &self,
        zone_name: &str,
        record_id: &str,
        input: &RecordInput,
    ) -> Result<()> {
        let mut params = vec![("RecordId", record_id.to_string())];
        params.extend(Self::record_params(input));

        let result: Result<RecordIdResponse> = self
            .request(
                "UpdateDomainRecord",
                &params,
                ErrorContext::record(zone_name, Some(&input.name), Some(record_id)),
                0,
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            // Aliyun rejects an update whose content equals the current record.
            Err(ProviderError::RecordExists { .. }) => {
                log::debug!("[aliyun] record {record_id} already up to date");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_record(&self, zone_name: &str, record_id: &str) -> Result<()> {
        let _: RecordIdResponse = self
            .request(
                "DeleteDomainRecord",
                &[("RecordId", record_id.to_string())],
                ErrorContext::record(zone_name, None, Some(record_id)),
                0,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(record_type: &str, priority: Option<u16>) -> AliyunRecord {
        AliyunRecord {
            record_id: "1".to_string(),
            rr: "@".to_string(),
            record_type: record_type.to_string(),
            value: "v".to_string(),
            ttl: 600,
            priority,
            status: Some("ENABLE".to_string()),
        }
    }

    #[test]
    fn mx_keeps_priority_others_drop_it() {
        let mx = AliyunProvider::convert_record(raw("MX", Some(5))).unwrap();
        assert_eq!(mx.priority, Some(5));
        let a = AliyunProvider::convert_record(raw("A", Some(5))).unwrap();
        assert_eq!(a.priority, None);
    }

    #[test]
    fn unsupported_types_are_skipped() {
        assert!(AliyunProvider::convert_record(raw("SRV", None)).is_none());
    }

    #[test]
    fn record_params_use_apex_marker() {
        let input = RecordInput::new("", RecordType::Mx, "mx.example.com").with_priority(Some(10));
        let params = AliyunProvider::record_params(&input);
        assert!(params.contains(&("RR", "@".to_string())));
        assert!(params.contains(&("Priority", "10".to_string())));
        assert!(params.contains(&("TTL", "600".to_string())));
    }
}
