//! 阿里云 API 响应结构

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Code")]
    pub code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
}

// ============ DescribeDomains ============

#[derive(Debug, Deserialize)]
pub struct DescribeDomainsResponse {
    #[serde(rename = "TotalCount", default)]
    pub total_count: u32,
    #[serde(rename = "Domains")]
    pub domains: Option<DomainsWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct DomainsWrapper {
    #[serde(rename = "Domain", default)]
    pub domain: Vec<AliyunDomain>,
}

#[derive(Debug, Deserialize)]
pub struct AliyunDomain {
    #[serde(rename = "DomainId")]
    pub domain_id: Option<String>,
    #[serde(rename = "DomainName")]
    pub domain_name: String,
    #[serde(rename = "DomainStatus")]
    pub domain_status: Option<String>,
}

// ============ DescribeDomainRecords ============

#[derive(Debug, Deserialize)]
pub struct DescribeDomainRecordsResponse {
    #[serde(rename = "TotalCount", default)]
    pub total_count: u32,
    #[serde(rename = "DomainRecords")]
    pub domain_records: Option<DomainRecordsWrapper>,
}

#[derive(Debug, Deserialize)]
pub struct DomainRecordsWrapper {
    #[serde(rename = "Record", default)]
    pub record: Vec<AliyunRecord>,
}

#[derive(Debug, Deserialize)]
pub struct AliyunRecord {
    #[serde(rename = "RecordId")]
    pub record_id: String,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "Priority")]
    pub priority: Option<u16>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
}

// ============ Mutations ============

#[derive(Debug, Deserialize)]
pub struct RecordIdResponse {
    #[serde(rename = "RecordId")]
    pub record_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_describe_domain_records() {
        let body = r#"{
            "TotalCount": 2,
            "PageNumber": 1,
            "PageSize": 100,
            "RequestId": "536E9CAD-DB30-4647-AC87-AA5CC38C5382",
            "DomainRecords": {"Record": [
                {"RR": "www", "Status": "ENABLE", "Value": "1.2.3.4", "RecordId": "9999985",
                 "Type": "A", "DomainName": "example.com", "TTL": 600, "Locked": false},
                {"RR": "@", "Status": "ENABLE", "Value": "mx.example.com", "RecordId": "9999986",
                 "Type": "MX", "DomainName": "example.com", "TTL": 600, "Priority": 10}
            ]}
        }"#;
        let resp: DescribeDomainRecordsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.total_count, 2);
        let records = resp.domain_records.unwrap().record;
        assert_eq!(records[0].rr, "www");
        assert_eq!(records[1].priority, Some(10));
    }

    #[test]
    fn parses_empty_domain_list() {
        let resp: DescribeDomainsResponse =
            serde_json::from_str(r#"{"TotalCount":0,"Domains":{"Domain":[]}}"#).unwrap();
        assert!(resp.domains.unwrap().domain.is_empty());
    }
}
