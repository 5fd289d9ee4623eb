//! Tencent Cloud `DNSPod` API payloads

use serde::{Deserialize, Serialize};

/// Every response is wrapped in `{"Response": {...}}`; errors live in
/// `Response.Error`.
#[derive(Debug, Deserialize)]
pub struct TencentResponse {
    #[serde(rename = "Response")]
    pub response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct TencentError {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

// ============ 域名 ============

#[derive(Debug, Deserialize)]
pub struct DomainListResponse {
    #[serde(rename = "DomainList", default)]
    pub domain_list: Vec<DnspodDomain>,
    #[serde(rename = "DomainCountInfo")]
    pub domain_count_info: Option<DomainCountInfo>,
}

#[derive(Debug, Deserialize)]
pub struct DomainCountInfo {
    #[serde(rename = "AllTotal")]
    pub all_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DnspodDomain {
    #[serde(rename = "DomainId")]
    pub domain_id: u64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "TTL")]
    pub ttl: Option<u32>,
}

// ============ 记录 ============

#[derive(Debug, Deserialize)]
pub struct RecordListResponse {
    #[serde(rename = "RecordList", default)]
    pub record_list: Vec<DnspodRecord>,
    #[serde(rename = "RecordCountInfo")]
    pub record_count_info: Option<RecordCountInfo>,
}

#[derive(Debug, Deserialize)]
pub struct RecordCountInfo {
    #[serde(rename = "TotalCount")]
    pub total_count: Option<u32>,
}

/// Fields are optional because the API occasionally returns partial rows;
/// those are skipped.
#[derive(Debug, Deserialize)]
pub struct DnspodRecord {
    #[serde(rename = "RecordId")]
    pub record_id: Option<u64>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub record_type: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: String,
    #[serde(rename = "TTL")]
    pub ttl: Option<u32>,
    #[serde(rename = "MX")]
    pub mx: Option<u16>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordResponse {
    #[serde(rename = "RecordId")]
    pub record_id: u64,
}

/// Body of `CreateRecord` / `ModifyRecord`.
#[derive(Debug, Serialize)]
pub struct RecordBody<'a> {
    #[serde(rename = "Domain")]
    pub domain: &'a str,
    #[serde(rename = "RecordId", skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u64>,
    #[serde(rename = "SubDomain")]
    pub sub_domain: &'a str,
    #[serde(rename = "RecordType")]
    pub record_type: &'a str,
    #[serde(rename = "RecordLine")]
    pub record_line: &'a str,
    #[serde(rename = "Value")]
    pub value: &'a str,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    #[serde(rename = "MX", skip_serializing_if = "Option::is_none")]
    pub mx: Option<u16>,
}
