//! Huawei Cloud DNS API payloads

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListZonesResponse {
    #[serde(default)]
    pub zones: Vec<HuaweicloudZone>,
    pub metadata: Option<ListMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ListMetadata {
    pub total_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HuaweicloudZone {
    pub id: String,
    /// Fully qualified, with trailing dot.
    pub name: String,
    pub status: Option<String>,
    pub ttl: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ListRecordSetsResponse {
    #[serde(default)]
    pub recordsets: Vec<HuaweicloudRecordSet>,
    pub metadata: Option<ListMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct HuaweicloudRecordSet {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub records: Vec<String>,
    pub ttl: Option<u32>,
    pub status: Option<String>,
}

/// Body of create and update calls.
#[derive(Debug, Serialize)]
pub struct RecordSetBody {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: u32,
    pub records: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordSetResponse {
    pub id: String,
}

/// Two error shapes exist: `code`/`message` from DNS and
/// `error_code`/`error_msg` from the API gateway.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(alias = "error_code")]
    pub code: Option<String>,
    #[serde(alias = "error_msg")]
    pub message: Option<String>,
}
