//! `DNSPod` TC3-HMAC-SHA256 签名
//!
//! <https://cloud.tencent.com/document/api/1427/56189>

use chrono::DateTime;

use crate::providers::common::{hmac_sha256, sha256_hex};

use super::{CONTENT_TYPE, DNSPOD_API_HOST, DNSPOD_SERVICE, DnspodProvider};

pub(crate) const TC3_ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

/// UTC date (`YYYY-MM-DD`) of a unix timestamp, part of the credential scope.
pub(crate) fn credential_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub(crate) fn canonical_request(host: &str, action: &str, payload: &str) -> String {
    format!(
        "POST\n/\n\ncontent-type:{CONTENT_TYPE}\nhost:{host}\nx-tc-action:{}\n\n{SIGNED_HEADERS}\n{}",
        action.to_lowercase(),
        sha256_hex(payload.as_bytes())
    )
}

/// `HMAC(HMAC(HMAC("TC3" + key, date), service), "tc3_request")`
pub(crate) fn signing_key(secret_key: &str, date: &str, service: &str) -> Vec<u8> {
    let secret_date = hmac_sha256(format!("TC3{secret_key}").as_bytes(), date.as_bytes());
    let secret_service = hmac_sha256(&secret_date, service.as_bytes());
    hmac_sha256(&secret_service, b"tc3_request")
}

impl DnspodProvider {
    pub(crate) fn sign(&self, action: &str, payload: &str, timestamp: i64) -> String {
        let date = credential_date(timestamp);
        let scope = format!("{date}/{DNSPOD_SERVICE}/tc3_request");

        let request = canonical_request(DNSPOD_API_HOST, action, payload);
        let string_to_sign = format!(
            "{TC3_ALGORITHM}\n{timestamp}\n{scope}\n{}",
            sha256_hex(request.as_bytes())
        );
        log::trace!("StringToSign:\n{string_to_sign}");

        let key = signing_key(&self.secret_key, &date, DNSPOD_SERVICE);
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

        format!(
            "{TC3_ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
            self.secret_id
        )
    }
}
