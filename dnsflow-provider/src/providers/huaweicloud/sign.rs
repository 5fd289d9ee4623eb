//! 华为云 SDK-HMAC-SHA256 签名
//!
//! <https://support.huaweicloud.com/devg-apisign/api-sign-algorithm-005.html>

use std::fmt::Write;

use crate::providers::common::{hmac_sha256, sha256_hex};

use super::HuaweicloudProvider;

pub(crate) const SIGN_ALGORITHM: &str = "SDK-HMAC-SHA256";

/// Each path segment percent-encoded, always ending in `/`.
pub(crate) fn canonical_uri(path: &str) -> String {
    let mut uri = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if !uri.ends_with('/') {
        uri.push('/');
    }
    uri
}

/// Query pairs encoded and sorted by key, then value.
pub(crate) fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Returns `(canonical_headers, signed_headers)` with lowercase, sorted names.
pub(crate) fn canonical_headers(headers: &[(&str, &str)]) -> (String, String) {
    let mut sorted: Vec<(String, &str)> = headers
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.trim()))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical = sorted.iter().fold(String::new(), |mut acc, (k, v)| {
        let _ = writeln!(acc, "{k}:{v}");
        acc
    });
    let signed = sorted
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    (canonical, signed)
}

pub(crate) fn canonical_request(
    method: &str,
    path: &str,
    query: &[(String, String)],
    headers: &[(&str, &str)],
    payload: &str,
) -> (String, String) {
    let (canonical_headers, signed_headers) = canonical_headers(headers);
    let request = format!(
        "{method}\n{}\n{}\n{canonical_headers}\n{signed_headers}\n{}",
        canonical_uri(path),
        canonical_query(query),
        sha256_hex(payload.as_bytes()),
    );
    (request, signed_headers)
}

impl HuaweicloudProvider {
    /// Returns the `Authorization` header value for a request.
    ///
    /// `headers` must include `Host` and `X-Sdk-Date` (the latter equal to
    /// `timestamp`).
    pub(crate) fn sign(
        &self,
        method: &str,
        path: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
        payload: &str,
        timestamp: &str,
    ) -> String {
        let (request, signed_headers) = canonical_request(method, path, query, headers, payload);
        log::trace!("CanonicalRequest:\n{request}");

        let string_to_sign = format!(
            "{SIGN_ALGORITHM}\n{timestamp}\n{}",
            sha256_hex(request.as_bytes())
        );
        let signature = hex::encode(hmac_sha256(
            self.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        ));

        format!(
            "{SIGN_ALGORITHM} Access={}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(ak: &str, sk: &str) -> HuaweicloudProvider {
        HuaweicloudProvider::new(ak.to_string(), sk.to_string()).unwrap()
    }

    fn headers(ts: &str) -> Vec<(&'static str, &str)> {
        vec![
            ("Host", "dns.myhuaweicloud.com"),
            ("X-Sdk-Date", ts),
            ("Content-Type", "application/json"),
        ]
    }

    #[test]
    fn uri_gets_trailing_slash_and_escaping() {
        assert_eq!(canonical_uri("/v2/zones"), "/v2/zones/");
        assert_eq!(canonical_uri("/v2/zones/"), "/v2/zones/");
        assert_eq!(canonical_uri("/v2/a b"), "/v2/a%20b/");
    }

    #[test]
    fn query_is_sorted_and_encoded() {
        let query = vec![
            ("offset".to_string(), "0".to_string()),
            ("limit".to_string(), "500".to_string()),
            ("name".to_string(), "a b".to_string()),
        ];
        assert_eq!(canonical_query(&query), "limit=500&name=a%20b&offset=0");
        assert_eq!(canonical_query(&[]), "");
    }

    #[test]
    fn headers_are_lowercased_and_sorted() {
        let (canonical, signed) = canonical_headers(&headers("20240101T000000Z"));
        assert_eq!(signed, "content-type;host;x-sdk-date");
        assert_eq!(
            canonical,
            "content-type:application/json\nhost:dns.myhuaweicloud.com\nx-sdk-date:20240101T000000Z\n"
        );
    }

    #[test]
    fn canonical_request_layout() {
        let (request, _) = canonical_request("GET", "/v2/zones", &[], &headers("20240101T000000Z"), "");
        let lines: Vec<&str> = request.split('\n').collect();
        assert_eq!(lines[0], "GET");
        assert_eq!(lines[1], "/v2/zones/");
        assert_eq!(lines[2], "");
        assert_eq!(
            lines.last().copied(),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
    }

    #[test]
    fn authorization_known_answer() {
        let p = provider("AK123", "SK456");
        let ts = "20240115T080000Z";
        let auth = p.sign("GET", "/v2/zones", &[], &headers(ts), "", ts);
        assert_eq!(
            auth,
            "SDK-HMAC-SHA256 Access=AK123, SignedHeaders=content-type;host;x-sdk-date, \
             Signature=2cf1eaa460779c928b52fe1814c2d13c25e91e9ef0b1bcfbe9f5fb3c8e1583ee"
        );
    }

    #[test]
    fn payload_changes_signature() {
        let p = provider("ak", "sk");
        let ts = "20240115T080000Z";
        let a = p.sign("POST", "/v2/zones/z/recordsets", &[], &headers(ts), "{}", ts);
        let b = p.sign("POST", "/v2/zones/z/recordsets", &[], &headers(ts), "{\"a\":1}", ts);
        assert_ne!(a, b);
    }
}
