//! 阿里云 RPC 签名 (HMAC-SHA1, SignatureVersion 1.0)
//!
//! <https://help.aliyun.com/zh/sdk/product-overview/rpc-mechanism>

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::providers::common::hmac_sha1;

use super::{ALIYUN_DNS_VERSION, AliyunProvider};

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - _ . ~`.
pub(crate) fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Sorted `k=v&k=v` with both sides percent-encoded.
pub(crate) fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn string_to_sign(method: &str, canonical_query: &str) -> String {
    format!(
        "{method}&{}&{}",
        percent_encode("/"),
        percent_encode(canonical_query)
    )
}

impl AliyunProvider {
    /// Adds the common parameters for `action` on top of `params`.
    pub(crate) fn common_params(
        &self,
        action: &str,
        timestamp: &str,
        nonce: &str,
        params: &[(&str, String)],
    ) -> BTreeMap<String, String> {
        let mut all: BTreeMap<String, String> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect();
        for (k, v) in [
            ("Action", action),
            ("Format", "JSON"),
            ("Version", ALIYUN_DNS_VERSION),
            ("AccessKeyId", self.access_key_id.as_str()),
            ("SignatureMethod", "HMAC-SHA1"),
            ("SignatureVersion", "1.0"),
            ("SignatureNonce", nonce),
            ("Timestamp", timestamp),
        ] {
            all.insert(k.to_string(), v.to_string());
        }
        all
    }

    /// Base64 HMAC-SHA1 of the string to sign, keyed with `secret&`.
    pub(crate) fn sign(&self, method: &str, params: &BTreeMap<String, String>) -> String {
        let to_sign = string_to_sign(method, &canonical_query(params));
        log::trace!("StringToSign: {to_sign}");
        let key = format!("{}&", self.access_key_secret);
        STANDARD.encode(hmac_sha1(key.as_bytes(), to_sign.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider(secret: &str) -> AliyunProvider {
        AliyunProvider::new("testid".to_string(), secret.to_string()).unwrap()
    }

    #[test]
    fn percent_encoding_is_rfc3986() {
        assert_eq!(percent_encode("a b*c~d"), "a%20b%2Ac~d");
        assert_eq!(percent_encode("2024-01-01T00:00:00Z"), "2024-01-01T00%3A00%3A00Z");
        assert_eq!(percent_encode("默认"), "%E9%BB%98%E8%AE%A4");
    }

    #[test]
    fn canonical_query_is_sorted() {
        let mut params = BTreeMap::new();
        params.insert("b".to_string(), "2".to_string());
        params.insert("A".to_string(), "x y".to_string());
        params.insert("a".to_string(), "1".to_string());
        assert_eq!(canonical_query(&params), "A=x%20y&a=1&b=2");
    }

    #[test]
    fn string_to_sign_double_encodes_query() {
        assert_eq!(string_to_sign("GET", "A=x%20y&a=1"), "GET&%2F&A%3Dx%2520y%26a%3D1");
    }

    #[test]
    fn common_params_are_present() {
        let provider = make_provider("testsecret");
        let params = provider.common_params(
            "DescribeDomains",
            "2024-01-15T08:00:00Z",
            "nonce-1",
            &[("PageNumber", "1".to_string())],
        );
        assert_eq!(params["Action"], "DescribeDomains");
        assert_eq!(params["Format"], "JSON");
        assert_eq!(params["Version"], "2015-01-09");
        assert_eq!(params["AccessKeyId"], "testid");
        assert_eq!(params["SignatureMethod"], "HMAC-SHA1");
        assert_eq!(params["SignatureVersion"], "1.0");
        assert_eq!(params["PageNumber"], "1");
    }

    #[test]
    fn signature_matches_documented_example() {
        // DescribeRegions example from the RPC signature documentation.
        let provider = make_provider("testsecret");
        let params: BTreeMap<String, String> = [
            ("AccessKeyId", "testid"),
            ("Action", "DescribeRegions"),
            ("Format", "XML"),
            ("SignatureMethod", "HMAC-SHA1"),
            ("SignatureNonce", "3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf"),
            ("SignatureVersion", "1.0"),
            ("Timestamp", "2016-02-23T12:46:24Z"),
            ("Version", "2014-05-26"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(
            canonical_query(&params),
            "AccessKeyId=testid&Action=DescribeRegions&Format=XML&SignatureMethod=HMAC-SHA1\
             &SignatureNonce=3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf&SignatureVersion=1.0\
             &Timestamp=2016-02-23T12%3A46%3A24Z&Version=2014-05-26"
        );
        assert_eq!(provider.sign("GET", &params), "OLeaidS1JvxuMvnyHOwuJ+uX5qY=");
    }

    #[test]
    fn signature_changes_with_secret_and_params() {
        let a = make_provider("secret-one");
        let b = make_provider("secret-two");
        let params = a.common_params("DescribeDomains", "2024-01-15T08:00:00Z", "n", &[]);
        assert_ne!(a.sign("GET", &params), b.sign("GET", &params));

        let other = a.common_params("DescribeDomainRecords", "2024-01-15T08:00:00Z", "n", &[]);
        assert_ne!(a.sign("GET", &params), a.sign("GET", &other));
        assert_eq!(a.sign("GET", &params), a.sign("GET", &params));
    }
}
