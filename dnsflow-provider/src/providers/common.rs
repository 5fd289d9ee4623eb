//! Helpers shared by the vendor clients.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{ProviderError, Result};
use crate::types::MULTI_VALUE_SEPARATOR;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Builds the HTTP client used by every vendor (10s connect, 30s total).
pub fn create_http_client(provider: &str) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NetworkError {
            provider: provider.to_string(),
            detail: format!("failed to build HTTP client: {e}"),
        })
}

// ============ Digests ============

#[allow(clippy::expect_used)]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

#[allow(clippy::expect_used)]
pub fn hmac_sha1(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// ============ Names ============

/// Strips the trailing dot of a fully-qualified name.
pub fn normalize_domain_name(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

/// `www.example.com` in `example.com` -> `www`; the apex maps to `@`.
pub fn full_name_to_relative(full_name: &str, zone_name: &str) -> String {
    let full = normalize_domain_name(full_name);
    let zone = normalize_domain_name(zone_name);

    if full.eq_ignore_ascii_case(&zone) {
        "@".to_string()
    } else if let Some(subdomain) = full.strip_suffix(&format!(".{zone}")) {
        subdomain.to_string()
    } else {
        full
    }
}

/// `www` in `example.com` -> `www.example.com`; `@` and `""` map to the apex.
pub fn relative_to_full_name(relative_name: &str, zone_name: &str) -> String {
    let zone = normalize_domain_name(zone_name);

    if relative_name == "@" || relative_name.is_empty() {
        zone
    } else {
        format!("{relative_name}.{zone}")
    }
}

/// Relative name in the form `@` for the apex, used when talking to vendors
/// that want an explicit apex marker.
pub fn apex_or_name(relative_name: &str) -> &str {
    if relative_name.is_empty() {
        "@"
    } else {
        relative_name
    }
}

/// Zone name -> vendor zone id, for vendors whose record endpoints are keyed
/// by an opaque id.
#[derive(Default)]
pub struct ZoneIdCache {
    inner: RwLock<HashMap<String, String>>,
}

impl ZoneIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, zone_name: &str) -> Option<String> {
        let key = normalize_domain_name(zone_name).to_lowercase();
        self.inner.read().ok()?.get(&key).cloned()
    }

    pub fn insert(&self, zone_name: &str, zone_id: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(
                normalize_domain_name(zone_name).to_lowercase(),
                zone_id.to_string(),
            );
        }
    }
}

/// Whether `candidate` names the same zone as `zone_name`, ignoring case
/// and a trailing dot on either side.
pub fn same_zone(candidate: &str, zone_name: &str) -> bool {
    normalize_domain_name(candidate).eq_ignore_ascii_case(&normalize_domain_name(zone_name))
}

// ============ Values ============

/// Folds a multi-value answer into one record value.
pub fn join_values<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(MULTI_VALUE_SEPARATOR)
}

/// Inverse of [`join_values`]. Empty parts are dropped.
pub fn split_values(value: &str) -> Vec<String> {
    value
        .split(MULTI_VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Wraps a TXT value in double quotes unless it already is.
pub fn quote_txt(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value.to_string()
    } else {
        format!("\"{value}\"")
    }
}

pub fn unquote_txt(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_names() {
        assert_eq!(full_name_to_relative("www.example.com.", "example.com"), "www");
        assert_eq!(full_name_to_relative("example.com.", "example.com"), "@");
        assert_eq!(
            full_name_to_relative("_acme-challenge.a.example.com", "example.com."),
            "_acme-challenge.a"
        );
        assert_eq!(full_name_to_relative("other.org", "example.com"), "other.org");
    }

    #[test]
    fn full_names() {
        assert_eq!(relative_to_full_name("@", "example.com."), "example.com");
        assert_eq!(relative_to_full_name("", "example.com"), "example.com");
        assert_eq!(relative_to_full_name("home", "example.com"), "home.example.com");
    }

    #[test]
    fn zone_cache_ignores_trailing_dot_and_case() {
        let cache = ZoneIdCache::new();
        cache.insert("Example.com.", "z1");
        assert_eq!(cache.get("example.com").as_deref(), Some("z1"));
        assert!(cache.get("example.org").is_none());
        assert!(same_zone("example.com.", "EXAMPLE.com"));
        assert!(!same_zone("sub.example.com", "example.com"));
    }

    #[test]
    fn multi_values_fold_and_unfold() {
        let joined = join_values(&["1.1.1.1", "2.2.2.2"]);
        assert_eq!(joined, "1.1.1.1,2.2.2.2");
        assert_eq!(split_values(&joined), vec!["1.1.1.1", "2.2.2.2"]);
        assert_eq!(split_values("1.1.1.1, ,"), vec!["1.1.1.1"]);
    }

    #[test]
    fn txt_quoting() {
        assert_eq!(quote_txt("abc"), "\"abc\"");
        assert_eq!(quote_txt("\"abc\""), "\"abc\"");
        assert_eq!(unquote_txt("\"abc\""), "abc");
        assert_eq!(unquote_txt("abc"), "abc");
        assert_eq!(unquote_txt("\""), "\"");
    }

    #[test]
    fn digests_match_known_vectors() {
        // RFC 4231 test case 2.
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        // RFC 2202 test case 2.
        let mac = hmac_sha1(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(hex::encode(mac), "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
