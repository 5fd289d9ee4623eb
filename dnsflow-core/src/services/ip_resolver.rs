//! Public IP discovery through plain-text echo endpoints.

use std::net::Ipv6Addr;

use async_trait::async_trait;
use dnsflow_provider::RecordType;

use crate::config::DdnsSettings;
use crate::error::{CoreError, CoreResult};

/// Discovers this host's public address for a record type.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// `A` resolves an IPv4 address, `AAAA` an IPv6 one.
    async fn resolve(&self, record_type: RecordType) -> CoreResult<String>;
}

/// Dotted quad, four decimal octets each in `0..=255`.
pub fn is_valid_ipv4(candidate: &str) -> bool {
    let parts: Vec<&str> = candidate.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|part| {
            !part.is_empty()
                && part.len() <= 3
                && part.bytes().all(|b| b.is_ascii_digit())
                && part.parse::<u16>().is_ok_and(|n| n <= 255)
        })
}

pub fn is_valid_ipv6(candidate: &str) -> bool {
    candidate.contains(':') && candidate.parse::<Ipv6Addr>().is_ok()
}

/// Tries each configured endpoint in order; the first valid answer wins.
pub struct HttpIpResolver {
    client: reqwest::Client,
    ipv4_endpoints: Vec<String>,
    ipv6_endpoints: Vec<String>,
}

impl HttpIpResolver {
    pub fn new(settings: &DdnsSettings) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.lookup_timeout())
            .build()
            .map_err(|e| CoreError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            ipv4_endpoints: settings.ipv4_endpoints.clone(),
            ipv6_endpoints: settings.ipv6_endpoints.clone(),
        })
    }

    async fn fetch(&self, endpoint: &str) -> Result<String, String> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {e}"))?;
        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self, record_type: RecordType) -> CoreResult<String> {
        let (endpoints, valid): (&[String], fn(&str) -> bool) = match record_type {
            RecordType::A => (&self.ipv4_endpoints, is_valid_ipv4),
            RecordType::Aaaa => (&self.ipv6_endpoints, is_valid_ipv6),
            other => {
                return Err(CoreError::ValidationError(format!(
                    "cannot discover an address for {other} records"
                )))
            }
        };

        for endpoint in endpoints {
            match self.fetch(endpoint).await {
                Ok(ip) if valid(&ip) => {
                    log::debug!("Public {record_type} address from {endpoint}: {ip}");
                    return Ok(ip);
                }
                Ok(other) => {
                    log::debug!("{endpoint} returned an invalid address: {other:?}");
                }
                Err(e) => log::debug!("IP lookup via {endpoint} failed: {e}"),
            }
        }

        Err(CoreError::IpDiscovery(format!(
            "no {record_type} address from {} endpoint(s)",
            endpoints.len()
        )))
    }
}
