//! Shared request execution for the vendor clients.
//!
//! Signing stays inside each vendor module; this only sends a prepared
//! [`RequestBuilder`], classifies transport failures and applies the retry
//! policy for reads.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ProviderError;
use crate::utils::log_sanitizer::truncate_for_log;

/// Retries used for list calls. Mutations always use 0.
pub(crate) const READ_RETRIES: u32 = 2;

pub(crate) struct HttpUtils;

impl HttpUtils {
    /// Sends the request and returns `(status, body)`.
    ///
    /// 429 becomes `RateLimited` (with `Retry-After` when present), 502..=504
    /// becomes `NetworkError`. Any other status is returned to the caller,
    /// which owns vendor-specific error decoding.
    pub async fn execute_request(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
    ) -> Result<(u16, String), ProviderError> {
        log::debug!("[{provider_name}] {method_name} {url_or_action}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] HTTP 429 on {url_or_action}, retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                provider: provider_name.to_string(),
                retry_after,
                raw_message: Some(truncate_for_log(&body)),
            });
        }

        if matches!(status_code, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] HTTP {status_code} on {url_or_action}");
            return Err(ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{provider_name}] {status_code} {}",
            truncate_for_log(&body)
        );

        Ok((status_code, body))
    }

    pub fn parse_json<T>(body: &str, provider_name: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(body).map_err(|e| {
            log::error!(
                "[{provider_name}] unexpected response ({e}): {}",
                truncate_for_log(body)
            );
            ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            }
        })
    }

    /// Like [`execute_request`](Self::execute_request), retrying transient
    /// failures up to `max_retries` times.
    ///
    /// Requests whose body cannot be cloned are sent once.
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url_or_action: &str,
        max_retries: u32,
    ) -> Result<(u16, String), ProviderError> {
        if max_retries == 0 {
            return Self::execute_request(request_builder, provider_name, method_name, url_or_action)
                .await;
        }

        let mut attempt = 0;
        loop {
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{provider_name}] request body is not cloneable, sending once");
                return Self::execute_request(
                    request_builder,
                    provider_name,
                    method_name,
                    url_or_action,
                )
                .await;
            };

            match Self::execute_request(req, provider_name, method_name, url_or_action).await {
                Err(e) if attempt < max_retries && e.is_transient() => {
                    let delay = retry_delay(&e, attempt);
                    attempt += 1;
                    log::warn!(
                        "[{provider_name}] {url_or_action} failed (attempt {attempt}/{max_retries}), retrying in {:.1}s: {e}",
                        delay.as_secs_f32(),
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

/// `Retry-After` wins when the vendor sent one (capped at 30s).
fn retry_delay(error: &ProviderError, attempt: u32) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(30))
    } else {
        backoff_delay(attempt)
    }
}

/// 100ms doubling per attempt, capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(10_000))
}
