//! `DNSPod` HTTP 请求

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::types::{TencentError, TencentResponse};
use super::{CONTENT_TYPE, DNSPOD_API_HOST, DNSPOD_VERSION, DnspodProvider};

impl DnspodProvider {
    /// Posts one API action. `retries` is 0 for mutations.
    pub(crate) async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        action: &str,
        body: &B,
        ctx: ErrorContext,
        retries: u32,
    ) -> Result<T> {
        let payload = serde_json::to_string(body).map_err(|e| ProviderError::SerializationError {
            provider: self.provider_name().to_string(),
            detail: e.to_string(),
        })?;

        let timestamp = Utc::now().timestamp();
        let authorization = self.sign(action, &payload, timestamp);

        let request = self
            .client
            .post(format!("https://{DNSPOD_API_HOST}"))
            .header("Content-Type", CONTENT_TYPE)
            .header("Host", DNSPOD_API_HOST)
            .header("X-TC-Action", action)
            .header("X-TC-Version", DNSPOD_VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("Authorization", authorization)
            .body(payload);

        let (_status, text) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            "POST",
            action,
            retries,
        )
        .await?;

        let envelope: TencentResponse = HttpUtils::parse_json(&text, self.provider_name())?;
        if let Some(error) = envelope.response.get("Error") {
            let error: TencentError =
                serde_json::from_value(error.clone()).map_err(|e| self.parse_error(e))?;
            log::warn!("[dnspod] {action} failed: {} - {}", error.code, error.message);
            return Err(self.map_error(RawApiError::with_code(error.code, error.message), ctx));
        }

        serde_json::from_value(envelope.response).map_err(|e| self.parse_error(e))
    }
}
