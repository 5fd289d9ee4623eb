//! 阿里云 RPC 请求

use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::AliyunProvider;
use super::sign::canonical_query;
use super::types::ErrorResponse;

impl AliyunProvider {
    /// Signs and sends one RPC action as a GET with everything in the query.
    ///
    /// `retries` is [`Self::max_retries`] for reads and 0 for mutations.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
        ctx: ErrorContext,
        retries: u32,
    ) -> Result<T> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();

        let mut all = self.common_params(action, &timestamp, &nonce, params);
        let signature = self.sign("GET", &all);
        all.insert("Signature".to_string(), signature);

        let url = format!("{}/?{}", self.endpoint, canonical_query(&all));
        let request = self.client.get(&url);

        let (status, body) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            "GET",
            action,
            retries,
        )
        .await?;

        // Errors come back as a JSON body with Code/Message, usually with a
        // 4xx status but not always.
        let value: serde_json::Value = HttpUtils::parse_json(&body, self.provider_name())?;
        if let Ok(ErrorResponse {
            code: Some(code),
            message,
        }) = serde_json::from_value::<ErrorResponse>(value.clone())
        {
            let message = message.unwrap_or_default();
            log::warn!("[aliyun] {action} failed: {code} - {message}");
            return Err(self.map_error(RawApiError::with_code(code, message), ctx));
        }
        if status >= 400 {
            return Err(self.map_error(RawApiError::new(format!("HTTP {status}: {body}")), ctx));
        }

        serde_json::from_value(value).map_err(|e| self.parse_error(e))
    }
}
