//! 华为云 HTTP 请求

use chrono::Utc;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::HuaweicloudProvider;
use super::sign::canonical_query;
use super::types::ErrorResponse;

impl HuaweicloudProvider {
    fn check_status(&self, status: u16, body: &str, ctx: ErrorContext) -> Result<()> {
        if (200..300).contains(&status) {
            return Ok(());
        }
        if let Ok(ErrorResponse {
            code: Some(code),
            message,
        }) = serde_json::from_str::<ErrorResponse>(body)
        {
            let message = message.unwrap_or_default();
            log::warn!("[huaweicloud] HTTP {status}: {code} - {message}");
            return Err(self.map_error(RawApiError::with_code(code, message), ctx));
        }
        Err(self.unknown_error(RawApiError::new(format!("HTTP {status}: {body}"))))
    }

    /// Signs and sends a request, returning the raw body on 2xx.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        payload: Option<String>,
        ctx: ErrorContext,
        retries: u32,
    ) -> Result<String> {
        let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let body = payload.unwrap_or_default();

        let mut headers: Vec<(&str, &str)> =
            vec![("Host", self.host.as_str()), ("X-Sdk-Date", timestamp.as_str())];
        if !body.is_empty() {
            headers.push(("Content-Type", "application/json"));
        }
        let authorization = self.sign(method.as_str(), path, query, &headers, &body, &timestamp);

        let query_string = canonical_query(query);
        let url = if query_string.is_empty() {
            format!("https://{}{path}", self.host)
        } else {
            format!("https://{}{path}?{query_string}", self.host)
        };

        let mut request = self.client.request(method.clone(), &url);
        for (name, value) in &headers {
            request = request.header(*name, *value);
        }
        request = request.header("Authorization", authorization);
        if !body.is_empty() {
            request = request.body(body);
        }

        let (status, text) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            method.as_str(),
            path,
            retries,
        )
        .await?;

        self.check_status(status, &text, ctx)?;
        Ok(text)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
        ctx: ErrorContext,
    ) -> Result<T> {
        let text = self
            .send(Method::GET, path, query, None, ctx, self.max_retries)
            .await?;
        HttpUtils::parse_json(&text, self.provider_name())
    }

    /// POST/PUT with a JSON body. Never retried.
    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let payload = serde_json::to_string(body).map_err(|e| ProviderError::SerializationError {
            provider: self.provider_name().to_string(),
            detail: e.to_string(),
        })?;
        let text = self.send(method, path, &[], Some(payload), ctx, 0).await?;
        HttpUtils::parse_json(&text, self.provider_name())
    }

    pub(crate) async fn delete(&self, path: &str, ctx: ErrorContext) -> Result<()> {
        self.send(Method::DELETE, path, &[], None, ctx, 0)
            .await
            .map(|_| ())
    }
}
