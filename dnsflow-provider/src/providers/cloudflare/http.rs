//! Cloudflare HTTP 请求

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::CloudflareProvider;
use super::types::CloudflareResponse;

impl CloudflareProvider {
    /// Sends one request and unwraps the v4 envelope.
    ///
    /// Returns `(result, total_pages)`; `total_pages` is `None` for
    /// non-paginated endpoints.
    pub(crate) async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        ctx: ErrorContext,
    ) -> Result<(T, Option<u32>)>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let retries = if method == Method::GET {
            self.max_retries
        } else {
            0
        };
        let url = format!("{}{path}", self.api_base);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.api_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let (status, text) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            method.as_str(),
            path,
            retries,
        )
        .await?;

        let envelope: CloudflareResponse<T> =
            HttpUtils::parse_json(&text, self.provider_name())?;

        if !envelope.success {
            let raw = envelope.errors.into_iter().next().map_or_else(
                || RawApiError::new(format!("HTTP {status}")),
                |e| RawApiError::with_code(e.code.to_string(), e.message),
            );
            log::warn!("[cloudflare] {method} {path} failed: {raw:?}");
            return Err(self.map_error(raw, ctx));
        }

        let pages = envelope.result_info.and_then(|i| i.total_pages);
        let result = envelope
            .result
            .ok_or_else(|| self.parse_error("missing result"))?;
        Ok((result, pages))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: ErrorContext,
    ) -> Result<(T, Option<u32>)> {
        self.call::<T, ()>(Method::GET, path, None, ctx).await
    }
}
