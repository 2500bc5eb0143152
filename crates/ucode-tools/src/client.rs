//! HTTP client for the ucode admin API.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::types::{ToolError, ToolResult};

pub const DEFAULT_BASE_URL: &str = "https://admin-api.ucode.run";

const AUTH_METHOD: &str = "API-KEY";
/// Per-request timeout used when callers have no better value.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Shared client for all tools. Cloning is cheap: the connection pool is shared.
#[derive(Debug, Clone)]
pub struct UcodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl UcodeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ToolResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a JSON request and decode the JSON response.
    ///
    /// When `api_key` is set the request carries `Authorization: API-KEY` and
    /// `X-API-KEY`. Non-2xx responses become [`ToolError::Api`] with the raw body.
    /// An empty success body decodes to `null`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        api_key: Option<&str>,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> ToolResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "calling ucode API");

        let mut request = self
            .http
            .request(method, &url)
            .header("Content-Type", "application/json");

        if let Some(key) = api_key {
            request = request
                .header("Authorization", AUTH_METHOD)
                .header("X-API-KEY", key);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "ucode API returned an error");
            return Err(ToolError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
