//! HTTP client for the message proxy

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::common::config::TargetConfig;
use crate::common::{Error, Result};

use super::request::{ApiRequest, ApiResponse};

/// Something that can carry a request to the proxy and bring back its response
///
/// Requests are issued one at a time; implementations need not support
/// concurrent use.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for the full response
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed [`Transport`]
///
/// Owns one connection pool for the whole run; dropping the client closes it.
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for `target` with a per-request `timeout`
    pub fn new(target: &TargetConfig, timeout: Duration) -> Result<Self> {
        let base = Url::parse(&target.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", target.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Base URL '{}' cannot carry a path",
                target.base_url
            )));
        }

        let mut base = base;
        {
            let mut segments = base
                .path_segments_mut()
                .map_err(|_| Error::Config(format!("Invalid base URL '{}'", target.base_url)))?;
            segments.pop_if_empty();
            for segment in target.api_prefix.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("proxy-smoke/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            timeout,
        })
    }

    /// Base URL including the API prefix
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL for a request
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Internal("Base URL lost its path".to_string()))?;
            segments.pop_if_empty();
            for segment in request.segments()? {
                segments.push(&segment);
            }
        }
        Ok(url)
    }

    fn map_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            e.into()
        }
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(request)?;
        tracing::debug!("Request: {} {}", request.method, url);

        let mut builder = self
            .http
            .request(request.method.clone(), url.clone())
            .timeout(self.timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_error(e))?;
        tracing::debug!("Response: {} {} -> {}", request.method, url, status);

        let body = parse_body(&text)?;
        Ok(ApiResponse::new(status, body))
    }
}

/// Parse a response body; empty bodies become `null`
fn parse_body(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| Error::MalformedBody(e.to_string()))
}
