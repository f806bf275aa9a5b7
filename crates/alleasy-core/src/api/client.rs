//! API client for communicating with the demo REST API.
//!
//! Every request passes through two phases:
//! - request: the bearer token of the stored session (if any) is attached
//! - response: a 401 from any endpoint removes the stored session before
//!   the error is handed back

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::session::SESSION_KEY;
use crate::store::KeyValueStore;

use super::ApiError;

/// Header the demo API reads its key from
const API_KEY_HEADER: &str = "x-api-key";

/// Only the token matters when decorating requests; other fields may be
/// missing or malformed without blocking the call.
#[derive(Debug, Deserialize)]
struct StoredToken {
    #[serde(default)]
    token: Option<String>,
}

/// API client for the demo service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl ApiClient {
    /// Create a client for `config.base_url` that reads and clears the
    /// session through `store`
    pub fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let api_key = header::HeaderValue::from_str(&config.api_key)
            .context("API key is not a valid header value")?;
        headers.insert(API_KEY_HEADER, api_key);

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers);
        if Self::is_loopback(&config.base_url) {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The store this client reads tokens from and clears on 401
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Local servers are reached directly, never through a system proxy
    fn is_loopback(base_url: &str) -> bool {
        let Ok(url) = reqwest::Url::parse(base_url) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        host.eq_ignore_ascii_case("localhost")
            || host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<IpAddr>()
                .map(|ip| ip.is_loopback())
                .unwrap_or(false)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request phase: bearer header from the stored session.
    /// Store or parse failures send the request unauthenticated.
    async fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();

        let stored = match self.store.get(SESSION_KEY).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return headers,
            Err(e) => {
                warn!(error = %e, "Could not read session, sending request without token");
                return headers;
            }
        };

        let token = match serde_json::from_str::<StoredToken>(&stored) {
            Ok(StoredToken { token: Some(token) }) if !token.is_empty() => token,
            Ok(_) => return headers,
            Err(e) => {
                warn!(error = %e, "Stored session is not valid JSON, sending request without token");
                return headers;
            }
        };

        match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(_) => warn!("Stored token is not a valid header value"),
        }
        headers
    }

    /// Response phase: pass 2xx through, map everything else to `ApiError`.
    /// A 401 clears the stored session; the removal is awaited so callers
    /// that see the error can rely on the store being cleared.
    async fn check_response(
        &self,
        response: reqwest::Response,
        url: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            debug!(url = %url, "Unauthorized response, clearing stored session");
            if let Err(e) = self.store.remove(SESSION_KEY).await {
                warn!(error = %e, "Failed to clear session after 401");
            }
        }

        Err(ApiError::from_status(status, &body))
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers().await)
            .send()
            .await?;

        let response = self.check_response(response, &url).await?;
        Self::parse_json(response, &url).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers().await)
            .json(body)
            .send()
            .await?;

        let response = self.check_response(response, &url).await?;
        Self::parse_json(response, &url).await
    }
}
