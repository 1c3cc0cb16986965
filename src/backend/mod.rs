//! HTTP client for the Crawl4AI backend.
//!
//! Every tool handler funnels its backend call through [`Crawl4aiClient`].
//! The client owns the timeout, the optional bearer token and the mapping of
//! transport failures onto the [`ApiError`] taxonomy; handlers only decide
//! what to send and how to present what comes back.

use serde_json::Value;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::ApiError;

/// Shared client for the Crawl4AI JSON API.
pub struct Crawl4aiClient {
    http: reqwest::Client,
    endpoint: String,
    bearer_token: Option<String>,
}

impl Crawl4aiClient {
    /// Builds a client from the resolved settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            bearer_token: settings.bearer_token.clone(),
        })
    }

    /// Returns the full URL for a backend route.
    #[must_use]
    pub fn route_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// POSTs a JSON body to a backend route and returns the parsed response.
    ///
    /// Adds `Content-Type: application/json` always and `Authorization:
    /// Bearer <token>` when a token is configured.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] for non-2xx responses, carrying the status code
    ///   and the raw body
    /// - [`ApiError::Timeout`] when the configured deadline elapses
    /// - [`ApiError::Transport`] for DNS/connection-level failures
    /// - [`ApiError::Decode`] when the response body is not valid JSON
    pub async fn call(&self, route: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.route_url(route);

        info!(%url, "calling Crawl4AI API");
        debug!(request = %body, "request body");

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout { url: url.clone() }
            } else {
                ApiError::Transport {
                    url: url.clone(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        info!(status = status.as_u16(), "Crawl4AI API responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout { url: url.clone() }
            } else {
                ApiError::Decode { url, source: e }
            }
        })?;

        debug!(response = %value, "response body");
        Ok(value)
    }
}
