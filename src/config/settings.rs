//! Runtime settings resolved from the environment.
//!
//! The server is configured entirely through environment variables (plus the
//! CLI overrides applied in [`super::load_settings`]). There is no config
//! file: deployments of this proxy are container- and supervisor-driven.

use std::time::Duration;

use crate::error::ConfigError;

/// Default port for the streamable HTTP mode.
const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default port for the SSE mode.
const DEFAULT_SSE_PORT: u16 = 9001;

/// Default backend request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the Crawl4AI backend (required).
    pub endpoint: String,

    /// Optional bearer token sent on every backend call.
    pub bearer_token: Option<String>,

    /// Listen port for the streamable HTTP mode.
    pub http_port: u16,

    /// Listen port for the SSE mode.
    pub sse_port: u16,

    /// Log level name used when no `-v`/`-q` flag overrides it.
    pub log_level: String,

    /// Debug flag; widens logging.
    pub debug: bool,

    /// Timeout applied to every backend request.
    pub request_timeout: Duration,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse. Endpoint
    /// validation is deferred to [`Self::validate`] so CLI overrides can be
    /// applied first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    ///
    /// Split out from [`Self::from_env`] so tests can supply a fixed map
    /// instead of mutating the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup("CRAWL4AI_ENDPOINT").unwrap_or_default();
        let bearer_token = lookup("CRAWL4AI_BEARER_TOKEN").filter(|t| !t.is_empty());

        let http_port = parse_var(&lookup, "HTTP_PORT", DEFAULT_HTTP_PORT)?;
        let sse_port = parse_var(&lookup, "SSE_PORT", DEFAULT_SSE_PORT)?;
        let timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let debug = lookup("DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(Self {
            endpoint,
            bearer_token,
            http_port,
            sse_port,
            log_level,
            debug,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Validates the resolved settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend endpoint is missing or is not an
    /// http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidEndpoint {
                url: self.endpoint.clone(),
            });
        }
        Ok(())
    }

    /// Returns the full URL for a backend API route.
    ///
    /// Joins the configured base URL and the route with exactly one slash.
    #[must_use]
    pub fn crawl_url(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// Masked description of the bearer token for startup logging.
    #[must_use]
    pub fn auth_description(&self) -> &'static str {
        if self.bearer_token.is_some() {
            "bearer token configured"
        } else {
            "no bearer token (public access)"
        }
    }
}

/// Parses an optional numeric environment variable with a default.
fn parse_var<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}
