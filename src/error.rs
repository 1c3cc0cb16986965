//! Error types for crawl4ai-mcp.
//!
//! # Security Note
//!
//! Error messages never include the bearer token. Variants that could carry
//! request state only name the target URL and the backend's own response.

use thiserror::Error;

/// Errors that can occur while resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The backend endpoint was not provided at all.
    #[error(
        "CRAWL4AI_ENDPOINT is required; set the environment variable or pass --endpoint"
    )]
    MissingEndpoint,

    /// The backend endpoint is not an http(s) URL.
    #[error("invalid CRAWL4AI_ENDPOINT '{url}': must start with http:// or https://")]
    InvalidEndpoint {
        /// The rejected value.
        url: String,
    },

    /// A numeric environment variable could not be parsed.
    #[error("invalid value for {name}: '{value}' is not a number")]
    InvalidNumber {
        /// The environment variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Errors raised by the Crawl4AI backend client.
///
/// The variants are distinguishable so callers could branch on them, though
/// the tool handlers only use them to format a human-readable message.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },

    /// The request exceeded the configured timeout.
    #[error("timeout calling Crawl4AI API: {url}")]
    Timeout {
        /// The target URL.
        url: String,
    },

    /// The request failed below the HTTP layer (DNS, refused connection, ...).
    #[error("error calling Crawl4AI API: {source}")]
    Transport {
        /// The target URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not valid JSON.
    #[error("invalid JSON from Crawl4AI API at {url}: {source}")]
    Decode {
        /// The target URL.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

/// Errors raised by tool registry lookups.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No handler is registered under the requested name.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// The requested tool name.
        name: String,
    },
}
