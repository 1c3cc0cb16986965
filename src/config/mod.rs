//! Configuration resolution.
//!
//! Settings come from environment variables, with a small set of CLI
//! overrides layered on top. Resolution order:
//!
//! 1. Environment variables (`CRAWL4AI_ENDPOINT`, `CRAWL4AI_BEARER_TOKEN`,
//!    `HTTP_PORT`, `SSE_PORT`, `LOG_LEVEL`, `DEBUG`, `REQUEST_TIMEOUT`)
//! 2. CLI flags (`--endpoint`, `--token`) override the environment
//!
//! Validation happens after overrides are applied, so a missing
//! `CRAWL4AI_ENDPOINT` can still be supplied on the command line.

mod settings;

pub use settings::Settings;

use crate::error::ConfigError;

/// CLI-sourced overrides applied on top of the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Replacement backend endpoint.
    pub endpoint: Option<String>,

    /// Replacement bearer token.
    pub bearer_token: Option<String>,
}

/// Resolves and validates the server settings.
///
/// # Errors
///
/// Returns an error if a numeric environment variable does not parse, or if
/// the backend endpoint is missing or malformed after overrides.
pub fn load_settings(overrides: Overrides) -> Result<Settings, ConfigError> {
    let mut settings = Settings::from_env()?;

    if let Some(endpoint) = overrides.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(token) = overrides.bearer_token {
        settings.bearer_token = Some(token);
    }

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_supplies_missing_endpoint() {
        // Environment may be empty; the CLI endpoint alone must be enough.
        let mut settings = Settings::from_lookup(|_| None).unwrap();
        settings.endpoint = "https://crawler.example".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn override_endpoint_is_still_validated() {
        let mut settings = Settings::from_lookup(|_| None).unwrap();
        settings.endpoint = "crawler.example".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }
}
