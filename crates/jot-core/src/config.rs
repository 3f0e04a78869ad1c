//! Backend connection configuration.
//!
//! Configuration priority: explicit construction > environment variables.
//! Construction fails fast on missing or empty required parameters rather
//! than handing out a client that cannot reach anything.

use crate::error::{JotError, Result};
use std::env;

/// Environment variable holding the service endpoint URL.
pub const ENV_BACKEND_URL: &str = "JOT_BACKEND_URL";
/// Environment variable holding the public (anonymous) API key.
pub const ENV_ANON_KEY: &str = "JOT_ANON_KEY";
/// Environment variable holding the optional elevated-privilege key.
pub const ENV_SERVICE_ROLE_KEY: &str = "JOT_SERVICE_ROLE_KEY";

/// Connection parameters for the hosted identity + storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the hosted service.
    pub url: String,
    /// Public API key sent with every request.
    pub anon_key: String,
    /// Elevated-privilege key for server-side use. Never required.
    pub service_role_key: Option<String>,
}

impl BackendConfig {
    /// Creates a configuration from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`JotError::Config`] if either required parameter is
    /// missing or blank.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        let url = url.into().trim().to_string();
        let anon_key = anon_key.into().trim().to_string();

        if url.is_empty() {
            return Err(JotError::config(format!(
                "backend URL is empty (set {ENV_BACKEND_URL})"
            )));
        }
        if anon_key.is_empty() {
            return Err(JotError::config(format!(
                "anonymous API key is empty (set {ENV_ANON_KEY})"
            )));
        }

        Ok(Self {
            url,
            anon_key,
            service_role_key: None,
        })
    }

    /// Attaches the elevated-privilege key.
    pub fn with_service_role_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into().trim().to_string();
        self.service_role_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Loads the configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`JotError::Config`] naming the missing variable.
    pub fn from_env() -> Result<Self> {
        let url = env::var(ENV_BACKEND_URL)
            .map_err(|_| JotError::config(format!("{ENV_BACKEND_URL} not set")))?;
        let anon_key = env::var(ENV_ANON_KEY)
            .map_err(|_| JotError::config(format!("{ENV_ANON_KEY} not set")))?;

        let mut config = Self::new(url, anon_key)?;
        if let Ok(key) = env::var(ENV_SERVICE_ROLE_KEY) {
            config = config.with_service_role_key(key);
        }
        Ok(config)
    }

    /// Loads the configuration from environment variables, returning
    /// `None` when the required variables are absent or blank.
    ///
    /// This is the gate the session-refresh middleware uses: absent
    /// configuration means "pass through", not an error.
    pub fn from_env_opt() -> Option<Self> {
        Self::from_env().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_construction() {
        let config = BackendConfig::new("https://db.example.com", "anon-key").unwrap();
        assert_eq!(config.url, "https://db.example.com");
        assert_eq!(config.anon_key, "anon-key");
        assert!(config.service_role_key.is_none());
    }

    #[test]
    fn test_empty_url_fails_fast() {
        let err = BackendConfig::new("   ", "anon-key").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains(ENV_BACKEND_URL));
    }

    #[test]
    fn test_empty_key_fails_fast() {
        let err = BackendConfig::new("https://db.example.com", "").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_blank_service_role_key_is_dropped() {
        let config = BackendConfig::new("https://db.example.com", "anon-key")
            .unwrap()
            .with_service_role_key("  ");
        assert!(config.service_role_key.is_none());

        let config = BackendConfig::new("https://db.example.com", "anon-key")
            .unwrap()
            .with_service_role_key("service-key");
        assert_eq!(config.service_role_key.as_deref(), Some("service-key"));
    }
}
