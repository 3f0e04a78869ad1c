//! Session-refresh middleware.
//!
//! Keeps the remote session alive as requests pass through. When the
//! backend configuration is absent the middleware is a pure
//! pass-through; refresh failures are logged, never raised, and the
//! request always comes back unchanged.

use jot_core::backend::AuthService;
use jot_core::config::BackendConfig;
use jot_infrastructure::HttpBackend;
use std::sync::Arc;

/// Pass-through request wrapper that refreshes the session as a side
/// effect when it can.
pub struct SessionRefresh {
    auth: Option<Arc<dyn AuthService>>,
}

impl SessionRefresh {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth: Some(auth) }
    }

    /// A middleware that does nothing.
    pub fn disabled() -> Self {
        Self { auth: None }
    }

    /// Builds the middleware from environment configuration. Absent or
    /// invalid configuration yields the disabled pass-through, not an
    /// error.
    pub fn from_env() -> Self {
        let Some(config) = BackendConfig::from_env_opt() else {
            tracing::debug!("backend configuration absent, session refresh disabled");
            return Self::disabled();
        };
        match HttpBackend::connect(&config) {
            Ok(backend) => Self::new(backend.auth),
            Err(err) => {
                tracing::warn!(%err, "backend client construction failed, session refresh disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.auth.is_some()
    }

    /// Passes `request` through unchanged, refreshing the session on the
    /// way when configured.
    pub async fn handle<R>(&self, request: R) -> R {
        if let Some(auth) = &self.auth {
            if let Err(err) = auth.refresh_session().await {
                tracing::error!(%err, "session refresh failed");
            }
        }
        request
    }
}
