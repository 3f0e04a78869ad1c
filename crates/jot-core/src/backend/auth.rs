//! Identity/session boundary trait.

use crate::error::Result;
use crate::session::{AuthUser, SessionChange};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// OAuth providers the identity service can delegate to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Github,
    Google,
}

/// An abstract client for the remote identity service.
///
/// Implementations own session persistence (tokens) internally; callers
/// only ever observe the resolved [`AuthUser`] or its absence.
///
/// Change notifications cover every auth-state transition the client
/// itself performs: sign-in, sign-out, and token refresh. There is no
/// server push; a session revoked remotely is only noticed on the next
/// request.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolves the currently authenticated user, if any.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(user))`: a session is present
    /// - `Ok(None)`: no session (or the stored token is no longer valid)
    /// - `Err(_)`: the service could not be reached
    async fn current_session(&self) -> Result<Option<AuthUser>>;

    /// Begins an OAuth sign-in by building the provider authorization
    /// URL the user agent must visit. The provider redirects back to
    /// `redirect_url` with an authorization code.
    async fn sign_in_oauth(&self, provider: OAuthProvider, redirect_url: &str) -> Result<String>;

    /// Exchanges an authorization code (from the OAuth callback) for a
    /// session.
    async fn exchange_code(&self, code: &str) -> Result<AuthUser>;

    /// Signs in with an email/password pair.
    ///
    /// # Errors
    ///
    /// [`crate::error::AuthErrorKind::InvalidCredentials`] when the
    /// service rejects the pair; a provider-kind error otherwise.
    async fn sign_in_password(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Registers a new email/password account. `redirect_url` is where
    /// the confirmation link sends the user agent.
    async fn sign_up_password(
        &self,
        email: &str,
        password: &str,
        redirect_url: &str,
    ) -> Result<AuthUser>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Refreshes the current session against the service, returning the
    /// (possibly re-issued) user. Used by the session-refresh
    /// middleware.
    async fn refresh_session(&self) -> Result<Option<AuthUser>>;

    /// Subscribes to auth-state change notifications. Dropping the
    /// receiver releases the subscription.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_provider_round_trip() {
        assert_eq!(OAuthProvider::Github.to_string(), "github");
        assert_eq!(
            OAuthProvider::from_str("google").unwrap(),
            OAuthProvider::Google
        );
        assert!(OAuthProvider::from_str("myspace").is_err());
    }
}
