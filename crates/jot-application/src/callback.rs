//! OAuth callback handling.
//!
//! The provider redirects the user agent back with either an
//! authorization code or an error. This handler exchanges the code for a
//! session and decides where to send the user agent next: the
//! application root on success, `/?error=<code>` otherwise.

use jot_core::backend::AuthService;
use jot_core::error::JotError;
use url::Url;

/// Error code when the service rejected the authorization code.
pub const ERROR_EXCHANGE_FAILED: &str = "exchange_failed";
/// Error code for any other failure while handling the callback.
pub const ERROR_CALLBACK: &str = "callback_error";

/// Where the callback sends the user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackRedirect {
    /// Sign-in completed (or there was nothing to do).
    Root,
    /// Something failed; the code is surfaced as a query parameter.
    Error(String),
}

impl CallbackRedirect {
    /// The redirect target, relative to the application origin.
    pub fn location(&self) -> String {
        match self {
            Self::Root => "/".to_string(),
            Self::Error(code) => format!("/?error={code}"),
        }
    }
}

/// Handles the OAuth callback URL.
///
/// A provider-reported error passes its code through unchanged; a
/// rejected exchange becomes [`ERROR_EXCHANGE_FAILED`]; any unexpected
/// failure becomes [`ERROR_CALLBACK`]. A callback with neither code nor
/// error just returns to the root.
pub async fn handle_oauth_callback(auth: &dyn AuthService, callback_url: &str) -> CallbackRedirect {
    let url = match Url::parse(callback_url) {
        Ok(url) => url,
        Err(err) => {
            tracing::error!(%err, "malformed callback URL");
            return CallbackRedirect::Error(ERROR_CALLBACK.to_string());
        }
    };

    let mut code = None;
    let mut provider_error = None;
    let mut error_description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => provider_error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = provider_error {
        tracing::error!(%error, description = ?error_description, "provider reported error");
        return CallbackRedirect::Error(error);
    }

    if let Some(code) = code {
        match auth.exchange_code(&code).await {
            Ok(user) => {
                tracing::info!(email = %user.email, "code exchange successful");
            }
            Err(JotError::Auth(err)) => {
                tracing::error!(%err, "code exchange rejected");
                return CallbackRedirect::Error(ERROR_EXCHANGE_FAILED.to_string());
            }
            Err(err) => {
                tracing::error!(%err, "callback handling failed");
                return CallbackRedirect::Error(ERROR_CALLBACK.to_string());
            }
        }
    }

    CallbackRedirect::Root
}
