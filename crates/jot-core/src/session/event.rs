//! Auth-state change notifications.

use super::model::{AuthUser, SessionState};
use serde::{Deserialize, Serialize};

/// A change to the auth state, published by the identity client.
///
/// Covers sign-in, sign-out, and token refresh. Each notification
/// carries the full replacement value; receivers never patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionChange {
    /// A user signed in.
    SignedIn { user: AuthUser },
    /// The current session's token was re-issued.
    TokenRefreshed { user: AuthUser },
    /// The session ended.
    SignedOut,
}

impl SessionChange {
    /// The session state this change resolves to.
    pub fn resolved_state(&self) -> SessionState {
        match self {
            Self::SignedIn { user } | Self::TokenRefreshed { user } => {
                SessionState::Present(user.clone())
            }
            Self::SignedOut => SessionState::Absent,
        }
    }
}
