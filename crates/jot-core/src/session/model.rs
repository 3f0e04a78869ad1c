//! Session domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Unique user identifier, assigned by the identity service.
    pub id: Uuid,
    /// Email address the account is registered under.
    pub email: String,
}

/// The client's knowledge of the current session.
///
/// `Unknown` is the startup state while the one-time session lookup is
/// pending; consumers must treat it as "loading", never as "signed out".
/// The value is replaced atomically on every change notification; there
/// is no merging of partial session data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The initial lookup has not resolved yet.
    #[default]
    Unknown,
    /// No authenticated user.
    Absent,
    /// An authenticated user is present.
    Present(AuthUser),
}

impl SessionState {
    /// Returns the user when one is present.
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Present(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_accessors() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
        };

        assert!(SessionState::Unknown.is_unknown());
        assert!(SessionState::Unknown.user().is_none());
        assert!(SessionState::Absent.user().is_none());
        assert_eq!(
            SessionState::Present(user.clone()).user(),
            Some(&user)
        );
    }
}
