//! Error types for the jot workspace.

use thiserror::Error;

/// Distinguishes who is at fault when an authentication attempt fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The user supplied credentials the identity service rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The identity provider itself failed (misconfiguration, outage,
    /// rejected OAuth exchange).
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// A shared error type for the entire jot workspace.
///
/// This provides typed, structured error variants so call sites can react
/// to the failure class without parsing messages.
#[derive(Error, Debug, Clone)]
pub enum JotError {
    /// Configuration error (missing or empty connection parameters).
    /// Fatal at client-construction time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication error, carrying whether the provider or the
    /// credentials were at fault.
    #[error("Authentication error: {0}")]
    Auth(AuthErrorKind),

    /// No stored row matched the given identifiers.
    ///
    /// An ownership mismatch and a nonexistent identifier both manifest
    /// as zero affected rows at the storage boundary, so both surface as
    /// this one kind.
    #[error("Record not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Network or storage failure, normalized at the repository
    /// boundary.
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// The remote service returned a payload we could not decode.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JotError {
    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Auth error for a provider-side failure.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Auth(AuthErrorKind::Provider(message.into()))
    }

    /// Creates an Auth error for rejected credentials.
    pub fn invalid_credentials() -> Self {
        Self::Auth(AuthErrorKind::InvalidCredentials)
    }

    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a DataAccess error.
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    /// Creates a Serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a Config error.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is an Auth error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for JotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A type alias for `Result<T, JotError>`.
pub type Result<T> = std::result::Result<T, JotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_helpers() {
        assert!(JotError::config("missing url").is_config());
        assert!(JotError::invalid_credentials().is_auth());
        assert!(JotError::not_found("note", "abc").is_not_found());
        assert!(!JotError::data_access("boom").is_not_found());
    }

    #[test]
    fn test_display_carries_context() {
        let err = JotError::not_found("note", "n-1");
        assert_eq!(err.to_string(), "Record not found: note 'n-1'");

        let err = JotError::Auth(AuthErrorKind::Provider("outage".into()));
        assert_eq!(
            err.to_string(),
            "Authentication error: identity provider error: outage"
        );
    }
}
