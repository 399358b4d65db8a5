//! Error types for Warden

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Result of a realm operation
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Authentication errors a realm may raise.
///
/// The set is closed: realms translate whatever their identity source reports
/// into one of these kinds, so the engine can apply policy without knowing
/// which directory produced the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The realm was handed a token kind it does not handle.
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),

    /// The identity source explicitly rejected the credentials.
    #[error("Incorrect credentials: {0}")]
    IncorrectCredentials(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UnsupportedToken(_) => "UnsupportedToken",
            AuthError::IncorrectCredentials(_) => "IncorrectCredentials",
            AuthError::AuthenticationFailed(_) => "AuthenticationFailed",
        }
    }

    /// Message carried by the error, without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            AuthError::UnsupportedToken(msg)
            | AuthError::IncorrectCredentials(msg)
            | AuthError::AuthenticationFailed(msg) => msg,
        }
    }

    /// True when the failure is attributable to the supplied credentials,
    /// which is what lockout counters should count.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, AuthError::IncorrectCredentials(_))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidConfig(_) => "InvalidConfig",
            Error::Auth(e) => e.code(),
            Error::Io(_) => "InternalError",
            Error::Other(_) => "InternalError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_codes_are_stable() {
        assert_eq!(
            AuthError::UnsupportedToken("x".into()).code(),
            "UnsupportedToken"
        );
        assert_eq!(
            AuthError::IncorrectCredentials("x".into()).code(),
            "IncorrectCredentials"
        );
        assert_eq!(
            AuthError::AuthenticationFailed("x".into()).code(),
            "AuthenticationFailed"
        );
    }

    #[test]
    fn test_only_incorrect_credentials_counts_as_credential_failure() {
        assert!(AuthError::IncorrectCredentials("bad".into()).is_credential_failure());
        assert!(!AuthError::AuthenticationFailed("down".into()).is_credential_failure());
        assert!(!AuthError::UnsupportedToken("bearer".into()).is_credential_failure());
    }

    #[test]
    fn test_message_and_display() {
        let err = AuthError::AuthenticationFailed("connection refused".into());
        assert_eq!(err.message(), "connection refused");
        assert_eq!(err.to_string(), "Authentication failed: connection refused");
    }

    #[test]
    fn test_wrapped_auth_error_keeps_code() {
        let err: Error = AuthError::IncorrectCredentials("nope".into()).into();
        assert_eq!(err.code(), "IncorrectCredentials");
        assert_eq!(Error::InvalidConfig("x".into()).code(), "InvalidConfig");
    }
}
