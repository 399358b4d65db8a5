//! Directory error types

use std::fmt;

use thiserror::Error;

/// Result type for directory operations
pub type DirectoryResult<T> = Result<T, LdapError>;

/// LDAP result code (RFC 4511 plus client-side codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);
    pub const OPERATIONS_ERROR: ResultCode = ResultCode(1);
    pub const SIZE_LIMIT_EXCEEDED: ResultCode = ResultCode(4);
    pub const NO_SUCH_OBJECT: ResultCode = ResultCode(32);
    pub const INVALID_DN_SYNTAX: ResultCode = ResultCode(34);
    pub const INVALID_CREDENTIALS: ResultCode = ResultCode(49);
    pub const INSUFFICIENT_ACCESS_RIGHTS: ResultCode = ResultCode(50);
    pub const BUSY: ResultCode = ResultCode(51);
    pub const UNAVAILABLE: ResultCode = ResultCode(52);
    pub const UNWILLING_TO_PERFORM: ResultCode = ResultCode(53);
    pub const SERVER_DOWN: ResultCode = ResultCode(81);
    pub const TIMEOUT: ResultCode = ResultCode(85);
    pub const CONNECT_ERROR: ResultCode = ResultCode(91);

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        match self.0 {
            0 => "success",
            1 => "operationsError",
            4 => "sizeLimitExceeded",
            32 => "noSuchObject",
            34 => "invalidDNSyntax",
            49 => "invalidCredentials",
            50 => "insufficientAccessRights",
            51 => "busy",
            52 => "unavailable",
            53 => "unwillingToPerform",
            81 => "serverDown",
            85 => "timeout",
            91 => "connectError",
            _ => "other",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.name())
    }
}

/// Failure reported by a directory operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("LDAP error {code}: {message}")]
pub struct LdapError {
    pub code: ResultCode,
    pub message: String,
}

impl LdapError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_not_found(username: &str) -> Self {
        Self::new(
            ResultCode::NO_SUCH_OBJECT,
            format!("User not found: {}", username),
        )
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ResultCode::CONNECT_ERROR, message)
    }

    /// Build from a server result code and diagnostic text
    pub fn from_result(rc: u32, text: &str) -> Self {
        let code = ResultCode(rc);
        let message = if text.is_empty() {
            format!("Operation failed with result code {}", code)
        } else {
            text.to_string()
        };
        Self::new(code, message)
    }

    pub fn is_invalid_credentials(&self) -> bool {
        self.code == ResultCode::INVALID_CREDENTIALS
    }
}

impl From<ldap3::LdapError> for LdapError {
    fn from(err: ldap3::LdapError) -> Self {
        match err {
            ldap3::LdapError::LdapResult { result } => Self::from_result(result.rc, &result.text),
            other => Self::connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result_keeps_code_and_text() {
        let err = LdapError::from_result(49, "80090308: LdapErr: DSID-0C09042A");
        assert!(err.is_invalid_credentials());
        assert_eq!(err.message, "80090308: LdapErr: DSID-0C09042A");
    }

    #[test]
    fn test_from_result_without_text() {
        let err = LdapError::from_result(52, "");
        assert_eq!(err.code, ResultCode::UNAVAILABLE);
        assert!(err.message.contains("52 (unavailable)"));
    }

    #[test]
    fn test_helpers() {
        let err = LdapError::user_not_found("bob");
        assert_eq!(err.code, ResultCode::NO_SUCH_OBJECT);
        assert!(!err.is_invalid_credentials());
        assert_eq!(
            LdapError::connection("refused").code,
            ResultCode::CONNECT_ERROR
        );
        assert_eq!(ResultCode(7).name(), "other");
    }

    #[test]
    fn test_display() {
        let err = LdapError::new(ResultCode::INVALID_CREDENTIALS, "bad password");
        assert_eq!(
            err.to_string(),
            "LDAP error 49 (invalidCredentials): bad password"
        );
    }
}
