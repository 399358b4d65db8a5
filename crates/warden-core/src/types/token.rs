//! Credential tokens

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of credential token, used by engines to route tokens to realms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    UsernamePassword,
    ApiKey,
    Bearer,
    Certificate,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::UsernamePassword => "username_password",
            TokenKind::ApiKey => "api_key",
            TokenKind::Bearer => "bearer",
            TokenKind::Certificate => "certificate",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username and password pair
#[derive(Clone, PartialEq, Eq)]
pub struct UsernamePasswordToken {
    pub username: String,
    pub password: Vec<u8>,
}

impl UsernamePasswordToken {
    pub fn new(username: impl Into<String>, password: impl Into<Vec<u8>>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for UsernamePasswordToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePasswordToken")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials presented to a realm
#[derive(Clone, PartialEq, Eq)]
pub enum AuthenticationToken {
    UsernamePassword(UsernamePasswordToken),
    ApiKey { key_id: String, secret: Vec<u8> },
    Bearer(String),
    /// DER encoded client certificate
    Certificate(Vec<u8>),
}

impl AuthenticationToken {
    pub fn username_password(username: impl Into<String>, password: impl Into<Vec<u8>>) -> Self {
        AuthenticationToken::UsernamePassword(UsernamePasswordToken::new(username, password))
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            AuthenticationToken::UsernamePassword(_) => TokenKind::UsernamePassword,
            AuthenticationToken::ApiKey { .. } => TokenKind::ApiKey,
            AuthenticationToken::Bearer(_) => TokenKind::Bearer,
            AuthenticationToken::Certificate(_) => TokenKind::Certificate,
        }
    }
}

impl From<UsernamePasswordToken> for AuthenticationToken {
    fn from(token: UsernamePasswordToken) -> Self {
        AuthenticationToken::UsernamePassword(token)
    }
}

impl fmt::Debug for AuthenticationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticationToken::UsernamePassword(token) => fmt::Debug::fmt(token, f),
            AuthenticationToken::ApiKey { key_id, .. } => f
                .debug_struct("ApiKey")
                .field("key_id", key_id)
                .field("secret", &"<redacted>")
                .finish(),
            AuthenticationToken::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            AuthenticationToken::Certificate(der) => {
                write!(f, "Certificate({} bytes)", der.len())
            }
        }
    }
}
