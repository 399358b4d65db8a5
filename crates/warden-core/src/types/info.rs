//! Authentication result types

use std::fmt;

use super::principal::{Principal, Principals};

/// Outcome of a successful authentication
#[derive(Clone)]
pub struct AuthenticationInfo {
    principal: String,
    credentials: Vec<u8>,
    other_principals: Principals,
}

impl AuthenticationInfo {
    pub fn new(principal: impl Into<String>, credentials: impl Into<Vec<u8>>) -> Self {
        Self {
            principal: principal.into(),
            credentials: credentials.into(),
            other_principals: Principals::new(),
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.other_principals.push(principal);
        self
    }

    /// Primary name the identity authenticated with
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Primary name wrapped as an identity principal, ready for role resolution
    pub fn identity_principal(&self) -> Principal {
        Principal::Identity(self.principal.clone())
    }

    /// Credentials exactly as supplied, for the engine's own matching policy
    pub fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    pub fn other_principals(&self) -> &Principals {
        &self.other_principals
    }

    /// Mutable access for engines enriching the result after the realm
    pub fn other_principals_mut(&mut self) -> &mut Principals {
        &mut self.other_principals
    }
}

impl fmt::Debug for AuthenticationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationInfo")
            .field("principal", &self.principal)
            .field("credentials", &"<redacted>")
            .field("other_principals", &self.other_principals)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_accessors() {
        let info = AuthenticationInfo::new("alice", b"secret".to_vec())
            .with_principal(Principal::UniqueId("uid=alice,dc=example,dc=com".into()))
            .with_principal(Principal::FullName("Alice Liddell".into()));

        assert_eq!(info.principal(), "alice");
        assert_eq!(info.credentials(), b"secret");
        assert_eq!(
            info.other_principals().unique_id(),
            Some("uid=alice,dc=example,dc=com")
        );
        assert!(matches!(info.identity_principal(), Principal::Identity(ref n) if n == "alice"));
        assert!(!format!("{:?}", info).contains("secret"));
    }
}
