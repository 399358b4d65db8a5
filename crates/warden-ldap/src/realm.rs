//! Realm verifying username/password tokens against an LDAP directory

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use warden_core::{
    AuthError, AuthResult, AuthenticationInfo, AuthenticationToken, Principal, Principals,
    PolicyRegistry, Realm, RealmPolicies, RoleMapping, RolePermissionResolver, TokenKind,
};

use crate::context::{LdapUserContext, USER_CONTEXT_PRINCIPAL};
use crate::error::LdapError;
use crate::support::LdapSupport;

/// LDAP-backed realm
pub struct LdapRealm {
    name: String,
    support: Arc<dyn LdapSupport>,
    policies: RealmPolicies,
    display_name_attribute: String,
}

impl LdapRealm {
    pub const DEFAULT_NAME: &'static str = "ldap";

    pub fn new(
        name: impl Into<String>,
        support: Arc<dyn LdapSupport>,
        policies: RealmPolicies,
    ) -> Self {
        Self {
            name: name.into(),
            support,
            policies,
            display_name_attribute: "cn".to_string(),
        }
    }

    /// Build a realm with the policies registered under its name
    pub fn from_registry(
        name: impl Into<String>,
        support: Arc<dyn LdapSupport>,
        registry: &PolicyRegistry,
    ) -> warden_core::Result<Self> {
        let name = name.into();
        let policies = registry.policies_for(&name)?;
        Ok(Self::new(name, support, policies))
    }

    /// Attribute read into the full-name principal
    pub fn with_display_name_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.display_name_attribute = attribute.into();
        self
    }

    async fn verify(&self, username: &str, password: &[u8]) -> AuthResult<AuthenticationInfo> {
        let context = self
            .support
            .find_user(username)
            .await
            .map_err(|e| self.lookup_failure(e))?;

        debug!("Found user DN: {}", context.dn());

        // Invalid UTF-8 sequences are replaced; the bind decides
        let secret = String::from_utf8_lossy(password);
        self.support
            .authenticate(&context, &secret)
            .await
            .map_err(|e| self.verification_failure(username, e))?;

        let full_name = self
            .support
            .attribute_value(&context, &self.display_name_attribute)
            .await
            .map_err(|e| self.lookup_failure(e))?;

        let mut info = AuthenticationInfo::new(username, password.to_vec())
            .with_principal(Principal::UniqueId(context.dn().to_string()));

        match full_name {
            Some(full_name) => info = info.with_principal(Principal::FullName(full_name)),
            None => debug!(
                "Entry {} has no {} attribute, no full name recorded",
                context.dn(),
                self.display_name_attribute
            ),
        }

        Ok(info.with_principal(Principal::attached(
            USER_CONTEXT_PRINCIPAL,
            Arc::new(context),
        )))
    }

    fn lookup_failure(&self, err: LdapError) -> AuthError {
        warn!(realm = %self.name, code = %err.code, "Directory lookup failed: {}", err.message);
        AuthError::AuthenticationFailed(err.message)
    }

    fn verification_failure(&self, username: &str, err: LdapError) -> AuthError {
        if err.is_invalid_credentials() {
            debug!(realm = %self.name, "Invalid credentials for user: {}", username);
            AuthError::IncorrectCredentials(err.message)
        } else {
            warn!(realm = %self.name, code = %err.code, "Password verification failed: {}", err.message);
            AuthError::AuthenticationFailed(err.message)
        }
    }
}

#[async_trait]
impl Realm for LdapRealm {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_token(&self) -> TokenKind {
        TokenKind::UsernamePassword
    }

    async fn authentication_info(
        &self,
        token: &AuthenticationToken,
    ) -> AuthResult<AuthenticationInfo> {
        match token {
            AuthenticationToken::UsernamePassword(token) => {
                self.verify(&token.username, &token.password).await
            }
            other => Err(AuthError::UnsupportedToken(format!(
                "Realm {} only supports {} tokens, got {}",
                self.name,
                self.supported_token(),
                other.kind()
            ))),
        }
    }

    async fn realm_roles(
        &self,
        identity: &Principal,
        other_principals: &Principals,
    ) -> AuthResult<BTreeSet<String>> {
        let context: LdapUserContext = match other_principals.unique_id() {
            Some(dn) => {
                debug!("Resolving roles from stored DN: {}", dn);
                self.support.create_user_context(dn).await
            }
            None => {
                let username = identity.to_string();
                debug!("Resolving roles by searching for user: {}", username);
                self.support.find_user(&username).await
            }
        }
        .map_err(|e| self.lookup_failure(e))?;

        let groups = self
            .support
            .retrieve_user_groups(&context)
            .await
            .map_err(|e| self.lookup_failure(e))?;

        debug!("Found {} groups for {}", groups.len(), context.dn());
        Ok(groups)
    }

    fn role_mapping(&self) -> Arc<dyn RoleMapping> {
        self.policies.role_mapping.clone()
    }

    fn role_permission_resolver(&self) -> Arc<dyn RolePermissionResolver> {
        self.policies.role_permission_resolver.clone()
    }
}
