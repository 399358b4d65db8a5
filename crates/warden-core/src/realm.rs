//! Realm trait
//!
//! A realm turns a credential token into an authenticated identity and, given
//! an identity, reports the roles it holds in the realm's identity source.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::policy::{RoleMapping, RolePermissionResolver};
use crate::types::{AuthenticationInfo, AuthenticationToken, Principal, Principals, TokenKind};

#[async_trait]
pub trait Realm: Send + Sync {
    /// Name the realm's policies are registered under
    fn name(&self) -> &str;

    /// The single token kind this realm accepts
    fn supported_token(&self) -> TokenKind;

    fn supports(&self, token: &AuthenticationToken) -> bool {
        token.kind() == self.supported_token()
    }

    /// Verify the token and build the identity it proves
    async fn authentication_info(
        &self,
        token: &AuthenticationToken,
    ) -> AuthResult<AuthenticationInfo>;

    /// Roles held by an identity in this realm
    async fn realm_roles(
        &self,
        identity: &Principal,
        other_principals: &Principals,
    ) -> AuthResult<BTreeSet<String>>;

    fn role_mapping(&self) -> Arc<dyn RoleMapping>;

    fn role_permission_resolver(&self) -> Arc<dyn RolePermissionResolver>;
}
