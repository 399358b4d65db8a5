//! Directory operations consumed by the LDAP realm

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::context::LdapUserContext;
use crate::error::DirectoryResult;

/// Access to the directory holding user entries and group memberships.
///
/// Implementations own connection handling, filters and timeouts; the realm
/// only sequences these calls and classifies their failures.
#[async_trait]
pub trait LdapSupport: Send + Sync {
    /// Locate the entry of a user by login name
    async fn find_user(&self, username: &str) -> DirectoryResult<LdapUserContext>;

    /// Open an entry directly from a DN captured earlier
    async fn create_user_context(&self, dn: &str) -> DirectoryResult<LdapUserContext>;

    /// Verify a password against the entry. An `INVALID_CREDENTIALS` result
    /// code means the password was wrong.
    async fn authenticate(&self, context: &LdapUserContext, password: &str)
        -> DirectoryResult<()>;

    async fn attribute_value(
        &self,
        context: &LdapUserContext,
        name: &str,
    ) -> DirectoryResult<Option<String>>;

    /// Names of the groups the entry belongs to
    async fn retrieve_user_groups(
        &self,
        context: &LdapUserContext,
    ) -> DirectoryResult<BTreeSet<String>>;
}
