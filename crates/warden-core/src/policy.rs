//! Role mapping and permission resolution policies
//!
//! Realms do not interpret these objects; they hold the instances they were
//! built with and hand them back to the engine. Policies are registered under
//! keys scoped to a realm name so two realms of the same kind can carry
//! independent policies.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::PolicyConfig;
use crate::error::{Error, Result};

/// Maps the roles a realm reports to the engine's application roles
pub trait RoleMapping: Send + Sync {
    fn resolve_roles(&self, realm_roles: &BTreeSet<String>) -> BTreeSet<String>;
}

/// Resolves the permissions granted by an application role
pub trait RolePermissionResolver: Send + Sync {
    fn resolve_permissions_in_role(&self, role: &str) -> Vec<String>;
}

/// Registry key of a realm's role mapping
pub fn role_mapping_key(realm: &str) -> String {
    format!("{}-role-mapping", realm)
}

/// Registry key of a realm's permission resolver
pub fn role_permission_resolver_key(realm: &str) -> String {
    format!("{}-role-permission-resolver", realm)
}

// ============================================================================
// Config-driven implementations
// ============================================================================

/// Group to role mapping with a fallback role set
#[derive(Debug, Clone, Default)]
pub struct ConfigRoleMapping {
    group_roles: HashMap<String, Vec<String>>,
    default_roles: Vec<String>,
}

impl ConfigRoleMapping {
    pub fn new(group_roles: HashMap<String, Vec<String>>, default_roles: Vec<String>) -> Self {
        Self {
            group_roles,
            default_roles,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.group_roles.clone(), config.default_roles.clone())
    }
}

impl RoleMapping for ConfigRoleMapping {
    fn resolve_roles(&self, realm_roles: &BTreeSet<String>) -> BTreeSet<String> {
        let mut roles = BTreeSet::new();

        for group in realm_roles {
            if let Some(mapped) = self.group_roles.get(group) {
                roles.extend(mapped.iter().cloned());
            }
        }

        // Default roles if no group mapping matched
        if roles.is_empty() {
            roles.extend(self.default_roles.iter().cloned());
        }

        roles
    }
}

/// Static role to permission table
#[derive(Debug, Clone, Default)]
pub struct ConfigRolePermissionResolver {
    role_permissions: HashMap<String, Vec<String>>,
}

impl ConfigRolePermissionResolver {
    pub fn new(role_permissions: HashMap<String, Vec<String>>) -> Self {
        Self { role_permissions }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.role_permissions.clone())
    }
}

impl RolePermissionResolver for ConfigRolePermissionResolver {
    fn resolve_permissions_in_role(&self, role: &str) -> Vec<String> {
        self.role_permissions.get(role).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// The pair of policies a realm instance is built with
#[derive(Clone)]
pub struct RealmPolicies {
    pub role_mapping: Arc<dyn RoleMapping>,
    pub role_permission_resolver: Arc<dyn RolePermissionResolver>,
}

impl RealmPolicies {
    pub fn new(
        role_mapping: Arc<dyn RoleMapping>,
        role_permission_resolver: Arc<dyn RolePermissionResolver>,
    ) -> Self {
        Self {
            role_mapping,
            role_permission_resolver,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(
            Arc::new(ConfigRoleMapping::from_config(config)),
            Arc::new(ConfigRolePermissionResolver::from_config(config)),
        )
    }
}

impl fmt::Debug for RealmPolicies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealmPolicies").finish_non_exhaustive()
    }
}

/// Policies keyed by `<realm>-role-mapping` / `<realm>-role-permission-resolver`
#[derive(Default)]
pub struct PolicyRegistry {
    role_mappings: HashMap<String, Arc<dyn RoleMapping>>,
    permission_resolvers: HashMap<String, Arc<dyn RolePermissionResolver>>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_role_mapping(&mut self, realm: &str, mapping: Arc<dyn RoleMapping>) {
        let key = role_mapping_key(realm);
        debug!("Registering role mapping: {}", key);
        self.role_mappings.insert(key, mapping);
    }

    pub fn register_role_permission_resolver(
        &mut self,
        realm: &str,
        resolver: Arc<dyn RolePermissionResolver>,
    ) {
        let key = role_permission_resolver_key(realm);
        debug!("Registering role permission resolver: {}", key);
        self.permission_resolvers.insert(key, resolver);
    }

    /// Register both config-driven policies for a realm
    pub fn register_from_config(&mut self, realm: &str, config: &PolicyConfig) {
        let policies = RealmPolicies::from_config(config);
        self.register_role_mapping(realm, policies.role_mapping);
        self.register_role_permission_resolver(realm, policies.role_permission_resolver);
    }

    /// Policies registered for the given realm name
    pub fn policies_for(&self, realm: &str) -> Result<RealmPolicies> {
        let mapping_key = role_mapping_key(realm);
        let role_mapping = self
            .role_mappings
            .get(&mapping_key)
            .cloned()
            .ok_or_else(|| Error::InvalidConfig(format!("No policy registered as {}", mapping_key)))?;

        let resolver_key = role_permission_resolver_key(realm);
        let role_permission_resolver = self
            .permission_resolvers
            .get(&resolver_key)
            .cloned()
            .ok_or_else(|| {
                Error::InvalidConfig(format!("No policy registered as {}", resolver_key))
            })?;

        Ok(RealmPolicies::new(role_mapping, role_permission_resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn policy_config() -> PolicyConfig {
        let mut group_roles = HashMap::new();
        group_roles.insert("admins".to_string(), vec!["admin".to_string()]);
        group_roles.insert(
            "developers".to_string(),
            vec!["reader".to_string(), "writer".to_string()],
        );

        let mut role_permissions = HashMap::new();
        role_permissions.insert(
            "writer".to_string(),
            vec!["docs:read".to_string(), "docs:write".to_string()],
        );

        PolicyConfig {
            group_roles,
            default_roles: vec!["guest".to_string()],
            role_permissions,
        }
    }

    #[test]
    fn test_group_role_mapping() {
        let mapping = ConfigRoleMapping::from_config(&policy_config());

        let roles = mapping.resolve_roles(&set(&["admins", "developers"]));
        assert_eq!(roles, set(&["admin", "reader", "writer"]));

        // User in unknown group gets default
        let roles = mapping.resolve_roles(&set(&["unknown"]));
        assert_eq!(roles, set(&["guest"]));
    }

    #[test]
    fn test_permission_resolution() {
        let resolver = ConfigRolePermissionResolver::from_config(&policy_config());

        assert_eq!(
            resolver.resolve_permissions_in_role("writer"),
            vec!["docs:read".to_string(), "docs:write".to_string()]
        );
        assert!(resolver.resolve_permissions_in_role("nobody").is_empty());
    }

    #[test]
    fn test_registry_keys_are_realm_scoped() {
        let mut registry = PolicyRegistry::new();
        registry.register_from_config("corp", &policy_config());
        registry.register_from_config("partners", &PolicyConfig::default());

        let corp = registry.policies_for("corp").unwrap();
        let partners = registry.policies_for("partners").unwrap();

        assert_eq!(
            corp.role_mapping.resolve_roles(&set(&["admins"])),
            set(&["admin"])
        );
        assert!(partners.role_mapping.resolve_roles(&set(&["admins"])).is_empty());
    }

    #[test]
    fn test_registry_missing_policy_is_config_error() {
        let mut registry = PolicyRegistry::new();
        registry.register_role_mapping("corp", Arc::new(ConfigRoleMapping::default()));

        let err = registry.policies_for("corp").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("corp-role-permission-resolver")));
        assert!(registry.policies_for("other").is_err());
    }

    #[test]
    fn test_keys() {
        assert_eq!(role_mapping_key("ldap"), "ldap-role-mapping");
        assert_eq!(
            role_permission_resolver_key("ldap"),
            "ldap-role-permission-resolver"
        );
    }
}
