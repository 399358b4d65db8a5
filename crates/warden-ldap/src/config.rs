//! LDAP/Active Directory configuration and status types
//!
//! Supports:
//! - LDAP (OpenLDAP, 389 Directory Server)
//! - Active Directory
//! - Configurable user/group filters and attribute names

use ldap3::ldap_escape;
use serde::{Deserialize, Serialize};

// ============================================================================
// LDAP Configuration
// ============================================================================

/// LDAP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LdapConfig {
    /// LDAP server URL (ldap://, ldaps:// or ldapi://)
    /// Example: "ldap://ldap.example.com:389" or "ldaps://ldap.example.com:636"
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Use STARTTLS for connection upgrade
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Bind DN for LDAP queries (service account)
    /// Example: "cn=admin,dc=example,dc=com"
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password
    #[serde(default)]
    pub bind_password: String,

    /// Base DN for user searches
    /// Example: "ou=users,dc=example,dc=com"
    #[serde(default)]
    pub user_base_dn: String,

    /// User search filter
    /// Use {username} as placeholder
    /// Example: "(uid={username})" or "(sAMAccountName={username})"
    #[serde(default = "default_user_filter")]
    pub user_filter: String,

    /// Base DN for group searches
    /// Example: "ou=groups,dc=example,dc=com"
    #[serde(default)]
    pub group_base_dn: Option<String>,

    /// Group search filter
    /// Use {dn} as placeholder for user DN, {username} for the login name
    /// Example: "(member={dn})" or "(memberUid={username})"
    /// Without it, groups are read from the user's memberOf attribute.
    #[serde(default)]
    pub group_filter: Option<String>,

    /// LDAP attribute mappings
    #[serde(default)]
    pub attribute_mappings: AttributeMappings,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// LDAP server type hint
    #[serde(default)]
    pub server_type: LdapServerType,
}

fn default_server_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_user_filter() -> String {
    "(uid={username})".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            start_tls: false,
            skip_tls_verify: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            user_base_dn: String::new(),
            user_filter: default_user_filter(),
            group_base_dn: None,
            group_filter: None,
            attribute_mappings: AttributeMappings::default(),
            timeout_seconds: default_timeout(),
            server_type: LdapServerType::default(),
        }
    }
}

/// LDAP server type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LdapServerType {
    /// Generic LDAP server
    #[default]
    Ldap,
    /// Microsoft Active Directory
    ActiveDirectory,
    /// OpenLDAP
    OpenLdap,
    /// 389 Directory Server
    Directory389,
}

impl LdapServerType {
    /// Get default user filter for this server type
    pub fn default_user_filter(&self) -> &'static str {
        match self {
            LdapServerType::ActiveDirectory => "(sAMAccountName={username})",
            _ => "(uid={username})",
        }
    }

    /// Get default group filter for this server type
    pub fn default_group_filter(&self) -> &'static str {
        match self {
            LdapServerType::ActiveDirectory => "(member={dn})",
            _ => "(memberUid={username})",
        }
    }
}

/// LDAP attribute mappings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttributeMappings {
    /// Username attribute
    #[serde(default = "default_username_attr")]
    pub username: String,

    /// Display name attribute, recorded as the full-name principal
    #[serde(default = "default_display_name_attr")]
    pub display_name: String,

    /// Group name attribute
    #[serde(default = "default_group_name_attr")]
    pub group_name: String,

    /// User attribute listing group DNs
    #[serde(default = "default_member_of_attr")]
    pub member_of: String,
}

fn default_username_attr() -> String {
    "uid".to_string()
}

fn default_display_name_attr() -> String {
    "cn".to_string()
}

fn default_group_name_attr() -> String {
    "cn".to_string()
}

fn default_member_of_attr() -> String {
    "memberOf".to_string()
}

impl Default for AttributeMappings {
    fn default() -> Self {
        Self {
            username: default_username_attr(),
            display_name: default_display_name_attr(),
            group_name: default_group_name_attr(),
            member_of: default_member_of_attr(),
        }
    }
}

impl AttributeMappings {
    /// Get Active Directory default mappings
    pub fn active_directory() -> Self {
        Self {
            username: "sAMAccountName".to_string(),
            display_name: "displayName".to_string(),
            group_name: "cn".to_string(),
            member_of: "memberOf".to_string(),
        }
    }

    /// Get OpenLDAP default mappings
    pub fn openldap() -> Self {
        Self {
            username: "uid".to_string(),
            display_name: "cn".to_string(),
            group_name: "cn".to_string(),
            member_of: "memberOf".to_string(),
        }
    }
}

// ============================================================================
// LDAP Status
// ============================================================================

/// LDAP connection status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapStatus {
    /// Whether connection is healthy
    pub connected: bool,

    /// Server URL
    pub server_url: String,

    /// Server type
    pub server_type: LdapServerType,

    /// Time of the successful check, RFC 3339
    pub last_connection: Option<String>,

    /// Error message if connection failed
    pub error: Option<String>,

    /// Root DSE details when connected
    pub server_info: Option<LdapServerInfo>,
}

/// LDAP server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapServerInfo {
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub naming_contexts: Vec<String>,
    pub supported_ldap_version: Vec<String>,
}

// ============================================================================
// Helper Functions
// ============================================================================

impl LdapConfig {
    /// Build user search filter with username substitution
    pub fn build_user_filter(&self, username: &str) -> String {
        self.user_filter
            .replace("{username}", &ldap_escape(username))
    }

    /// Build group search filter with DN/username substitution
    pub fn build_group_filter(&self, user_dn: &str, username: &str) -> Option<String> {
        self.group_filter.as_ref().map(|f| {
            f.replace("{dn}", &ldap_escape(user_dn))
                .replace("{username}", &ldap_escape(username))
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server_url.is_empty() {
            return Err("Server URL is required".to_string());
        }

        let url = url::Url::parse(&self.server_url)
            .map_err(|e| format!("Invalid server URL {}: {}", self.server_url, e))?;
        if !matches!(url.scheme(), "ldap" | "ldaps" | "ldapi") {
            return Err("Server URL must start with ldap://, ldaps:// or ldapi://".to_string());
        }

        if self.start_tls && url.scheme() == "ldaps" {
            return Err("STARTTLS cannot be combined with ldaps://".to_string());
        }

        if self.bind_dn.is_empty() {
            return Err("Bind DN is required".to_string());
        }

        if self.user_base_dn.is_empty() {
            return Err("User base DN is required".to_string());
        }

        if self.user_filter.is_empty() {
            return Err("User filter is required".to_string());
        }

        if !self.user_filter.contains("{username}") {
            return Err("User filter must contain {username} placeholder".to_string());
        }

        if let Some(filter) = &self.group_filter {
            if self.group_base_dn.is_none() {
                return Err("Group filter requires a group base DN".to_string());
            }
            if !filter.contains("{dn}") && !filter.contains("{username}") {
                return Err("Group filter must contain {dn} or {username} placeholder".to_string());
            }
        }

        if self.timeout_seconds == 0 {
            return Err("Timeout must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Create configuration from server type with sensible defaults.
    ///
    /// The group filter is left unset: it needs a group base DN, see
    /// [`LdapConfig::apply_group_filter_preset`].
    pub fn from_server_type(server_type: LdapServerType, server_url: &str) -> Self {
        let mut config = Self {
            server_url: server_url.to_string(),
            server_type,
            ..Default::default()
        };

        match server_type {
            LdapServerType::ActiveDirectory => {
                config.user_filter = server_type.default_user_filter().to_string();
                config.attribute_mappings = AttributeMappings::active_directory();
            }
            LdapServerType::OpenLdap | LdapServerType::Directory389 => {
                config.user_filter = server_type.default_user_filter().to_string();
                config.attribute_mappings = AttributeMappings::openldap();
            }
            LdapServerType::Ldap => {
                // Use defaults
            }
        }

        config
    }

    /// Use the server type's group filter when a group base DN is set
    /// without an explicit filter
    pub fn apply_group_filter_preset(&mut self) {
        if self.server_type == LdapServerType::Ldap
            || self.group_base_dn.is_none()
            || self.group_filter.is_some()
        {
            return;
        }
        self.group_filter = Some(self.server_type.default_group_filter().to_string());
    }
}

/// Value of the leading RDN of a DN: `cn=admins,ou=groups` gives `admins`
pub(crate) fn first_rdn_value(dn: &str) -> &str {
    let mut escaped = false;
    let mut end = dn.len();
    for (i, c) in dn.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            ',' | '+' if !escaped => {
                end = i;
                break;
            }
            _ => escaped = false,
        }
    }

    let rdn = &dn[..end];
    match rdn.find('=') {
        Some(pos) => rdn[pos + 1..].trim(),
        None => rdn.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> LdapConfig {
        LdapConfig {
            server_url: "ldap://localhost:389".to_string(),
            bind_dn: "cn=admin,dc=example,dc=com".to_string(),
            user_base_dn: "ou=users,dc=example,dc=com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_filter_building() {
        let config = LdapConfig {
            user_filter: "(uid={username})".to_string(),
            ..Default::default()
        };

        assert_eq!(config.build_user_filter("john"), "(uid=john)");
    }

    #[test]
    fn test_user_filter_escapes_special_characters() {
        let config = LdapConfig::default();

        assert_eq!(
            config.build_user_filter("*)(uid=*"),
            "(uid=\\2a\\29\\28uid=\\2a)"
        );
    }

    #[test]
    fn test_group_filter_building() {
        let config = LdapConfig {
            group_filter: Some("(|(member={dn})(memberUid={username}))".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config
                .build_group_filter("uid=john,ou=users,dc=example,dc=com", "john")
                .unwrap(),
            "(|(member=uid=john,ou=users,dc=example,dc=com)(memberUid=john))"
        );
        assert!(LdapConfig::default().build_group_filter("uid=x", "x").is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LdapConfig {
            server_url: String::new(),
            ..Default::default()
        };

        // Should fail - empty server URL
        assert!(config.validate().is_err());

        config.server_url = "ldap://localhost:389".to_string();
        config.bind_dn = "cn=admin,dc=example,dc=com".to_string();
        config.user_base_dn = "ou=users,dc=example,dc=com".to_string();

        // Should pass now
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let mut config = valid_config();
        config.server_url = "http://ldap.example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.user_filter = "(uid=fixed)".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.group_filter = Some("(member={dn})".to_string());
        assert!(config.validate().is_err());
        config.group_base_dn = Some("ou=groups,dc=example,dc=com".to_string());
        assert!(config.validate().is_ok());

        let mut config = valid_config();
        config.server_url = "ldaps://ldap.example.com:636".to_string();
        config.start_tls = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_active_directory_defaults() {
        let config = LdapConfig::from_server_type(
            LdapServerType::ActiveDirectory,
            "ldaps://dc.example.com:636",
        );

        assert_eq!(config.user_filter, "(sAMAccountName={username})");
        assert!(config.group_filter.is_none());
        assert_eq!(config.attribute_mappings.username, "sAMAccountName");
        assert_eq!(config.attribute_mappings.display_name, "displayName");
    }

    #[test]
    fn test_server_type_presets_validate() {
        for server_type in [
            LdapServerType::ActiveDirectory,
            LdapServerType::OpenLdap,
            LdapServerType::Directory389,
        ] {
            let mut config = LdapConfig {
                bind_dn: "cn=admin,dc=example,dc=com".to_string(),
                user_base_dn: "ou=users,dc=example,dc=com".to_string(),
                ..LdapConfig::from_server_type(server_type, "ldap://dc.example.com:389")
            };
            assert!(config.validate().is_ok(), "{:?} preset", server_type);

            config.apply_group_filter_preset();
            assert!(config.group_filter.is_none());

            config.group_base_dn = Some("ou=groups,dc=example,dc=com".to_string());
            config.apply_group_filter_preset();
            assert_eq!(
                config.group_filter.as_deref(),
                Some(server_type.default_group_filter())
            );
            assert!(config.validate().is_ok(), "{:?} preset with groups", server_type);
        }
    }

    #[test]
    fn test_group_filter_preset_keeps_explicit_filter() {
        let mut config = LdapConfig::from_server_type(
            LdapServerType::ActiveDirectory,
            "ldap://dc.example.com:389",
        );
        config.group_base_dn = Some("ou=groups,dc=example,dc=com".to_string());
        config.group_filter = Some("(uniqueMember={dn})".to_string());
        config.apply_group_filter_preset();
        assert_eq!(config.group_filter.as_deref(), Some("(uniqueMember={dn})"));

        let mut generic = LdapConfig {
            group_base_dn: Some("ou=groups,dc=example,dc=com".to_string()),
            ..Default::default()
        };
        generic.apply_group_filter_preset();
        assert!(generic.group_filter.is_none());
    }

    #[test]
    fn test_first_rdn_value() {
        assert_eq!(first_rdn_value("cn=admins,ou=groups,dc=example,dc=com"), "admins");
        assert_eq!(first_rdn_value("cn=Smith\\, John,ou=people"), "Smith\\, John");
        assert_eq!(first_rdn_value("admins"), "admins");
    }
}
