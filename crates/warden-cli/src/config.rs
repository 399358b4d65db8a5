//! Configuration management for the Warden CLI
//!
//! Example config:
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [realm]
//! name = "corp"
//!
//! [ldap]
//! server_url = "ldaps://dc.example.com:636"
//! bind_dn = "cn=svc-warden,ou=services,dc=example,dc=com"
//! bind_password = "change-me"
//! user_base_dn = "ou=users,dc=example,dc=com"
//! server_type = "active_directory"
//!
//! [policies]
//! default_roles = ["guest"]
//!
//! [policies.group_roles]
//! admins = ["admin"]
//!
//! [policies.role_permissions]
//! admin = ["*"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use warden_core::{LoggingConfig, PolicyConfig};
use warden_ldap::{LdapConfig, LdapRealm, LdapServerType};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub realm: RealmConfig,

    #[serde(default)]
    pub ldap: LdapConfig,

    #[serde(default)]
    pub policies: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Realm name; policies are registered under it
    #[serde(default = "default_realm_name")]
    pub name: String,
}

fn default_realm_name() -> String {
    LdapRealm::DEFAULT_NAME.to_string()
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            name: default_realm_name(),
        }
    }
}

impl WardenConfig {
    /// Load a TOML file. A `server_type` in `[ldap]` selects the preset the
    /// file's explicit keys are laid over.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let mut table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        if let Some(toml::Value::Table(ldap)) = table.remove("ldap") {
            table.insert("ldap".to_string(), toml::Value::Table(ldap_with_preset(ldap)?));
        }

        let mut config: Self = toml::Value::Table(table)
            .try_into()
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        config.ldap.apply_group_filter_preset();

        Ok(config)
    }

    /// Apply `WARDEN_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("WARDEN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WARDEN_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(name) = lookup("WARDEN_REALM_NAME") {
            self.realm.name = name;
        }
        if let Some(url) = lookup("WARDEN_LDAP_URL") {
            self.ldap.server_url = url;
        }
        if let Some(dn) = lookup("WARDEN_LDAP_BIND_DN") {
            self.ldap.bind_dn = dn;
        }
        if let Some(password) = lookup("WARDEN_LDAP_BIND_PASSWORD") {
            self.ldap.bind_password = password;
        }
        if let Some(base) = lookup("WARDEN_LDAP_USER_BASE_DN") {
            self.ldap.user_base_dn = base;
        }
        if let Some(base) = lookup("WARDEN_LDAP_GROUP_BASE_DN") {
            self.ldap.group_base_dn = Some(base);
        }
        if let Some(timeout) = lookup("WARDEN_LDAP_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.ldap.timeout_seconds = t;
            }
        }
        if let Some(start_tls) = lookup("WARDEN_LDAP_START_TLS") {
            if let Ok(enabled) = start_tls.parse() {
                self.ldap.start_tls = enabled;
            }
        }

        self.ldap.apply_group_filter_preset();
    }

    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;
        self.ldap
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid LDAP configuration: {}", e))?;

        if self.realm.name.is_empty() {
            anyhow::bail!("Realm name must not be empty");
        }

        Ok(())
    }
}

/// Server type preset for `[ldap]`, overlaid with the keys the file sets
fn ldap_with_preset(explicit: toml::Table) -> Result<toml::Table> {
    let server_type: LdapServerType = match explicit.get("server_type") {
        Some(value) => value
            .clone()
            .try_into()
            .context("Invalid ldap.server_type")?,
        None => return Ok(explicit),
    };

    let preset = LdapConfig::from_server_type(server_type, &LdapConfig::default().server_url);
    let mut base = match toml::Value::try_from(preset).context("Failed to build LDAP preset")? {
        toml::Value::Table(base) => base,
        _ => anyhow::bail!("LDAP preset is not a table"),
    };
    overlay(&mut base, explicit);
    Ok(base)
}

fn overlay(base: &mut toml::Table, explicit: toml::Table) {
    for (key, value) in explicit {
        if let (Some(toml::Value::Table(current)), toml::Value::Table(nested)) =
            (base.get_mut(&key), &value)
        {
            overlay(current, nested.clone());
            continue;
        }
        base.insert(key, value);
    }
}
