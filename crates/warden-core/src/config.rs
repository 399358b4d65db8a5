//! Configuration sections shared by every realm

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> crate::Result<()> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(crate::Error::InvalidConfig(format!(
                "Unknown log format: {} (expected pretty or json)",
                other
            ))),
        }
    }
}

/// Role mapping and permission tables for a realm
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Realm group to application roles
    #[serde(default)]
    pub group_roles: HashMap<String, Vec<String>>,

    /// Roles for authenticated users without group mapping
    #[serde(default)]
    pub default_roles: Vec<String>,

    /// Application role to permissions
    #[serde(default)]
    pub role_permissions: HashMap<String, Vec<String>>,
}

impl PolicyConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        toml::from_str(&content)
            .map_err(|e| crate::Error::InvalidConfig(format!("Failed to parse policies: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_logging_format_validation() {
        assert!(LoggingConfig::default().validate().is_ok());

        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "xml".to_string(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_roles = ["guest"]

[group_roles]
admins = ["admin"]

[role_permissions]
admin = ["*"]
"#
        )
        .unwrap();

        let config = PolicyConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.default_roles, vec!["guest".to_string()]);
        assert_eq!(config.group_roles["admins"], vec!["admin".to_string()]);
        assert_eq!(config.role_permissions["admin"], vec!["*".to_string()]);
    }

    #[test]
    fn test_policy_config_missing_file() {
        let err = PolicyConfig::from_file("/nonexistent/policies.toml").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
