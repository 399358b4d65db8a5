//! Warden - LDAP authentication realm
//!
//! Operator CLI: verifies credentials and resolves roles against the
//! configured directory, exactly as an engine embedding the realm would.

mod config;

use std::collections::BTreeSet;
use std::io::BufRead;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use warden_core::{AuthError, AuthenticationToken, PolicyRegistry, Principal, Principals, Realm};
use warden_ldap::{LdapDirectory, LdapRealm};

use crate::config::WardenConfig;

#[derive(Parser)]
#[command(name = "warden")]
#[command(author = "Warden Team")]
#[command(version = warden_core::VERSION)]
#[command(about = "LDAP authentication realm", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    config: Option<String>,

    /// LDAP server URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a user's password and print identity, groups and roles
    Authenticate {
        username: String,

        /// Password; read from stdin when omitted
        #[arg(long, env = "WARDEN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Resolve the groups and roles of a user without a password
    Roles {
        username: String,

        /// Known DN of the user, skips the user search
        #[arg(long)]
        dn: Option<String>,
    },

    /// Check connectivity to the directory server
    Status,

    /// Show version information
    Version,
}

/// Outcome printed by `authenticate` and `roles`
#[derive(Serialize)]
struct IdentityReport {
    realm: String,
    username: String,
    dn: Option<String>,
    full_name: Option<String>,
    groups: BTreeSet<String>,
    roles: BTreeSet<String>,
    permissions: BTreeSet<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("warden {}", warden_core::VERSION);
            Ok(())
        }
        Commands::Authenticate { username, password } => {
            let config = load_config(cli.config, cli.url, cli.log_level)?;
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            authenticate(&config, &username, password).await
        }
        Commands::Roles { username, dn } => {
            let config = load_config(cli.config, cli.url, cli.log_level)?;
            roles(&config, &username, dn).await
        }
        Commands::Status => {
            let config = load_config(cli.config, cli.url, cli.log_level)?;
            status(&config).await
        }
    }
}

/// Load config, then environment, then CLI args, and start logging
fn load_config(
    path: Option<String>,
    url: Option<String>,
    log_level: Option<String>,
) -> anyhow::Result<WardenConfig> {
    let mut config = match path {
        Some(path) => WardenConfig::from_file(&path)?,
        None => WardenConfig::default(),
    };
    config.apply_env();

    if let Some(url) = url {
        config.ldap.server_url = url;
    }
    if let Some(level) = log_level {
        config.logging.level = level;
    }

    config.validate()?;
    init_logging(&config);
    Ok(config)
}

fn init_logging(config: &WardenConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn read_password() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn build_realm(config: &WardenConfig) -> anyhow::Result<LdapRealm> {
    let mut registry = PolicyRegistry::new();
    registry.register_from_config(&config.realm.name, &config.policies);

    let directory = Arc::new(LdapDirectory::new(config.ldap.clone()));
    let realm = LdapRealm::from_registry(&config.realm.name, directory, &registry)?
        .with_display_name_attribute(&config.ldap.attribute_mappings.display_name);

    debug!("Realm {} ready for {}", realm.name(), config.ldap.server_url);
    Ok(realm)
}

async fn authenticate(
    config: &WardenConfig,
    username: &str,
    password: String,
) -> anyhow::Result<()> {
    let realm = build_realm(config)?;
    let token = AuthenticationToken::username_password(username, password);

    let info = realm
        .authentication_info(&token)
        .await
        .map_err(auth_failure)?;

    info!("Authenticated {} against realm {}", info.principal(), realm.name());

    let report = identity_report(&realm, info.identity_principal(), info.other_principals()).await?;
    print_json(&report)
}

async fn roles(config: &WardenConfig, username: &str, dn: Option<String>) -> anyhow::Result<()> {
    let realm = build_realm(config)?;

    let mut principals = Principals::new();
    if let Some(dn) = dn {
        principals.push(Principal::UniqueId(dn));
    }

    let report = identity_report(
        &realm,
        Principal::Identity(username.to_string()),
        &principals,
    )
    .await?;
    print_json(&report)
}

async fn identity_report(
    realm: &LdapRealm,
    identity: Principal,
    principals: &Principals,
) -> anyhow::Result<IdentityReport> {
    let groups = realm
        .realm_roles(&identity, principals)
        .await
        .map_err(auth_failure)?;

    let roles = realm.role_mapping().resolve_roles(&groups);
    let resolver = realm.role_permission_resolver();
    let permissions = roles
        .iter()
        .flat_map(|role| resolver.resolve_permissions_in_role(role))
        .collect();

    Ok(IdentityReport {
        realm: realm.name().to_string(),
        username: identity.to_string(),
        dn: principals.unique_id().map(str::to_string),
        full_name: principals.full_name().map(str::to_string),
        groups,
        roles,
        permissions,
    })
}

async fn status(config: &WardenConfig) -> anyhow::Result<()> {
    let directory = LdapDirectory::new(config.ldap.clone());
    let status = directory.status().await;
    let connected = status.connected;

    print_json(&status)?;

    if !connected {
        anyhow::bail!("LDAP server unreachable: {}", config.ldap.server_url);
    }
    Ok(())
}

fn auth_failure(err: AuthError) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", err.code(), err.message())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_needs_no_config() {
        let cli = Cli::try_parse_from(["warden", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
        assert!(cli.url.is_none());
    }

    #[test]
    fn test_parse_authenticate() {
        let cli = Cli::try_parse_from([
            "warden",
            "authenticate",
            "alice",
            "--password",
            "wonderland",
            "--url",
            "ldap://ldap.example.com:389",
        ])
        .unwrap();

        match cli.command {
            Commands::Authenticate { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password.as_deref(), Some("wonderland"));
            }
            _ => panic!("expected authenticate"),
        }
        assert_eq!(cli.url.as_deref(), Some("ldap://ldap.example.com:389"));
    }
}
