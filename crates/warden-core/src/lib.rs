//! Warden Core Library
//!
//! Realm-facing types shared by every identity source: credential tokens,
//! principals, the authentication error taxonomy, the `Realm` trait and the
//! role mapping / permission policies an engine injects into a realm.

pub mod config;
pub mod error;
pub mod policy;
pub mod realm;
pub mod types;

pub use config::{LoggingConfig, PolicyConfig};
pub use error::{AuthError, AuthResult, Error, Result};
pub use policy::{
    ConfigRoleMapping, ConfigRolePermissionResolver, PolicyRegistry, RealmPolicies,
    RoleMapping, RolePermissionResolver,
};
pub use realm::Realm;
pub use types::*;

/// Warden version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
