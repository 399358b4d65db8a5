//! LDAP/Active Directory realm for Warden
//!
//! Provides:
//! - `LdapRealm`, the realm verifying username/password tokens against a directory
//! - `LdapSupport`, the directory operations the realm depends on
//! - `LdapDirectory`, an `LdapSupport` backed by `ldap3`
//!
//! Directory failures never leave this crate as-is: the realm translates
//! them into `warden_core::AuthError`.

mod client;
mod config;
mod context;
mod error;
mod realm;
mod support;

pub use client::LdapDirectory;
pub use config::*;
pub use context::{LdapUserContext, USER_CONTEXT_PRINCIPAL};
pub use error::{DirectoryResult, LdapError, ResultCode};
pub use realm::LdapRealm;
pub use support::LdapSupport;
