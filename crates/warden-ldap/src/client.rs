//! LDAP directory access over `ldap3`
//!
//! Each operation opens its own connection and unbinds when done.
//! Supports LDAP, LDAPS (SSL), and STARTTLS connections.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, warn};

use crate::config::{first_rdn_value, LdapConfig, LdapServerInfo, LdapStatus};
use crate::context::LdapUserContext;
use crate::error::{DirectoryResult, LdapError, ResultCode};
use crate::support::LdapSupport;

/// `LdapSupport` implementation talking to a live directory server
pub struct LdapDirectory {
    config: LdapConfig,
}

impl LdapDirectory {
    pub fn new(config: LdapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Test the connection and read the root DSE
    pub async fn status(&self) -> LdapStatus {
        let (server_info, error) = match self.root_dse().await {
            Ok(info) => (Some(info), None),
            Err(e) => (None, Some(e.to_string())),
        };
        let connected = server_info.is_some();

        LdapStatus {
            connected,
            server_url: self.config.server_url.clone(),
            server_type: self.config.server_type,
            last_connection: if connected {
                Some(chrono::Utc::now().to_rfc3339())
            } else {
                None
            },
            error,
            server_info,
        }
    }

    // =========================================================================
    // Private methods
    // =========================================================================

    /// Create LDAP connection with proper TLS settings
    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.timeout_seconds))
            .set_starttls(self.config.start_tls)
            .set_no_tls_verify(self.config.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", self.config.server_url);

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.server_url)
            .await
            .map_err(|e| {
                LdapError::connection(format!("Failed to connect to LDAP server: {}", e))
            })?;

        ldap3::drive!(conn);
        Ok(ldap)
    }

    /// Connection bound with the service account
    async fn service_connection(&self) -> DirectoryResult<Ldap> {
        let mut ldap = self.create_connection().await?;

        let bind = ldap
            .simple_bind(&self.config.bind_dn, &self.config.bind_password)
            .await
            .and_then(|result| result.success());

        if let Err(e) = bind {
            let _ = ldap.unbind().await;
            let err = LdapError::from(e);
            warn!("Service account bind failed: {}", err);
            return Err(err);
        }

        Ok(ldap)
    }

    /// Search and return at most one entry; more than one is an error
    async fn search_single(
        &self,
        base: &str,
        scope: Scope,
        filter: &str,
    ) -> DirectoryResult<Option<SearchEntry>> {
        let mut ldap = self.service_connection().await?;

        let attrs = vec!["*", self.config.attribute_mappings.member_of.as_str()];
        let result = ldap
            .search(base, scope, filter, attrs)
            .await
            .and_then(|rs| rs.success());

        let _ = ldap.unbind().await;
        let (mut rs, _res) = result?;

        if rs.len() > 1 {
            return Err(LdapError::new(
                ResultCode::SIZE_LIMIT_EXCEEDED,
                format!("Filter {} matched {} entries", filter, rs.len()),
            ));
        }

        Ok(rs.pop().map(SearchEntry::construct))
    }

    async fn search_groups(
        &self,
        group_base: &str,
        filter: &str,
    ) -> DirectoryResult<BTreeSet<String>> {
        let mut ldap = self.service_connection().await?;

        debug!("Searching groups with filter: {}", filter);

        let group_name = self.config.attribute_mappings.group_name.as_str();
        let result = ldap
            .search(group_base, Scope::Subtree, filter, vec![group_name])
            .await
            .and_then(|rs| rs.success());

        let _ = ldap.unbind().await;
        let (rs, _res) = result?;

        let mut groups = BTreeSet::new();
        for result in rs {
            let entry = SearchEntry::construct(result);
            if let Some(name) = get_first_attr(&entry, group_name) {
                groups.insert(name);
            }
        }

        Ok(groups)
    }

    async fn root_dse(&self) -> DirectoryResult<LdapServerInfo> {
        let mut ldap = self.service_connection().await?;

        let result = ldap
            .search(
                "",
                Scope::Base,
                "(objectClass=*)",
                vec![
                    "vendorName",
                    "vendorVersion",
                    "namingContexts",
                    "supportedLDAPVersion",
                ],
            )
            .await
            .and_then(|rs| rs.success());

        let _ = ldap.unbind().await;
        let (rs, _res) = result?;

        let info = match rs.into_iter().next() {
            Some(result) => {
                let entry = SearchEntry::construct(result);
                LdapServerInfo {
                    vendor: get_first_attr(&entry, "vendorName"),
                    version: get_first_attr(&entry, "vendorVersion"),
                    naming_contexts: entry
                        .attrs
                        .get("namingContexts")
                        .cloned()
                        .unwrap_or_default(),
                    supported_ldap_version: entry
                        .attrs
                        .get("supportedLDAPVersion")
                        .cloned()
                        .unwrap_or_default(),
                }
            }
            None => LdapServerInfo {
                vendor: None,
                version: None,
                naming_contexts: vec![],
                supported_ldap_version: vec!["3".to_string()],
            },
        };

        info!("LDAP server reachable: {}", self.config.server_url);
        Ok(info)
    }
}

#[async_trait]
impl LdapSupport for LdapDirectory {
    async fn find_user(&self, username: &str) -> DirectoryResult<LdapUserContext> {
        let filter = self.config.build_user_filter(username);

        debug!("Searching for user with filter: {}", filter);

        match self
            .search_single(&self.config.user_base_dn, Scope::Subtree, &filter)
            .await?
        {
            Some(entry) => Ok(context_from_entry(entry)),
            None => Err(LdapError::user_not_found(username)),
        }
    }

    async fn create_user_context(&self, dn: &str) -> DirectoryResult<LdapUserContext> {
        match self
            .search_single(dn, Scope::Base, "(objectClass=*)")
            .await?
        {
            Some(entry) => Ok(context_from_entry(entry)),
            None => Err(LdapError::new(
                ResultCode::NO_SUCH_OBJECT,
                format!("Entry not found: {}", dn),
            )),
        }
    }

    async fn authenticate(
        &self,
        context: &LdapUserContext,
        password: &str,
    ) -> DirectoryResult<()> {
        // An empty password is an unauthenticated bind, which servers accept
        if password.is_empty() {
            return Err(LdapError::new(
                ResultCode::INVALID_CREDENTIALS,
                "Empty password rejected",
            ));
        }

        // Verify user password by binding as the user
        let mut ldap = self.create_connection().await?;

        let result = ldap
            .simple_bind(context.dn(), password)
            .await
            .and_then(|result| result.success());

        let _ = ldap.unbind().await;
        result?;
        Ok(())
    }

    async fn attribute_value(
        &self,
        context: &LdapUserContext,
        name: &str,
    ) -> DirectoryResult<Option<String>> {
        Ok(context.attribute(name).map(str::to_string))
    }

    async fn retrieve_user_groups(
        &self,
        context: &LdapUserContext,
    ) -> DirectoryResult<BTreeSet<String>> {
        let mappings = &self.config.attribute_mappings;
        let username = context.attribute(&mappings.username).unwrap_or_default();

        match (
            self.config.group_base_dn.as_deref(),
            self.config.build_group_filter(context.dn(), username),
        ) {
            (Some(group_base), Some(filter)) => self.search_groups(group_base, &filter).await,
            _ => Ok(context
                .attribute_values(&mappings.member_of)
                .iter()
                .map(|dn| first_rdn_value(dn).to_string())
                .filter(|name| !name.is_empty())
                .collect()),
        }
    }
}

/// Helper to get first attribute value from LDAP entry
fn get_first_attr(entry: &SearchEntry, attr: &str) -> Option<String> {
    entry.attrs.get(attr).and_then(|v| v.first().cloned())
}

fn context_from_entry(entry: SearchEntry) -> LdapUserContext {
    let attributes: HashMap<String, Vec<String>> = entry.attrs.into_iter().collect();
    LdapUserContext::new(entry.dn).with_attributes(attributes)
}
