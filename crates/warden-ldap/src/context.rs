//! Located directory entries

use std::collections::HashMap;
use std::sync::Arc;

use warden_core::Principals;

/// Name of the principal carrying the `LdapUserContext` an identity was
/// authenticated with
pub const USER_CONTEXT_PRINCIPAL: &str = "ldap-user-context";

/// A user entry located in the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapUserContext {
    dn: String,
    attributes: HashMap<String, Vec<String>>,
}

impl LdapUserContext {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, Vec<String>>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    /// Distinguished name of the entry
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// All values of an attribute. Attribute names compare case-insensitively.
    pub fn attribute_values(&self, name: &str) -> &[String] {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_values(name).first().map(|s| s.as_str())
    }

    /// Context attached to principals produced by `LdapRealm`
    pub fn from_principals(principals: &Principals) -> Option<Arc<LdapUserContext>> {
        principals.attached::<LdapUserContext>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Principal;

    #[test]
    fn test_attribute_lookup_ignores_case() {
        let context = LdapUserContext::new("uid=alice,ou=users,dc=example,dc=com")
            .with_attribute("displayName", vec!["Alice Liddell".to_string()])
            .with_attribute(
                "memberOf",
                vec![
                    "cn=admins,ou=groups,dc=example,dc=com".to_string(),
                    "cn=devs,ou=groups,dc=example,dc=com".to_string(),
                ],
            );

        assert_eq!(context.attribute("displayname"), Some("Alice Liddell"));
        assert_eq!(context.attribute_values("MEMBEROF").len(), 2);
        assert_eq!(context.attribute("mail"), None);
        assert!(context.attribute_values("mail").is_empty());
    }

    #[test]
    fn test_from_principals() {
        let context = LdapUserContext::new("uid=alice,dc=example,dc=com");
        let mut principals = Principals::new();
        principals.push(Principal::UniqueId(context.dn().to_string()));
        principals.push(Principal::attached(
            USER_CONTEXT_PRINCIPAL,
            Arc::new(context.clone()),
        ));

        let found = LdapUserContext::from_principals(&principals).unwrap();
        assert_eq!(*found, context);
        assert!(LdapUserContext::from_principals(&Principals::new()).is_none());
    }
}
