//! Principals attached to an authenticated identity

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Name of the principal holding the directory entry's unique identifier
pub const UNIQUE_ID_PRINCIPAL: &str = "unique-identifier";

/// Name of the principal holding the display name
pub const FULL_NAME_PRINCIPAL: &str = "full-name";

/// Name of the primary identity principal
pub const IDENTITY_PRINCIPAL: &str = "identity";

/// Type-erased value a realm attaches to an identity for its own later use
#[derive(Clone)]
pub struct AttachedPrincipal {
    name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl AttachedPrincipal {
    pub fn new<T: Any + Send + Sync>(name: impl Into<String>, value: Arc<T>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for AttachedPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedPrincipal")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A named attribute of an authenticated identity.
///
/// Well-known names have their own variants so lookups are typed;
/// [`Principal::named`] folds the reserved names into those variants.
#[derive(Debug, Clone)]
pub enum Principal {
    /// Primary name the identity authenticated with
    Identity(String),
    /// Stable unique identifier of the backing entry (a DN for directories)
    UniqueId(String),
    FullName(String),
    Named { name: String, value: String },
    Attached(AttachedPrincipal),
}

impl Principal {
    pub fn named(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == IDENTITY_PRINCIPAL {
            Principal::Identity(value)
        } else if name == UNIQUE_ID_PRINCIPAL {
            Principal::UniqueId(value)
        } else if name == FULL_NAME_PRINCIPAL {
            Principal::FullName(value)
        } else {
            Principal::Named { name, value }
        }
    }

    pub fn attached<T: Any + Send + Sync>(name: impl Into<String>, value: Arc<T>) -> Self {
        Principal::Attached(AttachedPrincipal::new(name, value))
    }

    pub fn name(&self) -> &str {
        match self {
            Principal::Identity(_) => IDENTITY_PRINCIPAL,
            Principal::UniqueId(_) => UNIQUE_ID_PRINCIPAL,
            Principal::FullName(_) => FULL_NAME_PRINCIPAL,
            Principal::Named { name, .. } => name,
            Principal::Attached(attached) => attached.name(),
        }
    }

    /// Textual value, `None` for attached principals
    pub fn value(&self) -> Option<&str> {
        match self {
            Principal::Identity(v)
            | Principal::UniqueId(v)
            | Principal::FullName(v)
            | Principal::Named { value: v, .. } => Some(v),
            Principal::Attached(_) => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => f.write_str(value),
            None => f.write_str(self.name()),
        }
    }
}

/// Insertion-ordered collection of principals
#[derive(Debug, Clone, Default)]
pub struct Principals(Vec<Principal>);

impl Principals {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a principal. A second unique identifier replaces the first in
    /// place, so an identity never carries two.
    pub fn push(&mut self, principal: Principal) {
        if let Principal::UniqueId(_) = principal {
            if let Some(slot) = self
                .0
                .iter_mut()
                .find(|p| matches!(p, Principal::UniqueId(_)))
            {
                *slot = principal;
                return;
            }
        }
        self.0.push(principal);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Principal> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.0.iter().find_map(|p| match p {
            Principal::UniqueId(v) => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn full_name(&self) -> Option<&str> {
        self.0.iter().find_map(|p| match p {
            Principal::FullName(v) => Some(v.as_str()),
            _ => None,
        })
    }

    /// First textual principal with the given name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|p| p.name() == name)
            .find_map(|p| p.value())
    }

    /// First attached principal whose value is a `T`
    pub fn attached<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.iter().find_map(|p| match p {
            Principal::Attached(attached) => attached.downcast::<T>(),
            _ => None,
        })
    }
}

impl FromIterator<Principal> for Principals {
    fn from_iter<I: IntoIterator<Item = Principal>>(iter: I) -> Self {
        let mut principals = Principals::new();
        for principal in iter {
            principals.push(principal);
        }
        principals
    }
}

impl<'a> IntoIterator for &'a Principals {
    type Item = &'a Principal;
    type IntoIter = std::slice::Iter<'a, Principal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Handle(u32);

    #[test]
    fn test_named_folds_reserved_names() {
        assert!(matches!(
            Principal::named("unique-identifier", "uid=a,dc=x"),
            Principal::UniqueId(_)
        ));
        assert!(matches!(
            Principal::named("full-name", "Alice"),
            Principal::FullName(_)
        ));
        assert!(matches!(
            Principal::named("email", "a@x"),
            Principal::Named { .. }
        ));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let principals: Principals = vec![
            Principal::named("email", "a@x"),
            Principal::FullName("Alice".into()),
            Principal::UniqueId("uid=alice".into()),
        ]
        .into_iter()
        .collect();

        let names: Vec<&str> = principals.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["email", "full-name", "unique-identifier"]);
    }

    #[test]
    fn test_unique_id_is_replaced_not_duplicated() {
        let mut principals = Principals::new();
        principals.push(Principal::UniqueId("uid=old".into()));
        principals.push(Principal::FullName("Alice".into()));
        principals.push(Principal::UniqueId("uid=new".into()));

        assert_eq!(principals.len(), 2);
        assert_eq!(principals.unique_id(), Some("uid=new"));
        assert_eq!(principals.iter().next().map(|p| p.name()), Some("unique-identifier"));
    }

    #[test]
    fn test_attached_downcast() {
        let mut principals = Principals::new();
        principals.push(Principal::attached("handle", Arc::new(Handle(7))));

        assert_eq!(principals.attached::<Handle>().as_deref(), Some(&Handle(7)));
        assert!(principals.attached::<String>().is_none());
        assert_eq!(principals.get("handle"), None);
    }

    #[test]
    fn test_display_uses_value() {
        assert_eq!(Principal::Identity("alice".into()).to_string(), "alice");
        assert_eq!(
            Principal::attached("handle", Arc::new(Handle(1))).to_string(),
            "handle"
        );
    }
}
