//! Raw identities and canonical contributor keys.
//!
//! A raw [`Identity`] is whatever a single commit or trailer carries — name,
//! email, both, or neither. The [`IdentityResolver`] collapses raw identities
//! into canonical [`ContributorKey`]s: lowercased email when present, else
//! lowercased name, else a fresh anonymous key. Co-authors and reviewers run
//! through the same resolver as primary authors, so a person appearing in
//! both roles collapses into a single record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw (name, email) pair as it appears on a commit or trailer.
///
/// # Examples
///
/// ```
/// use collabscope_engine::identity::Identity;
///
/// let id = Identity::parse("Alice <a@x.com>");
/// assert_eq!(id.name.as_deref(), Some("Alice"));
/// assert_eq!(id.email.as_deref(), Some("a@x.com"));
///
/// // Malformed trailers without an email retain only the name.
/// let id = Identity::parse("Just A Name");
/// assert_eq!(id.name.as_deref(), Some("Just A Name"));
/// assert!(id.email.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Author or trailer name, if present.
    pub name: Option<String>,
    /// Email address, if present.
    pub email: Option<String>,
}

impl Identity {
    /// Build an identity from possibly-empty name and email strings.
    ///
    /// Whitespace-only values are treated as absent.
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: non_empty(name),
            email: non_empty(email),
        }
    }

    /// Parse a trailer value in `Name <email>` form.
    ///
    /// Values without a well-formed `<email>` part keep only the name.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let (Some(open), Some(close)) = (value.rfind('<'), value.rfind('>')) {
            if open < close {
                let name = &value[..open];
                let email = &value[open + 1..close];
                return Self {
                    name: non_empty(name),
                    email: non_empty(email),
                };
            }
        }
        Self {
            name: non_empty(value),
            email: None,
        }
    }

    /// Returns `true` if neither name nor email is known.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Canonical deduplication key for a contributor.
///
/// The key is the join invariant of the engine: every identity observed
/// during a run resolves to exactly one key, and all metrics accumulate
/// under it.
///
/// # Examples
///
/// ```
/// use collabscope_engine::identity::ContributorKey;
///
/// let key = ContributorKey::Email("a@x.com".into());
/// assert_eq!(key.to_string(), "email:a@x.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContributorKey {
    /// Lowercased, trimmed email address.
    Email(String),
    /// Lowercased, trimmed name (no email known).
    Name(String),
    /// Generated key for identities with neither name nor email.
    Anonymous(u32),
}

impl fmt::Display for ContributorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributorKey::Email(email) => write!(f, "email:{email}"),
            ContributorKey::Name(name) => write!(f, "name:{name}"),
            ContributorKey::Anonymous(n) => write!(f, "anon:{n}"),
        }
    }
}

/// Resolves raw identities into canonical keys, minting anonymous keys
/// as needed. One resolver per analysis run.
///
/// # Examples
///
/// ```
/// use collabscope_engine::identity::{ContributorKey, Identity, IdentityResolver};
///
/// let mut resolver = IdentityResolver::default();
/// let a = resolver.resolve(&Identity::new("Alice", "A@X.com"));
/// let b = resolver.resolve(&Identity::new("alice cooper", "a@x.com "));
/// assert_eq!(a, b);
/// assert_eq!(a, ContributorKey::Email("a@x.com".into()));
/// ```
#[derive(Debug, Default)]
pub struct IdentityResolver {
    next_anonymous: u32,
}

impl IdentityResolver {
    /// Resolve an identity to its canonical key.
    ///
    /// Email wins over name; identities with neither receive a fresh
    /// anonymous key on every call, so they never collapse together.
    pub fn resolve(&mut self, identity: &Identity) -> ContributorKey {
        if let Some(email) = &identity.email {
            return ContributorKey::Email(email.trim().to_lowercase());
        }
        if let Some(name) = &identity.name {
            return ContributorKey::Name(name.trim().to_lowercase());
        }
        let key = ContributorKey::Anonymous(self.next_anonymous);
        self.next_anonymous += 1;
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_and_email() {
        let id = Identity::parse("Alice Smith <alice@example.com>");
        assert_eq!(id.name.as_deref(), Some("Alice Smith"));
        assert_eq!(id.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn parse_name_only() {
        let id = Identity::parse("Alice Smith");
        assert_eq!(id.name.as_deref(), Some("Alice Smith"));
        assert!(id.email.is_none());
    }

    #[test]
    fn parse_empty_brackets_keeps_name() {
        let id = Identity::parse("Alice <>");
        assert_eq!(id.name.as_deref(), Some("Alice"));
        assert!(id.email.is_none());
    }

    #[test]
    fn parse_blank_is_anonymous() {
        let id = Identity::parse("   ");
        assert!(id.is_anonymous());
    }

    #[test]
    fn email_takes_precedence_over_name() {
        let mut resolver = IdentityResolver::default();
        let key = resolver.resolve(&Identity::new("Alice", "alice@example.com"));
        assert_eq!(key, ContributorKey::Email("alice@example.com".into()));
    }

    #[test]
    fn name_key_is_lowercased_and_trimmed() {
        let mut resolver = IdentityResolver::default();
        let key = resolver.resolve(&Identity::new("  Alice Smith ", ""));
        assert_eq!(key, ContributorKey::Name("alice smith".into()));
    }

    #[test]
    fn anonymous_identities_never_collapse() {
        let mut resolver = IdentityResolver::default();
        let a = resolver.resolve(&Identity::default());
        let b = resolver.resolve(&Identity::default());
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "anon:0");
        assert_eq!(b.to_string(), "anon:1");
    }

    #[test]
    fn same_email_different_names_collapse() {
        let mut resolver = IdentityResolver::default();
        let a = resolver.resolve(&Identity::new("Shared Account", "shared@example.com"));
        let b = resolver.resolve(&Identity::new("Shared Alias", "shared@example.com"));
        assert_eq!(a, b);
    }

    #[test]
    fn key_display_forms() {
        assert_eq!(
            ContributorKey::Email("a@x.com".into()).to_string(),
            "email:a@x.com"
        );
        assert_eq!(ContributorKey::Name("bob".into()).to_string(), "name:bob");
        assert_eq!(ContributorKey::Anonymous(7).to_string(), "anon:7");
    }
}
