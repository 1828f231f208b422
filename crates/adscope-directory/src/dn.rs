// ── Distinguished names ──
//
// `Dn` is the identity of every directory object. It is a normalized
// string newtype: components are trimmed, comparison and hashing are
// ASCII case-insensitive, and escaped commas never split a component.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// A hierarchical distinguished name such as `OU=Sales,DC=example,DC=com`.
///
/// The first component is the object's own RDN; the remainder is the
/// parent's DN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dn(String);

impl Dn {
    /// Parse and normalize a DN.
    pub fn parse(raw: &str) -> Result<Self, DirectoryError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DirectoryError::InvalidDn {
                value: raw.to_owned(),
                reason: "empty".into(),
            });
        }

        let components = split_components(trimmed);
        for component in &components {
            let valid = component
                .split_once('=')
                .is_some_and(|(attr, value)| !attr.trim().is_empty() && !value.trim().is_empty());
            if !valid {
                return Err(DirectoryError::InvalidDn {
                    value: raw.to_owned(),
                    reason: format!("component '{component}' is not of the form attr=value"),
                });
            }
        }

        Ok(Self(components.join(",")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All RDN components, leaf first.
    pub fn components(&self) -> Vec<&str> {
        split_components(&self.0)
    }

    /// The leaf component, e.g. `OU=Sales`.
    pub fn rdn(&self) -> &str {
        self.components().first().copied().unwrap_or(&self.0)
    }

    /// The naming attribute of the leaf component, e.g. `OU`.
    pub fn rdn_attribute(&self) -> &str {
        self.rdn().split_once('=').map_or("", |(attr, _)| attr.trim())
    }

    /// Unescaped value of the leaf component, e.g. `Sales`.
    pub fn name(&self) -> String {
        let value = self.rdn().split_once('=').map_or("", |(_, value)| value.trim());
        unescape_value(value)
    }

    pub fn parent(&self) -> Option<Dn> {
        let rdn_len = self.rdn().len();
        let rest = self.0.get(rdn_len + 1..)?;
        if rest.is_empty() {
            None
        } else {
            Some(Self(rest.to_owned()))
        }
    }

    pub fn is_child_of(&self, other: &Dn) -> bool {
        self.parent().is_some_and(|parent| parent == *other)
    }

    /// True when `self` lies strictly below `other`.
    pub fn is_descendant_of(&self, other: &Dn) -> bool {
        let me = self.0.to_ascii_lowercase();
        let suffix = format!(",{}", other.0.to_ascii_lowercase());
        me.len() > suffix.len() && me.ends_with(&suffix)
    }

    /// DN of a new child named `value` under this DN, escaping as needed.
    pub fn child(&self, attribute: &str, value: &str) -> Dn {
        Self(format!("{attribute}={},{}", escape_value(value), self.0))
    }

    /// DN this object would have after moving under `new_parent`.
    pub fn moved_under(&self, new_parent: &Dn) -> Dn {
        Self(format!("{},{}", self.rdn(), new_parent.0))
    }

    /// DN this object would have after a rename within the same parent.
    pub fn renamed(&self, new_name: &str) -> Dn {
        let leaf = format!("{}={}", self.rdn_attribute(), escape_value(new_name));
        match self.parent() {
            Some(parent) => Self(format!("{leaf},{}", parent.0)),
            None => Self(leaf),
        }
    }

    /// Rewrite the `old_base` suffix of this DN to `new_base`.
    ///
    /// Returns `None` when `self` is neither `old_base` nor below it.
    pub fn rebased(&self, old_base: &Dn, new_base: &Dn) -> Option<Dn> {
        if self == old_base {
            return Some(new_base.clone());
        }
        if !self.is_descendant_of(old_base) {
            return None;
        }
        let prefix_len = self.0.len() - old_base.0.len() - 1;
        let prefix = self.0.get(..prefix_len)?;
        Some(Self(format!("{prefix},{}", new_base.0)))
    }
}

// ── Equality / hashing: ASCII case-insensitive ───────────────────────

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Dn {}

impl Hash for Dn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for Dn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .bytes()
            .map(|b| b.to_ascii_lowercase())
            .cmp(other.0.bytes().map(|b| b.to_ascii_lowercase()))
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Dn {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Dn {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Dn> for String {
    fn from(dn: Dn) -> Self {
        dn.0
    }
}

// ── Component helpers ────────────────────────────────────────────────

/// Split on commas that are not escaped with a backslash.
fn split_components(raw: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            ',' => {
                out.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(raw[start..].trim());
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        let leading = i == 0 && (ch == '#' || ch == ' ');
        if leading || matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dn(s: &str) -> Dn {
        s.parse().unwrap()
    }

    #[test]
    fn parse_normalizes_whitespace() {
        let parsed = dn(" OU=Sales , DC=example,DC=com ");
        assert_eq!(parsed.as_str(), "OU=Sales,DC=example,DC=com");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Dn::parse("").is_err());
        assert!(Dn::parse("Sales,DC=com").is_err());
        assert!(Dn::parse("OU=,DC=com").is_err());
    }

    #[test]
    fn equality_ignores_case() {
        assert_eq!(dn("ou=sales,dc=example,dc=com"), dn("OU=Sales,DC=example,DC=com"));
    }

    #[test]
    fn name_and_parent() {
        let d = dn("CN=Smith\\, John,OU=Sales,DC=example,DC=com");
        assert_eq!(d.name(), "Smith, John");
        assert_eq!(d.rdn_attribute(), "CN");
        assert_eq!(d.parent().unwrap(), dn("OU=Sales,DC=example,DC=com"));
        assert!(dn("DC=com").parent().is_none());
    }

    #[test]
    fn child_and_descendant() {
        let head = dn("DC=example,DC=com");
        let ou = dn("OU=Sales,DC=example,DC=com");
        let user = dn("CN=Ann,OU=Sales,DC=example,DC=com");

        assert!(ou.is_child_of(&head));
        assert!(!user.is_child_of(&head));
        assert!(user.is_descendant_of(&head));
        assert!(!head.is_descendant_of(&head));
    }

    #[test]
    fn moved_and_renamed() {
        let user = dn("CN=Ann,OU=Sales,DC=example,DC=com");
        let target = dn("OU=Ops,DC=example,DC=com");

        assert_eq!(
            user.moved_under(&target),
            dn("CN=Ann,OU=Ops,DC=example,DC=com")
        );
        assert_eq!(
            user.renamed("Ann, B"),
            dn("CN=Ann\\, B,OU=Sales,DC=example,DC=com")
        );
    }

    #[test]
    fn rebased_rewrites_suffix() {
        let old = dn("OU=Sales,DC=example,DC=com");
        let new = dn("OU=Sales,OU=Ops,DC=example,DC=com");
        let user = dn("CN=Ann,OU=Sales,DC=example,DC=com");

        assert_eq!(
            user.rebased(&old, &new).unwrap(),
            dn("CN=Ann,OU=Sales,OU=Ops,DC=example,DC=com")
        );
        assert_eq!(old.rebased(&old, &new).unwrap(), new);
        assert!(dn("DC=other").rebased(&old, &new).is_none());
    }
}
