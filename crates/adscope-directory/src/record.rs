// ── Object records ──
//
// One directory object's queried attributes, plus the decoded flags the
// console cares about (system flags, account control, group type).
// Records are transient values: produced by a search, consumed while
// populating tree nodes and result rows, then dropped.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::dn::Dn;
use crate::filter::ATTRIBUTE_OBJECT_CLASS;

pub const ATTRIBUTE_NAME: &str = "name";
pub const ATTRIBUTE_DN: &str = "distinguishedName";
pub const ATTRIBUTE_DESCRIPTION: &str = "description";
pub const ATTRIBUTE_SYSTEM_FLAGS: &str = "systemFlags";
pub const ATTRIBUTE_USER_ACCOUNT_CONTROL: &str = "userAccountControl";
pub const ATTRIBUTE_GROUP_TYPE: &str = "groupType";
pub const ATTRIBUTE_MEMBER: &str = "member";
pub const ATTRIBUTE_SHOW_IN_ADVANCED_VIEW_ONLY: &str = "showInAdvancedViewOnly";

pub const CLASS_USER: &str = "user";
pub const CLASS_GROUP: &str = "group";
pub const CLASS_OU: &str = "organizationalUnit";
pub const CLASS_CONTAINER: &str = "container";
pub const CLASS_COMPUTER: &str = "computer";
pub const CLASS_DOMAIN: &str = "domainDNS";

const UAC_ACCOUNT_DISABLE: i64 = 0x0002;

const GROUP_TYPE_GLOBAL: i64 = 0x0000_0002;
const GROUP_TYPE_DOMAIN_LOCAL: i64 = 0x0000_0004;
const GROUP_TYPE_UNIVERSAL: i64 = 0x0000_0008;
const GROUP_TYPE_SECURITY: i64 = 0x8000_0000;

// ── Decoded flags ────────────────────────────────────────────────────

/// Policy bits of the `systemFlags` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SystemFlag {
    CannotMove,
    CannotRename,
    CannotDelete,
}

impl SystemFlag {
    fn bit(self) -> i64 {
        match self {
            Self::CannotMove => 0x0400_0000,
            Self::CannotRename => 0x0800_0000,
            Self::CannotDelete => 0x8000_0000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum GroupScope {
    Global,
    #[strum(to_string = "Domain Local")]
    DomainLocal,
    Universal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum GroupType {
    Security,
    Distribution,
}

// ── ObjectRecord ─────────────────────────────────────────────────────

/// A directory object as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    dn: Dn,
    #[serde(default)]
    attributes: IndexMap<String, Vec<String>>,
}

impl ObjectRecord {
    pub fn new(dn: Dn) -> Self {
        Self {
            dn,
            attributes: IndexMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_values<I, S>(mut self, attribute: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_values(attribute, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn dn(&self) -> &Dn {
        &self.dn
    }

    pub(crate) fn set_dn(&mut self, dn: Dn) {
        self.dn = dn;
    }

    pub fn attributes(&self) -> &IndexMap<String, Vec<String>> {
        &self.attributes
    }

    /// Replace all values of an attribute; an empty list removes it.
    pub fn set_values(&mut self, attribute: &str, values: Vec<String>) {
        let existing = self.key_of(attribute).map(ToOwned::to_owned);
        match (existing, values.is_empty()) {
            (Some(key), true) => {
                self.attributes.shift_remove(&key);
            }
            (Some(key), false) => {
                self.attributes.insert(key, values);
            }
            (None, true) => {}
            (None, false) => {
                self.attributes.insert(attribute.to_owned(), values);
            }
        }
    }

    pub fn contains(&self, attribute: &str) -> bool {
        !self.values(attribute).is_empty()
    }

    /// All values of an attribute (empty when absent). Attribute names
    /// are matched case-insensitively.
    pub fn values(&self, attribute: &str) -> &[String] {
        self.key_of(attribute)
            .and_then(|key| self.attributes.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get_string(&self, attribute: &str) -> Option<&str> {
        self.values(attribute).first().map(String::as_str)
    }

    pub fn get_int(&self, attribute: &str) -> Option<i64> {
        self.get_string(attribute)?.trim().parse().ok()
    }

    pub fn get_bool(&self, attribute: &str) -> bool {
        self.get_string(attribute)
            .is_some_and(|v| v.eq_ignore_ascii_case("TRUE"))
    }

    // ── Derived views ────────────────────────────────────────────────

    pub fn object_classes(&self) -> &[String] {
        self.values(ATTRIBUTE_OBJECT_CLASS)
    }

    /// The most specific class, which directory servers list last.
    pub fn main_class(&self) -> Option<&str> {
        self.object_classes().last().map(String::as_str)
    }

    pub fn is_class(&self, class: &str) -> bool {
        self.object_classes()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(class))
    }

    pub fn system_flag(&self, flag: SystemFlag) -> bool {
        self.get_int(ATTRIBUTE_SYSTEM_FLAGS)
            .is_some_and(|flags| flags & flag.bit() != 0)
    }

    /// Only meaningful for principals (user and computer objects).
    pub fn account_disabled(&self) -> bool {
        self.is_class(CLASS_USER)
            && self
                .get_int(ATTRIBUTE_USER_ACCOUNT_CONTROL)
                .is_some_and(|uac| uac & UAC_ACCOUNT_DISABLE != 0)
    }

    pub fn group_scope(&self) -> Option<GroupScope> {
        let bits = self.get_int(ATTRIBUTE_GROUP_TYPE)?;
        if bits & GROUP_TYPE_GLOBAL != 0 {
            Some(GroupScope::Global)
        } else if bits & GROUP_TYPE_DOMAIN_LOCAL != 0 {
            Some(GroupScope::DomainLocal)
        } else if bits & GROUP_TYPE_UNIVERSAL != 0 {
            Some(GroupScope::Universal)
        } else {
            None
        }
    }

    pub fn group_type(&self) -> Option<GroupType> {
        let bits = self.get_int(ATTRIBUTE_GROUP_TYPE)?;
        if bits & GROUP_TYPE_SECURITY == 0 {
            Some(GroupType::Distribution)
        } else {
            Some(GroupType::Security)
        }
    }

    /// Copy restricted to the requested attributes. An empty request
    /// keeps everything. `objectClass` is always kept.
    pub fn project(&self, attributes: &[String]) -> Self {
        if attributes.is_empty() {
            return self.clone();
        }
        let kept = self
            .attributes
            .iter()
            .filter(|(key, _)| {
                key.eq_ignore_ascii_case(ATTRIBUTE_OBJECT_CLASS)
                    || attributes.iter().any(|a| a.eq_ignore_ascii_case(key))
            })
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect();
        Self {
            dn: self.dn.clone(),
            attributes: kept,
        }
    }

    fn key_of(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .keys()
            .find(|key| key.eq_ignore_ascii_case(attribute))
            .map(String::as_str)
    }
}
