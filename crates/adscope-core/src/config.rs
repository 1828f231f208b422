// ── Console configuration ──
//
// These types describe *what* the console shows and how it treats
// directory classes. They never touch disk: the config crate or a test
// builds them and hands them to `Console::new`.

use adscope_directory::{Dn, ObjectRecord, record};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::display::AttributeFormatter;

/// User-facing view toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Show objects flagged `showInAdvancedViewOnly`.
    pub advanced_view: bool,
    /// Put leaf objects in the scope tree as well as the results pane.
    pub show_non_containers: bool,
    /// Surface schema and configuration objects.
    pub dev_mode: bool,
}

/// One results column: the attribute it shows and its header label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub attribute: String,
    pub display_name: String,
}

impl ColumnSpec {
    pub fn new(attribute: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            display_name: display_name.into(),
        }
    }
}

/// Naming contexts the console treats specially.
///
/// Only the domain head is required; the configuration and schema
/// roots default to their standard locations below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellKnownRoots {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_head: Option<Dn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Dn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Dn>,
}

impl WellKnownRoots {
    pub fn for_domain(domain_head: Dn) -> Self {
        Self {
            domain_head: Some(domain_head),
            configuration: None,
            schema: None,
        }
    }

    pub fn configuration_dn(&self) -> Option<Dn> {
        self.configuration.clone().or_else(|| {
            let head = self.domain_head.as_ref()?;
            Dn::parse(&format!("CN=Configuration,{head}")).ok()
        })
    }

    pub fn schema_dn(&self) -> Option<Dn> {
        self.schema.clone().or_else(|| {
            let configuration = self.configuration_dn()?;
            Dn::parse(&format!("CN=Schema,{configuration}")).ok()
        })
    }
}

/// Schema-derived metadata: columns, formatters, container classes, and
/// the possible-superiors table that drives drop classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub columns: Vec<ColumnSpec>,
    /// Per-attribute display formatter. Attributes not listed use `Text`.
    pub formatters: IndexMap<String, AttributeFormatter>,
    /// Human names for object classes, e.g. `organizationalUnit` → `Organizational Unit`.
    pub class_names: IndexMap<String, String>,
    /// Classes that may have children and always appear in the scope tree.
    pub container_classes: Vec<String>,
    /// For each class, the classes allowed to be its parent.
    pub possible_superiors: IndexMap<String, Vec<String>>,
    pub roots: WellKnownRoots,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self::active_directory()
    }
}

const DEFAULT_VISIBLE_COLUMNS: [usize; 3] = [0, 1, 2];

impl SchemaConfig {
    /// Defaults matching a stock Active Directory schema.
    pub fn active_directory() -> Self {
        let columns = vec![
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("objectClass", "Type"),
            ColumnSpec::new("description", "Description"),
            ColumnSpec::new("distinguishedName", "Distinguished name"),
            ColumnSpec::new("sAMAccountName", "Logon name"),
            ColumnSpec::new("whenChanged", "Modified"),
        ];

        let formatters = [
            ("objectClass", AttributeFormatter::ObjectClass),
            ("whenChanged", AttributeFormatter::GeneralizedTime),
            ("whenCreated", AttributeFormatter::GeneralizedTime),
            ("lastLogon", AttributeFormatter::FileTime),
            ("pwdLastSet", AttributeFormatter::FileTime),
            ("accountExpires", AttributeFormatter::FileTime),
            ("showInAdvancedViewOnly", AttributeFormatter::Boolean),
        ]
        .into_iter()
        .map(|(attribute, formatter)| (attribute.to_owned(), formatter))
        .collect();

        let class_names = [
            ("user", "User"),
            ("group", "Group"),
            ("computer", "Computer"),
            ("organizationalUnit", "Organizational Unit"),
            ("container", "Container"),
            ("domainDNS", "Domain"),
            ("builtinDomain", "Builtin Domain"),
            ("contact", "Contact"),
            ("configuration", "Configuration"),
            ("dMD", "Schema"),
            ("classSchema", "Class Schema"),
            ("attributeSchema", "Attribute Schema"),
        ]
        .into_iter()
        .map(|(class, name)| (class.to_owned(), name.to_owned()))
        .collect();

        let container_classes = [
            "domainDNS",
            "organizationalUnit",
            "container",
            "builtinDomain",
            "lostAndFound",
            "configuration",
            "dMD",
            "sitesContainer",
        ]
        .map(str::to_owned)
        .to_vec();

        let principal_parents: &[&str] =
            &["organizationalUnit", "container", "domainDNS", "builtinDomain"];
        let superiors: [(&str, &[&str]); 6] = [
            ("user", principal_parents),
            ("group", principal_parents),
            ("computer", principal_parents),
            ("contact", principal_parents),
            (
                "organizationalUnit",
                &["organizationalUnit", "domainDNS", "country", "locality", "organization"],
            ),
            (
                "container",
                &["container", "organizationalUnit", "domainDNS", "configuration", "builtinDomain"],
            ),
        ];
        let possible_superiors = superiors
            .into_iter()
            .map(|(class, parents)| {
                (
                    class.to_owned(),
                    parents.iter().map(|p| (*p).to_owned()).collect(),
                )
            })
            .collect();

        Self {
            columns,
            formatters,
            class_names,
            container_classes,
            possible_superiors,
            roots: WellKnownRoots::default(),
        }
    }

    // ── Produced display model ───────────────────────────────────────

    /// Header labels of the object results view, in column order.
    pub fn header_labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.display_name.clone()).collect()
    }

    /// Columns visible by default: name, class, and description.
    pub fn default_columns(&self) -> Vec<usize> {
        DEFAULT_VISIBLE_COLUMNS
            .into_iter()
            .filter(|i| *i < self.columns.len())
            .collect()
    }

    /// Attributes requested by every object fetch.
    pub fn search_attributes(&self) -> Vec<String> {
        let extra = [
            record::ATTRIBUTE_GROUP_TYPE,
            record::ATTRIBUTE_SYSTEM_FLAGS,
            adscope_directory::ATTRIBUTE_OBJECT_CLASS,
            record::ATTRIBUTE_USER_ACCOUNT_CONTROL,
        ];

        let mut out: Vec<String> = Vec::new();
        let candidates = self
            .columns
            .iter()
            .map(|c| c.attribute.as_str())
            .chain(extra);
        for attribute in candidates {
            if !out.iter().any(|a| a.eq_ignore_ascii_case(attribute)) {
                out.push(attribute.to_owned());
            }
        }
        out
    }

    // ── Class queries ────────────────────────────────────────────────

    pub fn formatter_for(&self, attribute: &str) -> AttributeFormatter {
        self.formatters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(attribute))
            .map(|(_, formatter)| *formatter)
            .unwrap_or_default()
    }

    pub fn class_display_name<'a>(&'a self, class: &'a str) -> &'a str {
        self.class_names
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(class))
            .map_or(class, |(_, name)| name.as_str())
    }

    pub fn is_container_class(&self, class: &str) -> bool {
        self.container_classes
            .iter()
            .any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Whether a record's main class can have children.
    pub fn is_container(&self, record: &ObjectRecord) -> bool {
        record
            .main_class()
            .is_some_and(|class| self.is_container_class(class))
    }

    /// Union of the possible superiors of every class in `classes`.
    pub fn possible_superiors(&self, classes: &[String]) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for class in classes {
            let parents = self
                .possible_superiors
                .iter()
                .filter(|(key, _)| key.eq_ignore_ascii_case(class))
                .flat_map(|(_, parents)| parents.iter().map(String::as_str));
            for parent in parents {
                if !out.iter().any(|p| p.eq_ignore_ascii_case(parent)) {
                    out.push(parent);
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn header_labels_follow_columns() {
        let schema = SchemaConfig::default();
        assert_eq!(
            schema.header_labels()[..3],
            ["Name", "Type", "Description"]
        );
        assert_eq!(schema.default_columns(), vec![0, 1, 2]);
    }

    #[test]
    fn default_columns_clip_to_column_count() {
        let schema = SchemaConfig {
            columns: vec![ColumnSpec::new("name", "Name")],
            ..SchemaConfig::default()
        };
        assert_eq!(schema.default_columns(), vec![0]);
    }

    #[test]
    fn search_attributes_add_flags_without_duplicates() {
        let schema = SchemaConfig {
            columns: vec![
                ColumnSpec::new("name", "Name"),
                ColumnSpec::new("objectClass", "Type"),
            ],
            ..SchemaConfig::default()
        };
        assert_eq!(
            schema.search_attributes(),
            vec![
                "name",
                "objectClass",
                "groupType",
                "systemFlags",
                "userAccountControl"
            ]
        );
    }

    #[test]
    fn well_known_roots_derive_from_domain_head() {
        let roots = WellKnownRoots::for_domain("DC=example,DC=com".parse().unwrap());
        assert_eq!(
            roots.schema_dn().unwrap().as_str(),
            "CN=Schema,CN=Configuration,DC=example,DC=com"
        );
    }

    #[test]
    fn possible_superiors_union_classes() {
        let schema = SchemaConfig::default();
        let classes = vec!["top".to_owned(), "organizationalUnit".to_owned()];
        let superiors = schema.possible_superiors(&classes);
        assert!(superiors.contains(&"organizationalUnit"));
        assert!(superiors.contains(&"domainDNS"));
        assert!(!superiors.contains(&"user"));
    }
}
