// ── Attribute display formatting ──
//
// Raw directory values are turned into cell text by a formatter chosen
// per attribute in `SchemaConfig`. Groups get a composed type/scope
// string in the class column instead of a plain class name.

use adscope_directory::record::CLASS_GROUP;
use adscope_directory::{ATTRIBUTE_OBJECT_CLASS, ObjectRecord};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::SchemaConfig;

/// Windows FILETIME epoch (1601-01-01) expressed in Unix seconds.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;
const FILETIME_TICKS_PER_SEC: i64 = 10_000_000;
const FILETIME_NEVER: i64 = i64::MAX;

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How an attribute's raw values are rendered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributeFormatter {
    /// Values verbatim, multiple values joined with `; `.
    #[default]
    Text,
    /// `TRUE` / `FALSE` as `True` / `False`.
    Boolean,
    /// 100-nanosecond ticks since 1601 (`lastLogon`, `pwdLastSet`).
    FileTime,
    /// LDAP generalized time (`whenChanged`).
    GeneralizedTime,
    /// Class display name, or `"{type} - {scope}"` for groups.
    ObjectClass,
}

impl AttributeFormatter {
    pub fn format(self, record: &ObjectRecord, attribute: &str, schema: &SchemaConfig) -> String {
        match self {
            Self::ObjectClass => object_class_text(record, schema),
            Self::Text => record.values(attribute).join("; "),
            Self::Boolean => record
                .get_string(attribute)
                .map(boolean_text)
                .unwrap_or_default(),
            Self::FileTime => record
                .get_string(attribute)
                .map(filetime_text)
                .unwrap_or_default(),
            Self::GeneralizedTime => record
                .get_string(attribute)
                .map(generalized_time_text)
                .unwrap_or_default(),
        }
    }
}

/// One cell per configured column. Missing attributes give empty cells.
pub fn object_cells(record: &ObjectRecord, schema: &SchemaConfig) -> Vec<String> {
    schema
        .columns
        .iter()
        .map(|column| {
            let attribute = column.attribute.as_str();
            if !record.contains(attribute) {
                return String::new();
            }
            // The class column always composes, whatever its formatter.
            let formatter = if attribute.eq_ignore_ascii_case(ATTRIBUTE_OBJECT_CLASS) {
                AttributeFormatter::ObjectClass
            } else {
                schema.formatter_for(attribute)
            };
            formatter.format(record, attribute, schema)
        })
        .collect()
}

fn object_class_text(record: &ObjectRecord, schema: &SchemaConfig) -> String {
    let Some(class) = record.main_class() else {
        return String::new();
    };
    if class.eq_ignore_ascii_case(CLASS_GROUP) {
        if let (Some(kind), Some(scope)) = (record.group_type(), record.group_scope()) {
            return format!("{kind} - {scope}");
        }
    }
    schema.class_display_name(class).to_owned()
}

fn boolean_text(raw: &str) -> String {
    if raw.eq_ignore_ascii_case("TRUE") {
        "True".into()
    } else if raw.eq_ignore_ascii_case("FALSE") {
        "False".into()
    } else {
        raw.to_owned()
    }
}

fn filetime_text(raw: &str) -> String {
    let Ok(ticks) = raw.trim().parse::<i64>() else {
        return raw.to_owned();
    };
    if ticks == 0 || ticks == FILETIME_NEVER {
        return "(never)".into();
    }
    let secs = ticks / FILETIME_TICKS_PER_SEC - FILETIME_UNIX_OFFSET_SECS;
    DateTime::from_timestamp(secs, 0).map_or_else(
        || raw.to_owned(),
        |time| time.format(DISPLAY_TIME_FORMAT).to_string(),
    )
}

fn generalized_time_text(raw: &str) -> String {
    raw.get(..14)
        .and_then(|digits| NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok())
        .map_or_else(
            || raw.to_owned(),
            |time| time.format(DISPLAY_TIME_FORMAT).to_string(),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use adscope_directory::Dn;
    use pretty_assertions::assert_eq;

    fn record(classes: &[&str]) -> ObjectRecord {
        ObjectRecord::new(Dn::parse("CN=X,DC=example,DC=com").unwrap())
            .with_values("objectClass", classes.iter().copied())
    }

    #[test]
    fn group_class_column_composes_type_and_scope() {
        let schema = SchemaConfig::default();
        let group = record(&["top", "group"]).with_values("groupType", ["-2147483644"]);
        assert_eq!(
            AttributeFormatter::ObjectClass.format(&group, "objectClass", &schema),
            "Security - Domain Local"
        );
    }

    #[test]
    fn class_column_uses_display_name() {
        let schema = SchemaConfig::default();
        let ou = record(&["top", "organizationalUnit"]);
        assert_eq!(
            AttributeFormatter::ObjectClass.format(&ou, "objectClass", &schema),
            "Organizational Unit"
        );
        let unknown = record(&["top", "msDS-Thing"]);
        assert_eq!(
            AttributeFormatter::ObjectClass.format(&unknown, "objectClass", &schema),
            "msDS-Thing"
        );
    }

    #[test]
    fn times_render_in_utc() {
        let schema = SchemaConfig::default();
        let r = record(&["user"])
            .with_values("whenChanged", ["20240102030405.0Z"])
            .with_values("pwdLastSet", ["133485408000000000"])
            .with_values("accountExpires", ["9223372036854775807"]);

        assert_eq!(
            AttributeFormatter::GeneralizedTime.format(&r, "whenChanged", &schema),
            "2024-01-02 03:04:05"
        );
        assert_eq!(
            AttributeFormatter::FileTime.format(&r, "pwdLastSet", &schema),
            "2024-01-01 00:00:00"
        );
        assert_eq!(
            AttributeFormatter::FileTime.format(&r, "accountExpires", &schema),
            "(never)"
        );
    }

    #[test]
    fn cells_follow_columns() {
        let schema = SchemaConfig::default();
        let r = record(&["top", "user"])
            .with_values("name", ["Ann"])
            .with_values("description", ["first", "second"]);
        let cells = object_cells(&r, &schema);

        assert_eq!(cells.len(), schema.columns.len());
        insta::assert_debug_snapshot!(&cells[..3], @r#"
        [
            "Ann",
            "User",
            "first; second",
        ]
        "#);
    }

    #[test]
    fn formatter_parses_from_config_names() {
        let parsed: AttributeFormatter = "generalized_time".parse().unwrap();
        assert_eq!(parsed, AttributeFormatter::GeneralizedTime);
    }
}
