// ── Object creation ──
//
// Creating an object is a batch: add the object, then apply the
// initial attribute edits. If any edit fails the half-built object is
// deleted again, and the whole batch reports one status message.

use adscope_directory::{DirectoryService, Dn};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::{debug, warn};

use super::Console;
use crate::error::CoreError;
use crate::status::StatusMessage;

/// Kinds of object the console can create.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum ObjectKind {
    User,
    Group,
    #[strum(to_string = "Organizational Unit", serialize = "ou")]
    OrganizationalUnit,
    Computer,
}

impl ObjectKind {
    pub fn object_classes(self) -> &'static [&'static str] {
        match self {
            Self::User => &["top", "person", "organizationalPerson", "user"],
            Self::Group => &["top", "group"],
            Self::OrganizationalUnit => &["top", "organizationalUnit"],
            Self::Computer => &["top", "person", "organizationalPerson", "user", "computer"],
        }
    }

    pub fn rdn_attribute(self) -> &'static str {
        match self {
            Self::OrganizationalUnit => "OU",
            Self::User | Self::Group | Self::Computer => "CN",
        }
    }
}

/// Replace all values of one attribute on the new object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEdit {
    pub attribute: String,
    pub values: Vec<String>,
}

impl AttributeEdit {
    pub fn new<I, S>(attribute: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl<D: DirectoryService> Console<D> {
    /// Create `name` of `kind` under `parent_dn` and apply `edits`.
    ///
    /// On success the object is inserted under its parent node when that
    /// node is loaded. If adding it or an edit fails, nothing is left in
    /// the directory or the console. If it was added but cannot be read
    /// back, it stays in the directory and the error message says so.
    pub fn create_object(
        &mut self,
        kind: ObjectKind,
        name: &str,
        parent_dn: &Dn,
        edits: &[AttributeEdit],
    ) -> Result<Dn, CoreError> {
        let dn = parent_dn.child(kind.rdn_attribute(), name);

        self.status.start_batch();
        let result = self.add_with_edits(kind, &dn, edits);
        if let Err(err) = &result {
            self.status.report_error(err);
        }
        let batch_errors = self.status.end_batch();
        for error in &batch_errors {
            debug!(%dn, %error, "create batch error");
        }

        if let Err(err) = result {
            let cause = batch_errors
                .into_iter()
                .next()
                .unwrap_or_else(|| err.to_string());
            self.status.add_message(StatusMessage::error(format!(
                "Failed to create {kind} - \"{name}\": {cause}"
            )));
            return Err(err);
        }

        let parent = self.node_for_dn(parent_dn);
        if let Err(err) = self.object_create(std::slice::from_ref(&dn), parent) {
            self.status.add_message(StatusMessage::error(format!(
                "Created {kind} - \"{name}\" but failed to load it: {err}"
            )));
            return Err(err);
        }
        self.model.sort_scope();
        self.status.add_message(StatusMessage::success(format!(
            "Created {kind} - \"{name}\""
        )));
        Ok(dn)
    }

    fn add_with_edits(
        &mut self,
        kind: ObjectKind,
        dn: &Dn,
        edits: &[AttributeEdit],
    ) -> Result<(), CoreError> {
        let _busy = self.status.busy();
        self.directory.add_object(dn, kind.object_classes())?;

        for edit in edits {
            if let Err(err) = self
                .directory
                .replace_attribute(dn, &edit.attribute, &edit.values)
            {
                if let Err(cleanup) = self.directory.delete_object(dn) {
                    warn!(%dn, error = %cleanup, "failed to remove partially created object");
                }
                return Err(err.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kinds_parse_from_cli_names() {
        assert_eq!("ou".parse::<ObjectKind>().ok(), Some(ObjectKind::OrganizationalUnit));
        assert_eq!("USER".parse::<ObjectKind>().ok(), Some(ObjectKind::User));
        assert_eq!(ObjectKind::OrganizationalUnit.to_string(), "Organizational Unit");
    }

    #[test]
    fn computer_classes_extend_user() {
        let classes = ObjectKind::Computer.object_classes();
        assert_eq!(classes.last(), Some(&"computer"));
        assert!(classes.contains(&"user"));
    }
}
