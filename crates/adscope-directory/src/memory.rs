// ── In-memory directory backend ──
//
// A `DirectoryService` over a map of records, loadable from a YAML or
// JSON snapshot. It mirrors the server behaviors the console relies on:
// child/subtree scoping, partitions hidden from searches rooted above
// them, leaf-only deletes, moves that carry subtrees and rewrite member
// references. Fault switches let tests simulate an unreachable server
// or a rejected attribute write.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dn::Dn;
use crate::error::DirectoryError;
use crate::filter::{ATTRIBUTE_OBJECT_CLASS, Filter};
use crate::record::{ATTRIBUTE_DN, ATTRIBUTE_MEMBER, ATTRIBUTE_NAME, CLASS_GROUP, ObjectRecord};
use crate::service::{DirectoryService, SearchResults, SearchScope};

/// On-disk form of a directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub host: String,
    /// Naming context shown at the top of the tree. Defaults to the
    /// first object without a parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_head: Option<Dn>,
    /// Roots of partitions excluded from searches based above them
    /// (the configuration and schema containers).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Dn>,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

/// In-memory `DirectoryService`.
#[derive(Debug, Clone)]
pub struct MemoryDirectory {
    host: String,
    domain_head: Option<Dn>,
    partitions: Vec<Dn>,
    objects: IndexMap<Dn, ObjectRecord>,
    offline: bool,
    rejected_attributes: Vec<String>,
}

impl MemoryDirectory {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            domain_head: None,
            partitions: Vec::new(),
            objects: IndexMap::new(),
            offline: false,
            rejected_attributes: Vec::new(),
        }
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Result<Self, DirectoryError> {
        let mut directory = Self::new(snapshot.host);
        directory.domain_head = snapshot.domain_head;
        directory.partitions = snapshot.partitions;
        for record in snapshot.objects {
            directory.insert(record)?;
        }
        Ok(directory)
    }

    /// Load a snapshot file; `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let text = std::fs::read_to_string(path)?;
        let snapshot: DirectorySnapshot = if is_json(path) {
            serde_json::from_str(&text).map_err(|e| snapshot_error(path, &e))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| snapshot_error(path, &e))?
        };
        debug!(path = %path.display(), objects = snapshot.objects.len(), "loaded directory snapshot");
        Self::from_snapshot(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), DirectoryError> {
        let snapshot = self.snapshot();
        let text = if is_json(path) {
            serde_json::to_string_pretty(&snapshot).map_err(|e| snapshot_error(path, &e))?
        } else {
            serde_yaml::to_string(&snapshot).map_err(|e| snapshot_error(path, &e))?
        };
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            host: self.host.clone(),
            domain_head: self.domain_head.clone(),
            partitions: self.partitions.clone(),
            objects: self.objects.values().cloned().collect(),
        }
    }

    /// Add an object. Its parent must already exist unless it is a
    /// naming-context root.
    pub fn insert(&mut self, mut record: ObjectRecord) -> Result<(), DirectoryError> {
        let dn = record.dn().clone();
        if self.objects.contains_key(&dn) {
            return Err(DirectoryError::AlreadyExists { dn: dn.to_string() });
        }
        stamp(&mut record);
        self.objects.insert(dn, record);
        Ok(())
    }

    pub fn add_partition(&mut self, root: Dn) {
        self.partitions.push(root);
    }

    pub fn set_domain_head(&mut self, dn: Dn) {
        self.domain_head = Some(dn);
    }

    /// The explicit naming context, or the first parentless object.
    pub fn domain_head(&self) -> Option<Dn> {
        self.domain_head.clone().or_else(|| {
            self.objects
                .keys()
                .find(|dn| dn.parent().is_none_or(|p| !self.objects.contains_key(&p)))
                .cloned()
        })
    }

    pub fn get(&self, dn: &Dn) -> Option<&ObjectRecord> {
        self.objects.get(dn)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // ── Fault switches ───────────────────────────────────────────────

    /// While offline every operation fails with a connection error.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Writes to this attribute fail with a constraint violation.
    pub fn reject_attribute(&mut self, attribute: impl Into<String>) {
        self.rejected_attributes.push(attribute.into());
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn check_online(&self) -> Result<(), DirectoryError> {
        if self.offline {
            Err(DirectoryError::Connection {
                host: self.host.clone(),
                reason: "server unreachable".into(),
            })
        } else {
            Ok(())
        }
    }

    fn require(&self, dn: &Dn) -> Result<&ObjectRecord, DirectoryError> {
        self.objects
            .get(dn)
            .ok_or_else(|| DirectoryError::NoSuchObject { dn: dn.to_string() })
    }

    /// Objects inside a partition are only visible to searches based
    /// inside that partition.
    fn visible_from(&self, candidate: &Dn, base: &Dn) -> bool {
        self.partitions.iter().all(|partition| {
            let inside = candidate == partition || candidate.is_descendant_of(partition);
            !inside || base == partition || base.is_descendant_of(partition)
        })
    }

    fn has_children(&self, dn: &Dn) -> bool {
        self.objects.keys().any(|candidate| candidate.is_child_of(dn))
    }

    /// Re-key `old` and its subtree to `new`, rewriting member values
    /// that point into the subtree.
    fn rekey(&mut self, old: &Dn, new: &Dn) {
        let objects = std::mem::take(&mut self.objects);
        self.objects = objects
            .into_iter()
            .map(|(dn, mut record)| match dn.rebased(old, new) {
                Some(moved) => {
                    record.set_dn(moved.clone());
                    stamp(&mut record);
                    (moved, record)
                }
                None => (dn, record),
            })
            .collect();

        for record in self.objects.values_mut() {
            let members = record.values(ATTRIBUTE_MEMBER);
            if members.is_empty() {
                continue;
            }
            let rewritten: Vec<String> = members
                .iter()
                .map(|value| {
                    Dn::parse(value)
                        .ok()
                        .and_then(|member| member.rebased(old, new))
                        .map_or_else(|| value.clone(), |moved| moved.to_string())
                })
                .collect();
            record.set_values(ATTRIBUTE_MEMBER, rewritten);
        }
    }

    fn relocate(&mut self, dn: &Dn, new_dn: Dn) -> Result<Dn, DirectoryError> {
        if self.objects.contains_key(&new_dn) {
            return Err(DirectoryError::AlreadyExists {
                dn: new_dn.to_string(),
            });
        }
        self.rekey(dn, &new_dn);
        Ok(new_dn)
    }
}

impl DirectoryService for MemoryDirectory {
    fn host(&self) -> &str {
        &self.host
    }

    fn search(
        &mut self,
        filter: &Filter,
        attributes: &[String],
        scope: SearchScope,
        base: &Dn,
    ) -> Result<SearchResults, DirectoryError> {
        self.check_online()?;
        self.require(base)?;

        let results: SearchResults = self
            .objects
            .iter()
            .filter(|(dn, _)| match scope {
                SearchScope::Object => *dn == base,
                SearchScope::Children => dn.is_child_of(base),
                SearchScope::Subtree => *dn == base || dn.is_descendant_of(base),
            })
            .filter(|(dn, _)| self.visible_from(dn, base))
            .filter(|(_, record)| filter.matches(record))
            .map(|(dn, record)| (dn.clone(), record.project(attributes)))
            .collect();

        debug!(%base, %filter, ?scope, found = results.len(), "search");
        Ok(results)
    }

    fn search_object(
        &mut self,
        dn: &Dn,
        attributes: &[String],
    ) -> Result<ObjectRecord, DirectoryError> {
        self.check_online()?;
        Ok(self.require(dn)?.project(attributes))
    }

    fn move_object(&mut self, dn: &Dn, new_parent: &Dn) -> Result<Dn, DirectoryError> {
        self.check_online()?;
        self.require(dn)?;
        self.require(new_parent)?;
        if new_parent == dn || new_parent.is_descendant_of(dn) {
            return Err(DirectoryError::ConstraintViolation {
                dn: dn.to_string(),
                reason: "cannot move an object below itself".into(),
            });
        }

        let new_dn = self.relocate(dn, dn.moved_under(new_parent))?;
        debug!(from = %dn, to = %new_dn, "moved object");
        Ok(new_dn)
    }

    fn rename_object(&mut self, dn: &Dn, new_name: &str) -> Result<Dn, DirectoryError> {
        self.check_online()?;
        self.require(dn)?;

        let new_dn = self.relocate(dn, dn.renamed(new_name))?;
        debug!(from = %dn, to = %new_dn, "renamed object");
        Ok(new_dn)
    }

    fn delete_object(&mut self, dn: &Dn) -> Result<(), DirectoryError> {
        self.check_online()?;
        self.require(dn)?;
        if self.has_children(dn) {
            return Err(DirectoryError::ConstraintViolation {
                dn: dn.to_string(),
                reason: "object is not a leaf".into(),
            });
        }

        self.objects.shift_remove(dn);
        for record in self.objects.values_mut() {
            let members = record.values(ATTRIBUTE_MEMBER);
            if members.iter().any(|m| Dn::parse(m).is_ok_and(|m| m == *dn)) {
                let kept = members
                    .iter()
                    .filter(|m| !Dn::parse(m).is_ok_and(|m| m == *dn))
                    .cloned()
                    .collect();
                record.set_values(ATTRIBUTE_MEMBER, kept);
            }
        }
        debug!(%dn, "deleted object");
        Ok(())
    }

    fn add_object(&mut self, dn: &Dn, object_classes: &[&str]) -> Result<(), DirectoryError> {
        self.check_online()?;
        if let Some(parent) = dn.parent() {
            self.require(&parent)?;
        }
        let record = ObjectRecord::new(dn.clone())
            .with_values(ATTRIBUTE_OBJECT_CLASS, object_classes.iter().copied());
        self.insert(record)?;
        debug!(%dn, "added object");
        Ok(())
    }

    fn replace_attribute(
        &mut self,
        dn: &Dn,
        attribute: &str,
        values: &[String],
    ) -> Result<(), DirectoryError> {
        self.check_online()?;
        if self
            .rejected_attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(attribute))
        {
            return Err(DirectoryError::ConstraintViolation {
                dn: dn.to_string(),
                reason: format!("attribute {attribute} rejected"),
            });
        }
        let record = self
            .objects
            .get_mut(dn)
            .ok_or_else(|| DirectoryError::NoSuchObject { dn: dn.to_string() })?;
        record.set_values(attribute, values.to_vec());
        Ok(())
    }

    fn add_member(&mut self, group: &Dn, member: &Dn) -> Result<(), DirectoryError> {
        self.check_online()?;
        self.require(member)?;
        let record = self.require(group)?;
        if !record.is_class(CLASS_GROUP) {
            return Err(DirectoryError::ConstraintViolation {
                dn: group.to_string(),
                reason: "not a group".into(),
            });
        }
        let mut members = record.values(ATTRIBUTE_MEMBER).to_vec();
        if members.iter().any(|m| Dn::parse(m).is_ok_and(|m| m == *member)) {
            return Err(DirectoryError::AlreadyExists {
                dn: member.to_string(),
            });
        }
        members.push(member.to_string());

        if let Some(record) = self.objects.get_mut(group) {
            record.set_values(ATTRIBUTE_MEMBER, members);
        }
        debug!(%group, %member, "added group member");
        Ok(())
    }
}

/// Keep the naming attributes in step with the DN.
fn stamp(record: &mut ObjectRecord) {
    let dn = record.dn().clone();
    let name = dn.name();
    record.set_values(ATTRIBUTE_DN, vec![dn.to_string()]);
    record.set_values(ATTRIBUTE_NAME, vec![name.clone()]);
    record.set_values(dn.rdn_attribute(), vec![name]);
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn snapshot_error(path: &Path, err: &dyn std::fmt::Display) -> DirectoryError {
    DirectoryError::Snapshot {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
