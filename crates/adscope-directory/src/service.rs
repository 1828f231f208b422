// ── Directory service seam ──
//
// The console consumes the directory through this trait. Calls are
// synchronous: the caller blocks until the server answers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::dn::Dn;
use crate::error::DirectoryError;
use crate::filter::Filter;
use crate::record::ObjectRecord;

/// How far below the base a search reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The base object only.
    Object,
    /// Immediate children of the base.
    Children,
    /// The base and everything below it.
    Subtree,
}

/// Search results keyed by DN, in server order.
pub type SearchResults = IndexMap<Dn, ObjectRecord>;

/// Read and write operations against a directory server.
pub trait DirectoryService {
    /// Host name of the connected server, for display.
    fn host(&self) -> &str;

    fn search(
        &mut self,
        filter: &Filter,
        attributes: &[String],
        scope: SearchScope,
        base: &Dn,
    ) -> Result<SearchResults, DirectoryError>;

    /// Look up one object by DN. An empty attribute list returns all.
    fn search_object(
        &mut self,
        dn: &Dn,
        attributes: &[String],
    ) -> Result<ObjectRecord, DirectoryError>;

    /// Move `dn` under `new_parent`, returning the new DN.
    fn move_object(&mut self, dn: &Dn, new_parent: &Dn) -> Result<Dn, DirectoryError>;

    /// Rename `dn` within its parent, returning the new DN.
    fn rename_object(&mut self, dn: &Dn, new_name: &str) -> Result<Dn, DirectoryError>;

    fn delete_object(&mut self, dn: &Dn) -> Result<(), DirectoryError>;

    fn add_object(&mut self, dn: &Dn, object_classes: &[&str]) -> Result<(), DirectoryError>;

    /// Replace all values of an attribute; an empty list clears it.
    fn replace_attribute(
        &mut self,
        dn: &Dn,
        attribute: &str,
        values: &[String],
    ) -> Result<(), DirectoryError>;

    fn add_member(&mut self, group: &Dn, member: &Dn) -> Result<(), DirectoryError>;
}
