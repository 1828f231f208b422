// ── Console items ──
//
// Scope nodes, results rows, and the projected data they carry. Nodes
// and rows never hold an `ObjectRecord`; they keep only what display,
// lookup, and drop classification need.

use adscope_directory::{Dn, ObjectRecord, SystemFlag};
use serde::Serialize;
use strum::Display;

use super::arena::Handle;
use super::query::QueryDefinition;

pub type NodeHandle = Handle<ScopeNode>;
pub type RowHandle = Handle<ResultsRow>;

/// Either side of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemHandle {
    Scope(NodeHandle),
    Results(RowHandle),
}

impl From<NodeHandle> for ItemHandle {
    fn from(node: NodeHandle) -> Self {
        Self::Scope(node)
    }
}

impl From<RowHandle> for ItemHandle {
    fn from(row: RowHandle) -> Self {
        Self::Results(row)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize)]
pub enum ItemType {
    /// A directory object.
    #[default]
    Object,
    /// The static "Saved Queries" folder.
    QueryFolder,
    /// A saved query whose results are a search.
    QueryItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum FetchState {
    Unfetched,
    Fetching,
    Fetched,
}

/// Attribute searched by `search_scope_by_attribute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKey {
    /// Object DN, compared case-insensitively.
    Dn,
    /// Item name.
    Name,
    /// Any of the object's classes.
    ObjectClass,
}

/// Policy bits decoded once when the item is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PolicyFlags {
    pub cannot_move: bool,
    pub cannot_rename: bool,
    pub cannot_delete: bool,
    pub account_disabled: bool,
}

impl PolicyFlags {
    pub fn of(record: &ObjectRecord) -> Self {
        Self {
            cannot_move: record.system_flag(SystemFlag::CannotMove),
            cannot_rename: record.system_flag(SystemFlag::CannotRename),
            cannot_delete: record.system_flag(SystemFlag::CannotDelete),
            account_disabled: record.account_disabled(),
        }
    }
}

/// Data attached to a node or row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemData {
    pub item_type: ItemType,
    pub name: String,
    /// Set for `Object` items.
    pub dn: Option<Dn>,
    pub object_classes: Vec<String>,
    pub flags: PolicyFlags,
    /// Set for `QueryItem` items.
    pub query: Option<QueryDefinition>,
}

impl ItemData {
    pub fn object(record: &ObjectRecord) -> Self {
        Self {
            item_type: ItemType::Object,
            name: record.dn().name(),
            dn: Some(record.dn().clone()),
            object_classes: record.object_classes().to_vec(),
            flags: PolicyFlags::of(record),
            query: None,
        }
    }

    pub fn query_folder(name: impl Into<String>) -> Self {
        Self {
            item_type: ItemType::QueryFolder,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn query_item(definition: QueryDefinition) -> Self {
        Self {
            item_type: ItemType::QueryItem,
            name: definition.name.clone(),
            query: Some(definition),
            ..Self::default()
        }
    }

    pub fn is_class(&self, class: &str) -> bool {
        self.object_classes
            .iter()
            .any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Most specific class (listed last).
    pub fn main_class(&self) -> Option<&str> {
        self.object_classes.last().map(String::as_str)
    }

    pub(crate) fn matches(&self, lookup: &Lookup<'_>) -> bool {
        match lookup {
            Lookup::Dn(dn) => dn.is_some() && self.dn == *dn,
            Lookup::Name(name) => self.name.eq_ignore_ascii_case(name),
            Lookup::ObjectClass(class) => self.is_class(class),
        }
    }
}

/// A search value prepared for its key. DNs are parsed once; an
/// unparsable DN matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lookup<'a> {
    Dn(Option<Dn>),
    Name(&'a str),
    ObjectClass(&'a str),
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(key: ItemKey, value: &'a str) -> Self {
        match key {
            ItemKey::Dn => Self::Dn(Dn::parse(value).ok()),
            ItemKey::Name => Self::Name(value),
            ItemKey::ObjectClass => Self::ObjectClass(value),
        }
    }
}

/// Identifies a registered results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultsId(pub(crate) usize);

/// Column layout of one kind of results list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub name: String,
    pub columns: Vec<String>,
    pub default_columns: Vec<usize>,
}

/// A node of the scope tree.
#[derive(Debug)]
pub struct ScopeNode {
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    pub(crate) rows: Vec<RowHandle>,
    pub(crate) text: String,
    pub(crate) fetch_state: FetchState,
    pub(crate) dynamic: bool,
    pub(crate) results: ResultsId,
    pub(crate) data: ItemData,
    pub(crate) drag_enabled: bool,
}

impl ScopeNode {
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn results(&self) -> ResultsId {
        self.results
    }

    pub fn data(&self) -> &ItemData {
        &self.data
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }
}

/// A row of a results list.
#[derive(Debug)]
pub struct ResultsRow {
    pub(crate) scope_parent: NodeHandle,
    pub(crate) cells: Vec<String>,
    pub(crate) data: ItemData,
    pub(crate) drag_enabled: bool,
}

impl ResultsRow {
    pub fn scope_parent(&self) -> NodeHandle {
        self.scope_parent
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn data(&self) -> &ItemData {
        &self.data
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }
}
