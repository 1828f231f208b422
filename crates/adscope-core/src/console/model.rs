// ── Console tree model ──
//
// Owns every scope node and results row. Nodes live in one arena, rows
// in another; parent/child lists and the buddy table refer to them by
// handle only. Every mutation bumps a version published on a `watch`
// channel and emits item events on a broadcast channel, which is how
// views learn they need to redraw.

use std::collections::HashSet;

use adscope_directory::Dn;
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace};

use super::arena::Arena;
use super::buddy::BuddyTracker;
use super::item::{
    FetchState, ItemData, ItemHandle, ItemKey, ItemType, Lookup, NodeHandle, ResultsId, ResultsRow,
    ResultsView, RowHandle, ScopeNode,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Structural change notifications, in mutation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    ItemAdded { item: ItemHandle },
    ItemRemoved { item: ItemHandle, dn: Option<Dn> },
    Sorted,
}

/// The scope tree plus every results list.
pub struct ConsoleModel {
    nodes: Arena<ScopeNode>,
    rows: Arena<ResultsRow>,
    roots: Vec<NodeHandle>,
    buddies: BuddyTracker,
    views: Vec<ResultsView>,
    version: watch::Sender<u64>,
    events: broadcast::Sender<ModelEvent>,
}

impl Default for ConsoleModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleModel {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            nodes: Arena::default(),
            rows: Arena::default(),
            roots: Vec::new(),
            buddies: BuddyTracker::default(),
            views: Vec::new(),
            version,
            events,
        }
    }

    pub fn register_results(&mut self, view: ResultsView) -> ResultsId {
        self.views.push(view);
        ResultsId(self.views.len() - 1)
    }

    pub fn results_view(&self, id: ResultsId) -> Option<&ResultsView> {
        self.views.get(id.0)
    }

    // ── Insertion ────────────────────────────────────────────────────

    /// Create a scope node under `parent`, or a root when `parent` is
    /// `None`. Returns `None` when the parent is stale or not fetched.
    pub fn add_scope_node(
        &mut self,
        parent: Option<NodeHandle>,
        results: ResultsId,
        dynamic: bool,
    ) -> Option<NodeHandle> {
        if let Some(parent) = parent {
            if !self.item_was_fetched(parent) {
                debug!(?parent, "refusing scope node under unfetched parent");
                return None;
            }
        }

        let fetch_state = if dynamic {
            FetchState::Unfetched
        } else {
            FetchState::Fetched
        };
        let handle = self.nodes.insert(ScopeNode {
            parent,
            children: Vec::new(),
            rows: Vec::new(),
            text: String::new(),
            fetch_state,
            dynamic,
            results,
            data: ItemData::default(),
            drag_enabled: true,
        });

        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(handle),
            None => self.roots.push(handle),
        }

        self.emit(ModelEvent::ItemAdded {
            item: handle.into(),
        });
        self.bump_version();
        Some(handle)
    }

    /// Append a row to `scope_parent`'s results, optionally paired with
    /// `buddy`. Returns `None` when either handle is stale or the parent
    /// is not fetched.
    pub fn add_results_row(
        &mut self,
        scope_parent: NodeHandle,
        buddy: Option<NodeHandle>,
    ) -> Option<RowHandle> {
        if !self.item_was_fetched(scope_parent) {
            debug!(?scope_parent, "refusing results row under unfetched parent");
            return None;
        }
        if buddy.is_some_and(|b| !self.nodes.contains(b)) {
            return None;
        }

        let cell_count = self
            .nodes
            .get(scope_parent)
            .and_then(|node| self.views.get(node.results.0))
            .map_or(0, |view| view.columns.len());

        let handle = self.rows.insert(ResultsRow {
            scope_parent,
            cells: vec![String::new(); cell_count],
            data: ItemData::default(),
            drag_enabled: true,
        });
        if let Some(parent_node) = self.nodes.get_mut(scope_parent) {
            parent_node.rows.push(handle);
        }
        if let Some(buddy) = buddy {
            self.buddies.link(buddy, handle);
        }

        self.emit(ModelEvent::ItemAdded {
            item: handle.into(),
        });
        self.bump_version();
        Some(handle)
    }

    /// A dynamic-or-static node under `parent` plus its row in
    /// `parent`'s results, linked as buddies.
    pub fn add_buddy_scope_and_results(
        &mut self,
        parent: NodeHandle,
        results: ResultsId,
        dynamic: bool,
    ) -> Option<(NodeHandle, RowHandle)> {
        let node = self.add_scope_node(Some(parent), results, dynamic)?;
        let row = self.add_results_row(parent, Some(node))?;
        Some((node, row))
    }

    // ── Item state ───────────────────────────────────────────────────

    pub fn set_text(&mut self, node: NodeHandle, text: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.text = text.into();
            self.bump_version();
        }
    }

    pub fn set_cells(&mut self, row: RowHandle, cells: Vec<String>) {
        if let Some(row) = self.rows.get_mut(row) {
            row.cells = cells;
            self.bump_version();
        }
    }

    pub fn set_item_data(&mut self, item: ItemHandle, data: ItemData) {
        match item {
            ItemHandle::Scope(h) => {
                if let Some(node) = self.nodes.get_mut(h) {
                    node.data = data;
                }
            }
            ItemHandle::Results(h) => {
                if let Some(row) = self.rows.get_mut(h) {
                    row.data = data;
                }
            }
        }
        self.bump_version();
    }

    pub fn set_drag_enabled(&mut self, item: ItemHandle, enabled: bool) {
        match item {
            ItemHandle::Scope(h) => {
                if let Some(node) = self.nodes.get_mut(h) {
                    node.drag_enabled = enabled;
                }
            }
            ItemHandle::Results(h) => {
                if let Some(row) = self.rows.get_mut(h) {
                    row.drag_enabled = enabled;
                }
            }
        }
    }

    // ── Fetch state ──────────────────────────────────────────────────

    pub fn fetch_state(&self, node: NodeHandle) -> Option<FetchState> {
        self.nodes.get(node).map(|n| n.fetch_state)
    }

    pub fn item_was_fetched(&self, node: NodeHandle) -> bool {
        self.fetch_state(node) == Some(FetchState::Fetched)
    }

    pub fn mark_fetching(&mut self, node: NodeHandle) {
        self.set_fetch_state(node, FetchState::Fetching);
    }

    pub fn mark_fetched(&mut self, node: NodeHandle) {
        self.set_fetch_state(node, FetchState::Fetched);
    }

    pub fn mark_unfetched(&mut self, node: NodeHandle) {
        self.set_fetch_state(node, FetchState::Unfetched);
    }

    /// Drop `node`'s children and rows and mark it unfetched. The node
    /// itself keeps its handle.
    pub fn refresh_scope(&mut self, node: NodeHandle) {
        let Some(scope) = self.nodes.get(node) else {
            return;
        };
        let items: Vec<ItemHandle> = scope
            .children
            .iter()
            .copied()
            .map(ItemHandle::Scope)
            .chain(scope.rows.iter().copied().map(ItemHandle::Results))
            .collect();
        let dynamic = scope.dynamic;

        self.delete_items(&items);
        if dynamic {
            self.mark_unfetched(node);
        }
    }

    // ── Deletion ─────────────────────────────────────────────────────

    /// Remove a node (with its subtree and every row under it) or a row,
    /// together with any buddy. Stale handles are ignored.
    pub fn delete_item(&mut self, item: ItemHandle) {
        self.delete_items(&[item]);
    }

    pub fn delete_items(&mut self, items: &[ItemHandle]) {
        let (nodes, rows) = self.collect_removal(items);
        if nodes.is_empty() && rows.is_empty() {
            return;
        }

        for row in rows {
            self.buddies.unlink_row(row);
            let Some(removed) = self.rows.remove(row) else {
                continue;
            };
            if let Some(parent) = self.nodes.get_mut(removed.scope_parent) {
                parent.rows.retain(|r| *r != row);
            }
            self.emit(ModelEvent::ItemRemoved {
                item: row.into(),
                dn: removed.data.dn,
            });
        }

        for node in nodes {
            self.buddies.unlink_node(node);
            let Some(removed) = self.nodes.remove(node) else {
                continue;
            };
            match removed.parent.and_then(|p| self.nodes.get_mut(p)) {
                Some(parent) => parent.children.retain(|c| *c != node),
                None => self.roots.retain(|r| *r != node),
            }
            self.emit(ModelEvent::ItemRemoved {
                item: node.into(),
                dn: removed.data.dn,
            });
        }

        self.bump_version();
    }

    /// Every node and row that goes with `items`: subtrees, their rows,
    /// and the buddies of both. Collected before anything is removed.
    fn collect_removal(&self, items: &[ItemHandle]) -> (Vec<NodeHandle>, Vec<RowHandle>) {
        let mut nodes = Vec::new();
        let mut rows = Vec::new();
        let mut seen_nodes = HashSet::new();
        let mut seen_rows = HashSet::new();
        let mut stack: Vec<ItemHandle> = items.to_vec();

        while let Some(item) = stack.pop() {
            match item {
                ItemHandle::Scope(h) => {
                    let Some(node) = self.nodes.get(h) else {
                        continue;
                    };
                    if !seen_nodes.insert(h) {
                        continue;
                    }
                    nodes.push(h);
                    stack.extend(node.children.iter().copied().map(ItemHandle::Scope));
                    stack.extend(node.rows.iter().copied().map(ItemHandle::Results));
                    if let Some(row) = self.buddies.row_of(h) {
                        stack.push(ItemHandle::Results(row));
                    }
                }
                ItemHandle::Results(h) => {
                    if !self.rows.contains(h) || !seen_rows.insert(h) {
                        continue;
                    }
                    rows.push(h);
                    if let Some(node) = self.buddies.node_of(h) {
                        stack.push(ItemHandle::Scope(node));
                    }
                }
            }
        }

        trace!(nodes = nodes.len(), rows = rows.len(), "collected items for removal");
        (nodes, rows)
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Depth-first search of the scope tree.
    pub fn search_scope_by_attribute(
        &self,
        key: ItemKey,
        value: &str,
        type_filter: Option<ItemType>,
    ) -> Vec<NodeHandle> {
        let lookup = Lookup::new(key, value);
        self.walk_scope()
            .into_iter()
            .filter(|h| {
                self.nodes
                    .get(*h)
                    .is_some_and(|node| accepts(&node.data, &lookup, type_filter))
            })
            .collect()
    }

    /// Search every results list, in scope-tree order.
    pub fn search_results_by_attribute(
        &self,
        key: ItemKey,
        value: &str,
        type_filter: Option<ItemType>,
    ) -> Vec<RowHandle> {
        let lookup = Lookup::new(key, value);
        self.walk_scope()
            .into_iter()
            .filter_map(|h| self.nodes.get(h))
            .flat_map(|node| node.rows.iter().copied())
            .filter(|r| {
                self.rows
                    .get(*r)
                    .is_some_and(|row| accepts(&row.data, &lookup, type_filter))
            })
            .collect()
    }

    /// All nodes, pre-order.
    fn walk_scope(&self) -> Vec<NodeHandle> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeHandle> = self.roots.iter().rev().copied().collect();
        while let Some(h) = stack.pop() {
            if let Some(node) = self.nodes.get(h) {
                out.push(h);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // ── Sorting ──────────────────────────────────────────────────────

    /// Stable, case-insensitive sort of every sibling list by text.
    pub fn sort_scope(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by_cached_key(|h| self.sort_key(*h));
        self.roots = roots;

        for parent in self.walk_scope() {
            let Some(node) = self.nodes.get_mut(parent) else {
                continue;
            };
            let mut children = std::mem::take(&mut node.children);
            children.sort_by_cached_key(|h| self.sort_key(*h));
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children = children;
            }
        }

        self.emit(ModelEvent::Sorted);
        self.bump_version();
    }

    fn sort_key(&self, node: NodeHandle) -> String {
        self.nodes
            .get(node)
            .map(|n| n.text.to_lowercase())
            .unwrap_or_default()
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn scope_node(&self, node: NodeHandle) -> Option<&ScopeNode> {
        self.nodes.get(node)
    }

    pub fn results_row(&self, row: RowHandle) -> Option<&ResultsRow> {
        self.rows.get(row)
    }

    pub fn roots(&self) -> &[NodeHandle] {
        &self.roots
    }

    pub fn children(&self, node: NodeHandle) -> &[NodeHandle] {
        self.nodes.get(node).map_or(&[], |n| n.children.as_slice())
    }

    pub fn results_of(&self, node: NodeHandle) -> &[RowHandle] {
        self.nodes.get(node).map_or(&[], |n| n.rows.as_slice())
    }

    pub fn scope_parent(&self, row: RowHandle) -> Option<NodeHandle> {
        self.rows.get(row).map(|r| r.scope_parent)
    }

    pub fn get_buddy(&self, item: ItemHandle) -> Option<ItemHandle> {
        match item {
            ItemHandle::Scope(h) => self.buddies.row_of(h).map(ItemHandle::Results),
            ItemHandle::Results(h) => self.buddies.node_of(h).map(ItemHandle::Scope),
        }
    }

    pub fn item_data(&self, item: ItemHandle) -> Option<&ItemData> {
        match item {
            ItemHandle::Scope(h) => self.nodes.get(h).map(|n| &n.data),
            ItemHandle::Results(h) => self.rows.get(h).map(|r| &r.data),
        }
    }

    pub fn is_valid(&self, item: ItemHandle) -> bool {
        match item {
            ItemHandle::Scope(h) => self.nodes.contains(h),
            ItemHandle::Results(h) => self.rows.contains(h),
        }
    }

    pub fn scope_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn results_len(&self) -> usize {
        self.rows.len()
    }

    pub fn buddy_len(&self) -> usize {
        self.buddies.len()
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ModelEvent> {
        self.events.subscribe()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn set_fetch_state(&mut self, node: NodeHandle, state: FetchState) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.fetch_state = state;
            self.bump_version();
        }
    }

    fn emit(&self, event: ModelEvent) {
        // No subscribers is the common case outside tests.
        let _ = self.events.send(event);
    }

    fn bump_version(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.version.send_modify(|v| *v += 1);
    }
}

fn accepts(data: &ItemData, lookup: &Lookup<'_>, type_filter: Option<ItemType>) -> bool {
    type_filter.is_none_or(|t| data.item_type == t) && data.matches(lookup)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn model() -> (ConsoleModel, ResultsId) {
        let mut model = ConsoleModel::new();
        let view = model.register_results(ResultsView {
            name: "objects".into(),
            columns: vec!["Name".into(), "Type".into()],
            default_columns: vec![0, 1],
        });
        (model, view)
    }

    fn named(model: &mut ConsoleModel, node: NodeHandle, text: &str) {
        model.set_text(node, text);
        model.set_item_data(
            node.into(),
            ItemData {
                name: text.into(),
                ..ItemData::default()
            },
        );
    }

    fn texts(model: &ConsoleModel, nodes: &[NodeHandle]) -> Vec<String> {
        nodes
            .iter()
            .map(|h| model.scope_node(*h).unwrap().text().to_owned())
            .collect()
    }

    #[test]
    fn children_require_fetched_parent() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, true).unwrap();

        assert!(model.add_scope_node(Some(root), view, true).is_none());
        assert!(model.add_results_row(root, None).is_none());

        model.mark_fetched(root);
        assert!(model.add_scope_node(Some(root), view, true).is_some());
    }

    #[test]
    fn static_nodes_start_fetched() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, false).unwrap();
        assert!(model.item_was_fetched(root));
    }

    #[test]
    fn rows_get_one_cell_per_column() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, false).unwrap();
        let row = model.add_results_row(root, None).unwrap();
        assert_eq!(model.results_row(row).unwrap().cells().len(), 2);
    }

    #[test]
    fn deleting_row_takes_buddy_subtree() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, false).unwrap();
        let (node, row) = model.add_buddy_scope_and_results(root, view, false).unwrap();
        let (_grandchild, _) = model.add_buddy_scope_and_results(node, view, false).unwrap();

        assert_eq!(model.scope_len(), 3);
        model.delete_item(row.into());

        assert_eq!(model.scope_len(), 1);
        assert_eq!(model.results_len(), 0);
        assert_eq!(model.buddy_len(), 0);
        assert!(model.children(root).is_empty());
        assert!(model.get_buddy(node.into()).is_none());
    }

    #[test]
    fn deleting_stale_handle_is_noop() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, false).unwrap();
        let (node, _) = model.add_buddy_scope_and_results(root, view, false).unwrap();
        model.delete_item(node.into());
        let version = model.version();

        model.delete_item(node.into());
        assert_eq!(model.version(), version);
    }

    #[test]
    fn refresh_keeps_handle_and_resets_state() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, true).unwrap();
        model.mark_fetched(root);
        model.add_buddy_scope_and_results(root, view, true).unwrap();
        model.add_results_row(root, None).unwrap();

        model.refresh_scope(root);

        assert_eq!(model.fetch_state(root), Some(FetchState::Unfetched));
        assert!(model.children(root).is_empty());
        assert!(model.results_of(root).is_empty());
        assert_eq!(model.scope_len(), 1);
    }

    #[test]
    fn sort_is_stable_and_idempotent() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, false).unwrap();
        for text in ["beta", "Alpha", "alpha", "Gamma"] {
            let node = model.add_scope_node(Some(root), view, false).unwrap();
            named(&mut model, node, text);
        }

        model.sort_scope();
        let once = texts(&model, model.children(root));
        assert_eq!(once, vec!["Alpha", "alpha", "beta", "Gamma"]);

        model.sort_scope();
        assert_eq!(texts(&model, model.children(root)), once);
    }

    #[test]
    fn search_walks_deep_trees() {
        let (mut model, view) = model();
        let mut parent = model.add_scope_node(None, view, false).unwrap();
        for depth in 0..5 {
            let node = model.add_scope_node(Some(parent), view, false).unwrap();
            named(&mut model, node, &format!("level{depth}"));
            parent = node;
        }

        let found = model.search_scope_by_attribute(ItemKey::Name, "LEVEL4", None);
        assert_eq!(found, vec![parent]);
        assert!(
            model
                .search_scope_by_attribute(ItemKey::Name, "level4", Some(ItemType::QueryItem))
                .is_empty()
        );
    }

    #[test]
    fn dn_search_compares_parsed_names() {
        let (mut model, view) = model();
        let root = model.add_scope_node(None, view, false).unwrap();
        let (node, row) = model.add_buddy_scope_and_results(root, view, false).unwrap();
        let data = ItemData {
            name: "Sales".into(),
            dn: Some(Dn::parse("OU=Sales,DC=example,DC=com").unwrap()),
            ..ItemData::default()
        };
        model.set_item_data(node.into(), data.clone());
        model.set_item_data(row.into(), data);

        assert_eq!(
            model.search_scope_by_attribute(ItemKey::Dn, "ou=sales, dc=example, dc=com", None),
            vec![node]
        );
        assert_eq!(
            model.search_results_by_attribute(ItemKey::Dn, "OU=Sales,DC=example,DC=com", None),
            vec![row]
        );
        assert!(
            model
                .search_scope_by_attribute(ItemKey::Dn, "not a dn", None)
                .is_empty()
        );
    }

    #[test]
    fn mutations_publish_events() {
        let (mut model, view) = model();
        let mut events = model.subscribe_events();
        let root = model.add_scope_node(None, view, false).unwrap();
        model.delete_item(root.into());

        assert_eq!(
            events.try_recv().unwrap(),
            ModelEvent::ItemAdded { item: root.into() }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ModelEvent::ItemRemoved {
                item: root.into(),
                dn: None
            }
        );
    }
}
