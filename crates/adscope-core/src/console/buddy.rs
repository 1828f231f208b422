// ── Buddy linkage tracker ──
//
// Bidirectional table between a scope node and the results row that
// shows the same object in its parent's results list. The table holds
// back-references only; nodes and rows are owned by the model.

use std::collections::HashMap;

use super::item::{NodeHandle, RowHandle};

/// `NodeHandle ⇄ RowHandle` lookup kept symmetric on every mutation.
#[derive(Debug, Default)]
pub(crate) struct BuddyTracker {
    /// Scope node -> its results row.
    row_by_node: HashMap<NodeHandle, RowHandle>,

    /// Reverse of `row_by_node`.
    node_by_row: HashMap<RowHandle, NodeHandle>,
}

impl BuddyTracker {
    /// Pair `node` with `row`, dropping any previous partner of either.
    pub(crate) fn link(&mut self, node: NodeHandle, row: RowHandle) {
        self.unlink_node(node);
        self.unlink_row(row);
        self.row_by_node.insert(node, row);
        self.node_by_row.insert(row, node);
    }

    pub(crate) fn row_of(&self, node: NodeHandle) -> Option<RowHandle> {
        self.row_by_node.get(&node).copied()
    }

    pub(crate) fn node_of(&self, row: RowHandle) -> Option<NodeHandle> {
        self.node_by_row.get(&row).copied()
    }

    /// Erase both directions of `node`'s pair, returning its row.
    /// A second call for the same pair returns `None`.
    pub(crate) fn unlink_node(&mut self, node: NodeHandle) -> Option<RowHandle> {
        let row = self.row_by_node.remove(&node)?;
        self.node_by_row.remove(&row);
        Some(row)
    }

    /// Erase both directions of `row`'s pair, returning its node.
    pub(crate) fn unlink_row(&mut self, row: RowHandle) -> Option<NodeHandle> {
        let node = self.node_by_row.remove(&row)?;
        self.row_by_node.remove(&node);
        Some(node)
    }

    pub(crate) fn len(&self) -> usize {
        self.row_by_node.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::console::arena::Handle;

    fn node(i: usize) -> NodeHandle {
        Handle::new(i, 0)
    }

    fn row(i: usize) -> RowHandle {
        Handle::new(i, 0)
    }

    #[test]
    fn link_is_symmetric() {
        let mut buddies = BuddyTracker::default();
        buddies.link(node(1), row(7));

        assert_eq!(buddies.row_of(node(1)), Some(row(7)));
        assert_eq!(buddies.node_of(row(7)), Some(node(1)));
    }

    #[test]
    fn second_unlink_returns_none() {
        let mut buddies = BuddyTracker::default();
        buddies.link(node(1), row(7));

        assert_eq!(buddies.unlink_row(row(7)), Some(node(1)));
        assert_eq!(buddies.unlink_node(node(1)), None);
        assert_eq!(buddies.len(), 0);
    }

    #[test]
    fn relink_drops_previous_partner() {
        let mut buddies = BuddyTracker::default();
        buddies.link(node(1), row(7));
        buddies.link(node(1), row(8));

        assert_eq!(buddies.node_of(row(7)), None);
        assert_eq!(buddies.row_of(node(1)), Some(row(8)));
        assert_eq!(buddies.len(), 1);
    }
}
