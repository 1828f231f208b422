// ── Saved queries ──
//
// A static "Saved Queries" folder holds query folders and query items.
// A query item's results are a subtree search run when the item is
// first selected; its rows have no buddies and go stale when objects
// are deleted elsewhere in the console.

use adscope_directory::{DirectoryService, Dn, Filter, SearchScope};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::Console;
use super::item::{ItemData, ItemType, NodeHandle};
use super::loader::ObjectLoader;
use crate::error::CoreError;

pub const QUERY_FOLDER_NAME: &str = "Saved Queries";

/// A named search stored in the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub filter: Filter,
    pub search_base: Dn,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryNameError {
    #[error("Query name cannot be empty")]
    Empty,

    #[error("Query name cannot contain '/': {0}")]
    ContainsSlash(String),

    #[error("An item named '{0}' already exists in this folder")]
    Duplicate(String),
}

impl<D: DirectoryService> Console<D> {
    /// The "Saved Queries" root, created on first use.
    pub fn query_root(&mut self) -> Result<NodeHandle, CoreError> {
        if let Some(root) = self.query_root.filter(|r| self.model.is_valid((*r).into())) {
            return Ok(root);
        }

        let root = self
            .model
            .add_scope_node(None, self.queries_view, false)
            .ok_or_else(|| CoreError::Internal("cannot create query root".into()))?;
        self.model.set_text(root, QUERY_FOLDER_NAME);
        self.model
            .set_item_data(root.into(), ItemData::query_folder(QUERY_FOLDER_NAME));
        self.model.set_drag_enabled(root.into(), false);
        self.query_root = Some(root);
        Ok(root)
    }

    pub fn create_query_folder(
        &mut self,
        parent: NodeHandle,
        name: &str,
        description: &str,
    ) -> Result<NodeHandle, CoreError> {
        self.validate_query_name(parent, name)?;

        let (node, row) = self
            .model
            .add_buddy_scope_and_results(parent, self.queries_view, false)
            .ok_or(CoreError::StaleHandle)?;
        let data = ItemData::query_folder(name);
        self.model.set_text(node, name);
        self.model.set_item_data(node.into(), data.clone());
        self.model.set_item_data(row.into(), data);
        self.model
            .set_cells(row, vec![name.to_owned(), description.to_owned()]);
        self.model.sort_scope();
        Ok(node)
    }

    pub fn create_query_item(
        &mut self,
        parent: NodeHandle,
        definition: QueryDefinition,
    ) -> Result<NodeHandle, CoreError> {
        self.validate_query_name(parent, &definition.name)?;

        let (node, row) = self
            .model
            .add_buddy_scope_and_results(parent, self.objects_view, true)
            .ok_or(CoreError::StaleHandle)?;
        self.model.set_text(node, definition.name.as_str());
        self.model.set_cells(
            row,
            vec![definition.name.clone(), definition.description.clone()],
        );
        let data = ItemData::query_item(definition);
        self.model.set_item_data(node.into(), data.clone());
        self.model.set_item_data(row.into(), data);
        self.model.sort_scope();
        Ok(node)
    }

    /// Every saved query below the query root, in tree order.
    pub fn saved_queries(&self) -> Vec<QueryDefinition> {
        let Some(root) = self.query_root else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            let Some(scope) = self.model.scope_node(node) else {
                continue;
            };
            if let Some(query) = &scope.data().query {
                out.push(query.clone());
            }
            stack.extend(self.model.children(node).iter().rev().copied());
        }
        out
    }

    /// Run a query item's search and list every match as a plain row.
    pub(crate) fn fetch_query(
        &mut self,
        node: NodeHandle,
        query: &QueryDefinition,
    ) -> Result<(), CoreError> {
        let attributes = self.schema.search_attributes();
        let results = {
            let _busy = self.status.busy();
            self.directory.search(
                &query.filter,
                &attributes,
                SearchScope::Subtree,
                &query.search_base,
            )?
        };

        self.model.mark_fetched(node);
        let loader = ObjectLoader::new(&self.schema, self.settings, self.objects_view);
        for record in results.values() {
            if let Some(row) = self.model.add_results_row(node, None) {
                loader.load_row(&mut self.model, row, record);
            }
        }
        debug!(query = %query.name, found = results.len(), "fetched query results");
        Ok(())
    }

    fn validate_query_name(&self, parent: NodeHandle, name: &str) -> Result<(), CoreError> {
        let parent_data = self
            .model
            .scope_node(parent)
            .map(|n| n.data().item_type)
            .ok_or(CoreError::StaleHandle)?;
        if parent_data != ItemType::QueryFolder {
            return Err(CoreError::Rejected {
                message: "queries can only be created inside a query folder".into(),
            });
        }

        if name.trim().is_empty() {
            return Err(QueryNameError::Empty.into());
        }
        if name.contains('/') {
            return Err(QueryNameError::ContainsSlash(name.to_owned()).into());
        }
        let taken = self.model.children(parent).iter().any(|child| {
            self.model
                .scope_node(*child)
                .is_some_and(|c| c.data().name.eq_ignore_ascii_case(name))
        });
        if taken {
            return Err(QueryNameError::Duplicate(name.to_owned()).into());
        }
        Ok(())
    }
}
