// ── Console facade ──
//
// `Console` ties the tree model to a directory, the injected settings
// and schema, and the status channel. Every mutating operation takes
// `&mut self`, so there is exactly one mutator and no locking.

pub mod actions;
mod arena;
mod buddy;
pub mod create;
pub mod drop;
pub mod fetch;
pub mod item;
mod loader;
pub mod model;
pub mod query;

use std::sync::Arc;

use adscope_directory::{DirectoryService, Filter};

pub use actions::{ActionSet, ObjectAction, visible_actions};
pub use arena::Handle;
pub use create::{AttributeEdit, ObjectKind};
pub use drop::{DropClassifier, DropSummary, DropType};
pub use fetch::scope_and_results_add_check;
pub use item::{
    FetchState, ItemData, ItemHandle, ItemKey, ItemType, NodeHandle, PolicyFlags, ResultsId,
    ResultsRow, ResultsView, RowHandle, ScopeNode,
};
pub use model::{ConsoleModel, ModelEvent};
pub use query::{QUERY_FOLDER_NAME, QueryDefinition, QueryNameError};

use crate::config::{ConsoleSettings, SchemaConfig};
use crate::status::StatusChannel;

/// Scope/results console over a directory service.
pub struct Console<D> {
    directory: D,
    model: ConsoleModel,
    settings: ConsoleSettings,
    schema: Arc<SchemaConfig>,
    status: StatusChannel,
    classifier: DropClassifier,
    objects_view: ResultsId,
    queries_view: ResultsId,
    user_filter: Option<Filter>,
    head: Option<NodeHandle>,
    query_root: Option<NodeHandle>,
    current_scope: Option<NodeHandle>,
}

impl<D: DirectoryService> Console<D> {
    pub fn new(directory: D, settings: ConsoleSettings, schema: SchemaConfig) -> Self {
        let schema = Arc::new(schema);
        let mut model = ConsoleModel::new();
        let objects_view = model.register_results(ResultsView {
            name: "objects".into(),
            columns: schema.header_labels(),
            default_columns: schema.default_columns(),
        });
        let queries_view = model.register_results(ResultsView {
            name: "queries".into(),
            columns: vec!["Name".into(), "Description".into()],
            default_columns: vec![0, 1],
        });

        Self {
            directory,
            model,
            settings,
            classifier: DropClassifier::new(Arc::clone(&schema)),
            schema,
            status: StatusChannel::new(),
            objects_view,
            queries_view,
            user_filter: None,
            head: None,
            query_root: None,
            current_scope: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn model(&self) -> &ConsoleModel {
        &self.model
    }

    pub fn status(&self) -> &StatusChannel {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusChannel {
        &mut self.status
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    pub fn into_directory(self) -> D {
        self.directory
    }

    pub fn settings(&self) -> ConsoleSettings {
        self.settings
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    pub fn classifier(&self) -> &DropClassifier {
        &self.classifier
    }

    /// The domain head node, once `tree_init` has run.
    pub fn head(&self) -> Option<NodeHandle> {
        self.head.filter(|h| self.model.is_valid((*h).into()))
    }

    /// The most recently selected scope node.
    pub fn current_scope(&self) -> Option<NodeHandle> {
        self.current_scope
            .filter(|h| self.model.is_valid((*h).into()))
    }

    /// Number of rows in the current scope's results.
    pub fn current_results_count(&self) -> usize {
        self.current_scope()
            .map_or(0, |node| self.model.results_of(node).len())
    }

    /// Description-bar text for the current scope, e.g. `3 objects`.
    pub fn current_description(&self) -> Option<String> {
        self.current_scope()
            .map(|_| fetch::count_objects(self.current_results_count()))
    }

    pub fn objects_view(&self) -> ResultsId {
        self.objects_view
    }

    pub fn user_filter(&self) -> Option<&Filter> {
        self.user_filter.as_ref()
    }

    /// Filter OR'd into every later object fetch. Already-fetched nodes
    /// keep their contents until refreshed.
    pub fn set_user_filter(&mut self, filter: Option<Filter>) {
        self.user_filter = filter;
    }
}
