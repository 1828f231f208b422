//! Scope/results console engine between `adscope-directory` and the CLI.
//!
//! This crate owns the tree model and the logic that keeps it in sync
//! with a directory server:
//!
//! - **[`Console`]**: Central facade. [`tree_init()`](Console::tree_init)
//!   builds the domain head node, [`expand()`](Console::expand)
//!   and [`select()`](Console::select) fetch children lazily, and the
//!   `object_*` operations mirror directory changes into the tree.
//!
//! - **[`ConsoleModel`]**: Arena-backed scope tree plus results rows.
//!   Scope nodes and their results-row "buddies" are created and deleted
//!   together. Changes are broadcast as [`ModelEvent`]s and a `watch`
//!   version counter.
//!
//! - **[`DropClassifier`]**: Pure classification of drag-and-drop
//!   gestures into move / add-to-group / nothing.
//!
//! - **[`StatusChannel`]**: Status-bar messages, batched error
//!   reporting, and a busy indicator guard.
//!
//! - **Configuration** ([`config`]): Injected [`ConsoleSettings`] and
//!   [`SchemaConfig`]. Core never reads config files; the
//!   `adscope-config` crate builds these values.

pub mod config;
pub mod console;
pub mod display;
pub mod error;
pub mod status;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ColumnSpec, ConsoleSettings, SchemaConfig, WellKnownRoots};
pub use console::{
    ActionSet, AttributeEdit, Console, ConsoleModel, DropClassifier, DropSummary, DropType,
    FetchState, ItemData, ItemHandle, ItemKey, ItemType, ModelEvent, NodeHandle, ObjectAction,
    ObjectKind, PolicyFlags, QUERY_FOLDER_NAME, QueryDefinition, QueryNameError, ResultsId,
    ResultsRow, ResultsView, RowHandle, ScopeNode, visible_actions,
};
pub use display::{AttributeFormatter, object_cells};
pub use error::CoreError;
pub use status::{BusyGuard, StatusChannel, StatusKind, StatusMessage};
