// ── Object loading ──
//
// Projects search records onto console items: node text, row cells,
// item data, drag state. Records are consumed here and never stored.

use adscope_directory::ObjectRecord;

use super::item::{ItemData, ItemHandle, NodeHandle, ResultsId, RowHandle};
use super::model::ConsoleModel;
use crate::config::{ConsoleSettings, SchemaConfig};
use crate::display::object_cells;

pub(crate) struct ObjectLoader<'a> {
    schema: &'a SchemaConfig,
    settings: ConsoleSettings,
    results: ResultsId,
}

impl<'a> ObjectLoader<'a> {
    pub(crate) fn new(
        schema: &'a SchemaConfig,
        settings: ConsoleSettings,
        results: ResultsId,
    ) -> Self {
        Self {
            schema,
            settings,
            results,
        }
    }

    /// Containers always go in the scope tree; leaves only when the
    /// show-non-containers setting is on.
    pub(crate) fn should_be_in_scope(&self, record: &ObjectRecord) -> bool {
        self.schema.is_container(record) || self.settings.show_non_containers
    }

    /// Insert records under `parent`, skipping any DN already listed
    /// there. Returns the number inserted. The caller checks the parent
    /// and sorts afterwards.
    pub(crate) fn insert<'r>(
        &self,
        model: &mut ConsoleModel,
        parent: NodeHandle,
        records: impl IntoIterator<Item = &'r ObjectRecord>,
    ) -> usize {
        let mut added = 0;
        for record in records {
            let already_listed = model.results_of(parent).iter().any(|row| {
                model
                    .results_row(*row)
                    .and_then(|r| r.data().dn.as_ref())
                    .is_some_and(|dn| dn == record.dn())
            });
            if already_listed {
                continue;
            }

            if self.should_be_in_scope(record) {
                if let Some((node, row)) =
                    model.add_buddy_scope_and_results(parent, self.results, true)
                {
                    load_node(model, node, record);
                    self.load_row(model, row, record);
                    added += 1;
                }
            } else if let Some(row) = model.add_results_row(parent, None) {
                self.load_row(model, row, record);
                added += 1;
            }
        }
        added
    }

    pub(crate) fn load_row(&self, model: &mut ConsoleModel, row: RowHandle, record: &ObjectRecord) {
        model.set_cells(row, object_cells(record, self.schema));
        load_data(model, row.into(), record);
    }
}

/// Node text is the object's RDN value.
pub(crate) fn load_node(model: &mut ConsoleModel, node: NodeHandle, record: &ObjectRecord) {
    model.set_text(node, record.dn().name());
    load_data(model, node.into(), record);
}

fn load_data(model: &mut ConsoleModel, item: ItemHandle, record: &ObjectRecord) {
    let data = ItemData::object(record);
    let cannot_move = data.flags.cannot_move;
    model.set_item_data(item, data);
    model.set_drag_enabled(item, !cannot_move);
}
