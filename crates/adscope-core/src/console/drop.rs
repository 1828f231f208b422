// ── Drop classification ──
//
// Decides what dropping one object onto another means, then carries it
// out. Users and groups dropped on a group join it; anything dropped on
// a permitted parent class moves there; everything else is skipped.

use std::sync::Arc;

use adscope_directory::DirectoryService;
use adscope_directory::record::{CLASS_GROUP, CLASS_USER};
use serde::Serialize;
use strum::Display;
use tracing::debug;

use super::Console;
use super::fetch::count_objects;
use super::item::{ItemData, ItemHandle, ItemType};
use crate::config::SchemaConfig;
use crate::error::CoreError;
use crate::status::StatusMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum DropType {
    Move,
    AddToGroup,
    None,
}

/// Pure classification over item data and the schema's superiors table.
#[derive(Debug, Clone)]
pub struct DropClassifier {
    schema: Arc<SchemaConfig>,
}

impl DropClassifier {
    pub fn new(schema: Arc<SchemaConfig>) -> Self {
        Self { schema }
    }

    pub fn classify(&self, dragged: &ItemData, target: &ItemData) -> DropType {
        let (Some(dragged_dn), Some(target_dn)) = (&dragged.dn, &target.dn) else {
            return DropType::None;
        };

        let dragged_is_user = dragged.is_class(CLASS_USER);
        let dragged_is_group = dragged.is_class(CLASS_GROUP);
        let target_is_group = target.is_class(CLASS_GROUP);

        if dragged_dn == target_dn {
            DropType::None
        } else if (dragged_is_user || dragged_is_group) && target_is_group {
            DropType::AddToGroup
        } else if self
            .schema
            .possible_superiors(&dragged.object_classes)
            .into_iter()
            .any(|superior| target.is_class(superior))
        {
            DropType::Move
        } else {
            DropType::None
        }
    }

    /// Only objects can be dropped. Several at once are always accepted
    /// and classified one by one at drop time.
    pub fn can_drop(&self, dragged: &[&ItemData], target: &ItemData) -> bool {
        if dragged.is_empty() || !dragged.iter().all(|d| d.item_type == ItemType::Object) {
            return false;
        }
        match dragged {
            [single] => self.classify(single, target) != DropType::None,
            _ => true,
        }
    }
}

/// Per-kind outcome counts of one drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropSummary {
    pub moved: usize,
    pub added_to_group: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl<D: DirectoryService> Console<D> {
    pub fn classify_drop(&self, dragged: ItemHandle, target: ItemHandle) -> DropType {
        match (self.model.item_data(dragged), self.model.item_data(target)) {
            (Some(dragged), Some(target)) => self.classifier.classify(dragged, target),
            _ => DropType::None,
        }
    }

    pub fn can_drop(&self, dragged: &[ItemHandle], target: ItemHandle) -> bool {
        let Some(target) = self.model.item_data(target) else {
            return false;
        };
        let dragged: Option<Vec<&ItemData>> =
            dragged.iter().map(|h| self.model.item_data(*h)).collect();
        dragged.is_some_and(|dragged| self.classifier.can_drop(&dragged, target))
    }

    /// Execute a drop. Item data is snapshotted up front because moves
    /// delete and recreate console items. Partial success is normal;
    /// one status message covers the whole drop.
    pub fn drop_items(
        &mut self,
        dragged: &[ItemHandle],
        target: ItemHandle,
    ) -> Result<DropSummary, CoreError> {
        let target_data = self
            .model
            .item_data(target)
            .cloned()
            .ok_or(CoreError::StaleHandle)?;
        let Some(target_dn) = target_data.dn.clone() else {
            return Ok(DropSummary::default());
        };
        let snapshot: Vec<ItemData> = dragged
            .iter()
            .filter_map(|h| self.model.item_data(*h).cloned())
            .collect();

        let mut summary = DropSummary::default();
        let mut first_error: Option<CoreError> = None;
        let _busy = self.status.busy();

        for data in &snapshot {
            let Some(dn) = data.dn.as_ref() else {
                summary.skipped += 1;
                continue;
            };
            let drop_type = self.classifier.classify(data, &target_data);
            debug!(%dn, target = %target_dn, %drop_type, "dropping");

            let outcome = match drop_type {
                DropType::Move => self
                    .directory
                    .move_object(dn, &target_dn)
                    .map_err(CoreError::from)
                    .and_then(|_| self.object_move(std::slice::from_ref(dn), &target_dn))
                    .map(|()| summary.moved += 1),
                DropType::AddToGroup => self
                    .directory
                    .add_member(&target_dn, dn)
                    .map_err(CoreError::from)
                    .map(|()| summary.added_to_group += 1),
                DropType::None => {
                    summary.skipped += 1;
                    Ok(())
                }
            };
            if let Err(err) = outcome {
                summary.failed += 1;
                first_error.get_or_insert(err);
            }
        }

        self.model.sort_scope();

        let target_name = target_dn.name();
        let mut done = Vec::new();
        if summary.moved > 0 {
            done.push(format!("Moved {} to \"{target_name}\"", count_objects(summary.moved)));
        }
        if summary.added_to_group > 0 {
            done.push(format!(
                "Added {} to group \"{target_name}\"",
                count_objects(summary.added_to_group)
            ));
        }

        if let Some(err) = first_error {
            let failed = format!(
                "Failed to drop {} onto \"{target_name}\": {err}",
                count_objects(summary.failed)
            );
            let text = if done.is_empty() {
                failed
            } else {
                format!("{failed}. {}", done.join("; "))
            };
            self.status.add_message(StatusMessage::error(text));
        } else if !done.is_empty() {
            self.status.add_message(StatusMessage::success(done.join("; ")));
        }
        Ok(summary)
    }
}
