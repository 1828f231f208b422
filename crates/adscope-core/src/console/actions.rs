// ── Object actions ──
//
// Which object actions a selection offers, and which of those are
// greyed out by policy flags.

use std::collections::BTreeSet;

use adscope_directory::DirectoryService;
use adscope_directory::record::{CLASS_DOMAIN, CLASS_USER};
use serde::Serialize;
use strum::{Display, EnumIter};

use super::Console;
use super::item::{ItemData, ItemHandle, ItemType};
use crate::config::SchemaConfig;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, Serialize,
)]
pub enum ObjectAction {
    NewUser,
    NewComputer,
    NewOu,
    NewGroup,
    Find,
    AddToGroup,
    Enable,
    Disable,
    ResetPassword,
    EditUpnSuffixes,
    Delete,
    Rename,
    Move,
}

/// Visible actions, some possibly disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionSet {
    visible: BTreeSet<ObjectAction>,
    disabled: BTreeSet<ObjectAction>,
}

impl ActionSet {
    fn show(&mut self, action: ObjectAction) {
        self.visible.insert(action);
    }

    fn set_disabled(&mut self, action: ObjectAction, disabled: bool) {
        if disabled {
            self.disabled.insert(action);
        } else {
            self.disabled.remove(&action);
        }
    }

    pub fn is_visible(&self, action: ObjectAction) -> bool {
        self.visible.contains(&action)
    }

    pub fn is_enabled(&self, action: ObjectAction) -> bool {
        self.is_visible(action) && !self.disabled.contains(&action)
    }

    pub fn visible(&self) -> impl Iterator<Item = ObjectAction> + '_ {
        self.visible.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

/// Actions for a selection. Anything but a pure object selection
/// offers nothing.
pub fn visible_actions(selection: &[&ItemData], schema: &SchemaConfig) -> ActionSet {
    let mut actions = ActionSet::default();
    if selection.is_empty() || selection.iter().any(|d| d.item_type != ItemType::Object) {
        return actions;
    }

    match selection {
        [single] => {
            let class = single.main_class().unwrap_or_default();

            if schema.is_container_class(class) {
                actions.show(ObjectAction::NewUser);
                actions.show(ObjectAction::NewComputer);
                actions.show(ObjectAction::NewOu);
                actions.show(ObjectAction::NewGroup);
                actions.show(ObjectAction::Find);
            }

            if class.eq_ignore_ascii_case(CLASS_USER) {
                actions.show(ObjectAction::AddToGroup);
                actions.show(ObjectAction::ResetPassword);
                if single.flags.account_disabled {
                    actions.show(ObjectAction::Enable);
                } else {
                    actions.show(ObjectAction::Disable);
                }
            }

            if class.eq_ignore_ascii_case(CLASS_DOMAIN) {
                actions.show(ObjectAction::EditUpnSuffixes);
            }

            actions.show(ObjectAction::Move);
            actions.show(ObjectAction::Delete);
            actions.show(ObjectAction::Rename);
            actions.set_disabled(ObjectAction::Move, single.flags.cannot_move);
            actions.set_disabled(ObjectAction::Delete, single.flags.cannot_delete);
            actions.set_disabled(ObjectAction::Rename, single.flags.cannot_rename);
        }
        many => {
            let all_users = many
                .iter()
                .all(|d| d.main_class().is_some_and(|c| c.eq_ignore_ascii_case(CLASS_USER)));
            if all_users {
                actions.show(ObjectAction::AddToGroup);
                actions.show(ObjectAction::Enable);
                actions.show(ObjectAction::Disable);
            }
            actions.show(ObjectAction::Move);
            actions.show(ObjectAction::Delete);
        }
    }
    actions
}

impl<D: DirectoryService> Console<D> {
    pub fn actions_for(&self, items: &[ItemHandle]) -> ActionSet {
        let selection: Option<Vec<&ItemData>> =
            items.iter().map(|h| self.model.item_data(*h)).collect();
        selection.map_or_else(ActionSet::default, |selection| {
            visible_actions(&selection, &self.schema)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use adscope_directory::{Dn, ObjectRecord};
    use strum::IntoEnumIterator;

    fn object(dn: &str, classes: &[&str], extra: &[(&str, &str)]) -> ItemData {
        let mut record = ObjectRecord::new(Dn::parse(dn).unwrap())
            .with_values("objectClass", classes.iter().copied());
        for (attribute, value) in extra {
            record = record.with_values(attribute, [*value]);
        }
        ItemData::object(&record)
    }

    #[test]
    fn container_offers_creation() {
        let schema = SchemaConfig::default();
        let ou = object("OU=Sales,DC=x", &["top", "organizationalUnit"], &[]);
        let actions = visible_actions(&[&ou], &schema);

        assert!(actions.is_visible(ObjectAction::NewUser));
        assert!(actions.is_visible(ObjectAction::Find));
        assert!(!actions.is_visible(ObjectAction::ResetPassword));
        assert!(actions.is_enabled(ObjectAction::Rename));
    }

    #[test]
    fn disabled_user_offers_enable_only() {
        let schema = SchemaConfig::default();
        let ann = object(
            "CN=Ann,DC=x",
            &["top", "person", "user"],
            &[("userAccountControl", "514")],
        );
        let actions = visible_actions(&[&ann], &schema);

        assert!(actions.is_visible(ObjectAction::Enable));
        assert!(!actions.is_visible(ObjectAction::Disable));
        assert!(actions.is_visible(ObjectAction::AddToGroup));
    }

    #[test]
    fn policy_flags_disable_actions() {
        let schema = SchemaConfig::default();
        let system = object(
            "CN=System,DC=x",
            &["top", "container"],
            &[("systemFlags", "-1946157056")],
        );
        let actions = visible_actions(&[&system], &schema);

        assert!(actions.is_visible(ObjectAction::Move));
        assert!(!actions.is_enabled(ObjectAction::Move));
        assert!(!actions.is_enabled(ObjectAction::Delete));
        assert!(!actions.is_enabled(ObjectAction::Rename));
    }

    #[test]
    fn multiple_users_offer_both_toggles() {
        let schema = SchemaConfig::default();
        let ann = object("CN=Ann,DC=x", &["top", "user"], &[]);
        let bob = object("CN=Bob,DC=x", &["top", "user"], &[]);
        let ou = object("OU=Ops,DC=x", &["top", "organizationalUnit"], &[]);

        let users = visible_actions(&[&ann, &bob], &schema);
        assert!(users.is_visible(ObjectAction::Enable));
        assert!(users.is_visible(ObjectAction::Disable));
        assert!(!users.is_visible(ObjectAction::Rename));

        let mixed = visible_actions(&[&ann, &ou], &schema);
        let shown: Vec<ObjectAction> = mixed.visible().collect();
        assert_eq!(shown, vec![ObjectAction::Delete, ObjectAction::Move]);
    }

    #[test]
    fn non_objects_offer_nothing() {
        let schema = SchemaConfig::default();
        let folder = ItemData::query_folder("Saved Queries");
        assert!(visible_actions(&[&folder], &schema).is_empty());
        assert!(ObjectAction::iter().all(|a| !visible_actions(&[], &schema).is_visible(a)));
    }
}
