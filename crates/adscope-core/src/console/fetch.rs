// ── Fetch / sync orchestration ──
//
// Lazy loading of scope nodes and the create/delete/move operations
// that keep both panes in step with the directory. Per node the fetch
// state runs Unfetched -> Fetching -> Fetched; a failed search puts the
// node back to Unfetched and reports once, with no retry.

use adscope_directory::record::ATTRIBUTE_SHOW_IN_ADVANCED_VIEW_ONLY;
use adscope_directory::{DirectoryError, DirectoryService, Dn, Filter, SearchResults, SearchScope};
use tracing::{debug, info};

use super::Console;
use super::item::{FetchState, ItemHandle, ItemKey, ItemType, NodeHandle, RowHandle};
use super::loader::{ObjectLoader, load_node};
use super::model::ConsoleModel;
use crate::error::CoreError;
use crate::status::StatusMessage;

/// Classes always fetched in dev mode.
const DEV_MODE_CLASSES: [&str; 3] = ["classSchema", "attributeSchema", "displaySpecifier"];

/// Whether objects may be inserted under `parent`: it must exist and
/// already be fetched. An unfetched parent picks new objects up on its
/// own fetch.
pub fn scope_and_results_add_check(model: &ConsoleModel, parent: Option<NodeHandle>) -> bool {
    parent.is_some_and(|p| model.item_was_fetched(p))
}

impl<D: DirectoryService> Console<D> {
    /// Create the domain head node, labelled `"{name} [{host}]"`.
    pub fn tree_init(&mut self) -> Result<NodeHandle, CoreError> {
        let head_dn = self
            .schema
            .roots
            .domain_head
            .clone()
            .ok_or_else(|| CoreError::Config {
                message: "no domain head configured".into(),
            })?;

        let attributes = self.schema.search_attributes();
        let record = {
            let _busy = self.status.busy();
            self.directory.search_object(&head_dn, &attributes)
        };
        let record = self.reported(record.map_err(CoreError::from))?;

        if let Some(old) = self.head.take() {
            self.model.delete_item(old.into());
        }
        let head = self
            .model
            .add_scope_node(None, self.objects_view, true)
            .ok_or_else(|| CoreError::Internal("cannot create tree head".into()))?;
        load_node(&mut self.model, head, &record);
        let text = format!("{} [{}]", head_dn.name(), self.directory.host());
        self.model.set_text(head, text);
        self.model.sort_scope();

        info!(head = %head_dn, host = self.directory.host(), "console initialized");
        self.head = Some(head);
        Ok(head)
    }

    pub fn expand(&mut self, node: NodeHandle) -> Result<(), CoreError> {
        self.fetch(node)
    }

    /// Make `node` the current scope and fetch it if needed.
    pub fn select(&mut self, node: NodeHandle) -> Result<(), CoreError> {
        if !self.model.is_valid(node.into()) {
            return Err(CoreError::StaleHandle);
        }
        self.current_scope = Some(node);
        self.fetch(node)
    }

    /// Activate a results row. A row with a scope buddy makes that buddy
    /// the current scope; other rows do nothing.
    pub fn activate(&mut self, row: RowHandle) -> Result<(), CoreError> {
        match self.model.get_buddy(row.into()) {
            Some(ItemHandle::Scope(node)) => self.select(node),
            _ if self.model.is_valid(row.into()) => Ok(()),
            _ => Err(CoreError::StaleHandle),
        }
    }

    /// Load `node`'s children if it has not been fetched. Fetching a node
    /// that is already fetched (or mid-fetch) does nothing.
    pub fn fetch(&mut self, node: NodeHandle) -> Result<(), CoreError> {
        let scope = self.model.scope_node(node).ok_or(CoreError::StaleHandle)?;
        if scope.fetch_state() != FetchState::Unfetched {
            return Ok(());
        }
        let data = scope.data().clone();

        self.model.mark_fetching(node);
        let result = match (data.item_type, data.dn, data.query) {
            (ItemType::Object, Some(dn), _) => self.fetch_object(node, &dn),
            (ItemType::QueryItem, _, Some(query)) => self.fetch_query(node, &query),
            _ => {
                self.model.mark_fetched(node);
                Ok(())
            }
        };

        if let Err(err) = &result {
            self.model.mark_unfetched(node);
            self.status.report_error(err);
        }
        result
    }

    /// Clear a dynamic node and fetch it again.
    pub fn refresh(&mut self, node: NodeHandle) -> Result<(), CoreError> {
        let scope = self.model.scope_node(node).ok_or(CoreError::StaleHandle)?;
        if !scope.is_dynamic() {
            return Ok(());
        }
        self.model.refresh_scope(node);
        self.fetch(node)
    }

    /// The filter every object fetch searches with.
    ///
    /// Containers are always included so the tree stays navigable.
    /// With advanced view off the filter is widened by objects not
    /// flagged advanced-only, and without a user filter that widening is
    /// the whole base; with advanced view on and no user filter every
    /// object matches.
    pub fn fetch_filter(&self) -> Filter {
        let base = match &self.user_filter {
            Some(filter) => Some(filter.clone()),
            None if self.settings.advanced_view => Some(Filter::everything()),
            None => None,
        };

        let mut operands: Vec<Filter> = base.into_iter().collect();
        operands.push(Filter::any_class(
            self.schema.container_classes.iter().map(String::as_str),
        ));
        if !self.settings.advanced_view {
            operands.push(Filter::not_equals(
                ATTRIBUTE_SHOW_IN_ADVANCED_VIEW_ONLY,
                "TRUE",
            ));
        }
        if self.settings.dev_mode {
            operands.push(Filter::any_class(DEV_MODE_CLASSES));
        }
        Filter::or(operands)
    }

    fn fetch_object(&mut self, node: NodeHandle, dn: &Dn) -> Result<(), CoreError> {
        let filter = self.fetch_filter();
        let attributes = self.schema.search_attributes();
        let results = {
            let _busy = self.status.busy();
            let mut results =
                self.directory
                    .search(&filter, &attributes, SearchScope::Children, dn)?;
            if self.settings.dev_mode {
                self.add_dev_mode_lookups(dn, &attributes, &mut results)?;
            }
            results
        };

        self.model.mark_fetched(node);
        let loader = ObjectLoader::new(&self.schema, self.settings, self.objects_view);
        let added = loader.insert(&mut self.model, node, results.values());
        self.model.sort_scope();

        debug!(%dn, found = results.len(), added, "fetched children");
        Ok(())
    }

    /// Configuration and schema partitions are invisible to searches
    /// rooted above them, so dev mode looks them up directly.
    fn add_dev_mode_lookups(
        &mut self,
        dn: &Dn,
        attributes: &[String],
        results: &mut SearchResults,
    ) -> Result<(), CoreError> {
        let roots = &self.schema.roots;
        let configuration = roots.configuration_dn();
        let extra = if roots.domain_head.as_ref() == Some(dn) {
            configuration
        } else if configuration.as_ref() == Some(dn) {
            roots.schema_dn()
        } else {
            None
        };
        let Some(extra) = extra else {
            return Ok(());
        };

        match self.directory.search_object(&extra, attributes) {
            Ok(record) => {
                results.insert(extra, record);
                Ok(())
            }
            Err(DirectoryError::NoSuchObject { .. }) => {
                debug!(%extra, "dev mode root not present");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    // ── Object create / delete / move ────────────────────────────────

    /// Look up each DN and insert it under `parent`. Does nothing unless
    /// `parent` passes `scope_and_results_add_check`.
    pub fn object_create(&mut self, dns: &[Dn], parent: Option<NodeHandle>) -> Result<(), CoreError> {
        let Some(parent) = parent.filter(|p| scope_and_results_add_check(&self.model, Some(*p)))
        else {
            debug!(count = dns.len(), "skipping create under unfetched parent");
            return Ok(());
        };

        let attributes = self.schema.search_attributes();
        let records = {
            let _busy = self.status.busy();
            dns.iter()
                .map(|dn| self.directory.search_object(dn, &attributes))
                .collect::<Result<Vec<_>, _>>()?
        };

        let loader = ObjectLoader::new(&self.schema, self.settings, self.objects_view);
        loader.insert(&mut self.model, parent, records.iter());
        Ok(())
    }

    /// Remove every node and row for each DN, found by searching both
    /// panes now. Rows listed under a query item are left stale when
    /// `ignore_query_tree_rows` is set.
    pub fn object_delete(&mut self, dns: &[Dn], ignore_query_tree_rows: bool) {
        for dn in dns {
            let value = dn.to_string();

            let nodes =
                self.model
                    .search_scope_by_attribute(ItemKey::Dn, &value, Some(ItemType::Object));
            for node in nodes {
                self.model.delete_item(node.into());
            }

            let rows =
                self.model
                    .search_results_by_attribute(ItemKey::Dn, &value, Some(ItemType::Object));
            for row in rows {
                let in_query_tree = self
                    .model
                    .scope_parent(row)
                    .and_then(|p| self.model.scope_node(p))
                    .is_some_and(|p| p.data().item_type == ItemType::QueryItem);
                if in_query_tree && ignore_query_tree_rows {
                    continue;
                }
                self.model.delete_item(row.into());
            }
        }
    }

    /// Relocate already-moved objects in the console: insert them under
    /// the new parent first, then remove the old items.
    pub fn object_move(&mut self, old_dns: &[Dn], new_parent_dn: &Dn) -> Result<(), CoreError> {
        let new_dns: Vec<Dn> = old_dns
            .iter()
            .map(|dn| dn.moved_under(new_parent_dn))
            .collect();
        self.object_move_to(old_dns, &new_dns, new_parent_dn)
    }

    fn object_move_to(
        &mut self,
        old_dns: &[Dn],
        new_dns: &[Dn],
        new_parent_dn: &Dn,
    ) -> Result<(), CoreError> {
        let new_parent = self.node_for_dn(new_parent_dn);
        let created = self.object_create(new_dns, new_parent);
        self.object_delete(old_dns, true);
        self.model.sort_scope();
        created
    }

    /// The single object node for `dn`, if exactly one exists.
    pub fn node_for_dn(&self, dn: &Dn) -> Option<NodeHandle> {
        match self
            .model
            .search_scope_by_attribute(ItemKey::Dn, dn.as_str(), Some(ItemType::Object))
            .as_slice()
        {
            [node] => Some(*node),
            _ => None,
        }
    }

    /// Rename in the directory, then move the console items to the new DN.
    pub fn rename_object(&mut self, dn: &Dn, new_name: &str) -> Result<Dn, CoreError> {
        let renamed = {
            let _busy = self.status.busy();
            self.directory.rename_object(dn, new_name)
        };
        let new_dn = self.reported(renamed.map_err(CoreError::from))?;

        if let Some(parent) = new_dn.parent() {
            let moved = self.object_move_to(&[dn.clone()], &[new_dn.clone()], &parent);
            self.reported(moved)?;
        }
        self.status.add_message(StatusMessage::success(format!(
            "Renamed \"{}\" to \"{new_name}\"",
            dn.name()
        )));
        Ok(new_dn)
    }

    /// Delete the objects behind `items` from the directory and the
    /// console. Query results are only pruned when the selection itself
    /// came from a query's results. Reports one status message.
    pub fn delete_objects(&mut self, items: &[ItemHandle]) -> Vec<Dn> {
        let from_query_results = items.iter().any(|item| match item {
            ItemHandle::Results(row) => self
                .model
                .scope_parent(*row)
                .and_then(|p| self.model.scope_node(p))
                .is_some_and(|p| p.data().item_type == ItemType::QueryItem),
            ItemHandle::Scope(_) => false,
        });
        let targets: Vec<Dn> = items
            .iter()
            .filter_map(|item| self.model.item_data(*item))
            .filter(|data| data.item_type == ItemType::Object)
            .filter_map(|data| data.dn.clone())
            .collect();

        let mut deleted = Vec::new();
        let mut errors = Vec::new();
        {
            let _busy = self.status.busy();
            for dn in &targets {
                match self.directory.delete_object(dn) {
                    Ok(()) => deleted.push(dn.clone()),
                    Err(err) => errors.push(CoreError::from(err)),
                }
            }
        }

        self.object_delete(&deleted, !from_query_results);

        let message = match (deleted.as_slice(), errors.first()) {
            (_, Some(first)) => StatusMessage::error(format!(
                "Failed to delete {} of {}: {first}",
                errors.len(),
                count_objects(targets.len())
            )),
            ([single], None) => StatusMessage::success(format!("Deleted \"{}\"", single.name())),
            (many, None) => StatusMessage::success(format!("Deleted {}", count_objects(many.len()))),
        };
        if !targets.is_empty() {
            self.status.add_message(message);
        }
        deleted
    }

    /// Report an error on the status channel and pass the result through.
    pub(crate) fn reported<T>(&mut self, result: Result<T, CoreError>) -> Result<T, CoreError> {
        if let Err(err) = &result {
            self.status.report_error(err);
        }
        result
    }
}

pub(crate) fn count_objects(n: usize) -> String {
    if n == 1 {
        "1 object".into()
    } else {
        format!("{n} objects")
    }
}
