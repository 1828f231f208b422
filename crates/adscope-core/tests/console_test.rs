// Integration tests for `Console` against an in-memory directory.

#![allow(clippy::unwrap_used)]

use adscope_core::{
    AttributeEdit, Console, ConsoleModel, ConsoleSettings, DropType, FetchState, ItemHandle, ModelEvent,
    NodeHandle, ObjectKind, QueryDefinition, RowHandle, SchemaConfig, StatusKind, WellKnownRoots,
};
use adscope_directory::{
    DirectoryError, DirectoryService, Dn, Filter, MemoryDirectory, ObjectRecord, SearchResults,
    SearchScope,
};
use pretty_assertions::assert_eq;

// ── Helpers ─────────────────────────────────────────────────────────

const HEAD: &str = "DC=example,DC=com";

fn dn(raw: &str) -> Dn {
    Dn::parse(raw).unwrap()
}

fn object(raw: &str, classes: &[&str]) -> ObjectRecord {
    ObjectRecord::new(dn(raw)).with_values("objectClass", classes.iter().copied())
}

fn directory() -> MemoryDirectory {
    let mut dir = MemoryDirectory::new("dc1.example.com");
    let records = [
        object(HEAD, &["top", "domain", "domainDNS"]),
        object("OU=Sales,DC=example,DC=com", &["top", "organizationalUnit"]),
        object("OU=Ops,DC=example,DC=com", &["top", "organizationalUnit"]),
        object("CN=Users,DC=example,DC=com", &["top", "container"]),
        object("CN=Staff,DC=example,DC=com", &["top", "group"]).with_values("groupType", ["-2147483646"]),
        object("CN=Printer,DC=example,DC=com", &["top", "contact"])
            .with_values("showInAdvancedViewOnly", ["TRUE"]),
        object("CN=Ann,OU=Sales,DC=example,DC=com", &["top", "person", "user"]),
        object("CN=Bob,OU=Sales,DC=example,DC=com", &["top", "person", "user"]),
        object("CN=Configuration,DC=example,DC=com", &["top", "configuration"]),
        object("CN=Schema,CN=Configuration,DC=example,DC=com", &["top", "dMD"]),
    ];
    for record in records {
        dir.insert(record).unwrap();
    }
    dir.add_partition(dn("CN=Configuration,DC=example,DC=com"));
    dir.add_partition(dn("CN=Schema,CN=Configuration,DC=example,DC=com"));
    dir
}

fn console_with(settings: ConsoleSettings) -> Console<MemoryDirectory> {
    let mut schema = SchemaConfig::default();
    schema.roots = WellKnownRoots::for_domain(dn(HEAD));
    Console::new(directory(), settings, schema)
}

fn console() -> Console<MemoryDirectory> {
    console_with(ConsoleSettings::default())
}

fn expanded_head(console: &mut Console<MemoryDirectory>) -> NodeHandle {
    let head = console.tree_init().unwrap();
    console.expand(head).unwrap();
    head
}

fn child_texts(console: &Console<MemoryDirectory>, node: NodeHandle) -> Vec<String> {
    let model = console.model();
    model
        .children(node)
        .iter()
        .map(|c| model.scope_node(*c).unwrap().text().to_owned())
        .collect()
}

fn row_names(console: &Console<MemoryDirectory>, node: NodeHandle) -> Vec<String> {
    let model = console.model();
    let mut names: Vec<String> = model
        .results_of(node)
        .iter()
        .map(|r| model.results_row(*r).unwrap().data().name.clone())
        .collect();
    names.sort();
    names
}

fn child_named(console: &Console<MemoryDirectory>, parent: NodeHandle, name: &str) -> NodeHandle {
    child_named_in(console.model(), parent, name)
}

fn child_named_in(model: &ConsoleModel, parent: NodeHandle, name: &str) -> NodeHandle {
    *model
        .children(parent)
        .iter()
        .find(|c| model.scope_node(**c).unwrap().text() == name)
        .unwrap()
}

fn row_named(console: &Console<MemoryDirectory>, parent: NodeHandle, name: &str) -> RowHandle {
    let model = console.model();
    *model
        .results_of(parent)
        .iter()
        .find(|r| model.results_row(**r).unwrap().data().name == name)
        .unwrap()
}

fn error_count(console: &Console<MemoryDirectory>) -> usize {
    console
        .status()
        .messages()
        .iter()
        .filter(|m| m.kind == StatusKind::Error)
        .count()
}

// ── Tree init and fetch ─────────────────────────────────────────────

#[test]
fn tree_init_labels_head_with_host() {
    let mut console = console();
    let head = console.tree_init().unwrap();
    let node = console.model().scope_node(head).unwrap();

    assert_eq!(node.text(), "example [dc1.example.com]");
    assert_eq!(node.fetch_state(), FetchState::Unfetched);
    assert_eq!(console.head(), Some(head));
}

#[test]
fn tree_init_without_domain_head_is_config_error() {
    let mut console = Console::new(
        directory(),
        ConsoleSettings::default(),
        SchemaConfig::default(),
    );
    let err = console.tree_init().unwrap_err();
    assert!(matches!(err, adscope_core::CoreError::Config { .. }));
}

#[test]
fn expand_puts_containers_in_scope_and_everything_in_results() {
    let mut console = console();
    let head = expanded_head(&mut console);

    assert_eq!(child_texts(&console, head), vec!["Ops", "Sales", "Users"]);
    assert_eq!(row_names(&console, head), vec!["Ops", "Sales", "Staff", "Users"]);

    let sales = child_named(&console, head, "Sales");
    let row = row_named(&console, head, "Sales");
    assert_eq!(
        console.model().get_buddy(sales.into()),
        Some(ItemHandle::Results(row))
    );
    assert_eq!(
        console.model().get_buddy(ItemHandle::Results(row_named(&console, head, "Staff"))),
        None
    );
}

#[test]
fn repeated_fetch_and_refresh_do_not_duplicate() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let before = (console.model().scope_len(), console.model().results_len());
    let old_sales = child_named(&console, head, "Sales");

    console.expand(head).unwrap();
    console.select(head).unwrap();
    assert_eq!(
        (console.model().scope_len(), console.model().results_len()),
        before
    );

    console.refresh(head).unwrap();
    assert_eq!(
        (console.model().scope_len(), console.model().results_len()),
        before
    );
    assert!(!console.model().is_valid(old_sales.into()));
    assert_eq!(console.model().buddy_len(), 3);
}

#[test]
fn advanced_only_objects_need_advanced_view() {
    let mut console = console();
    let head = expanded_head(&mut console);
    assert!(!row_names(&console, head).contains(&"Printer".to_owned()));

    let mut console = console_with(ConsoleSettings {
        advanced_view: true,
        ..ConsoleSettings::default()
    });
    let head = expanded_head(&mut console);
    assert!(row_names(&console, head).contains(&"Printer".to_owned()));
}

#[test]
fn show_non_containers_adds_leaves_to_scope() {
    let mut console = console_with(ConsoleSettings {
        show_non_containers: true,
        ..ConsoleSettings::default()
    });
    let head = expanded_head(&mut console);
    assert_eq!(
        child_texts(&console, head),
        vec!["Ops", "Sales", "Staff", "Users"]
    );
}

#[test]
fn dev_mode_adds_configuration_and_schema_roots() {
    let mut console = console();
    let head = expanded_head(&mut console);
    assert!(!child_texts(&console, head).contains(&"Configuration".to_owned()));

    let mut console = console_with(ConsoleSettings {
        dev_mode: true,
        ..ConsoleSettings::default()
    });
    let head = expanded_head(&mut console);
    let configuration = child_named(&console, head, "Configuration");

    console.expand(configuration).unwrap();
    assert_eq!(child_texts(&console, configuration), vec!["Schema"]);
}

#[test]
fn failed_fetch_leaves_node_unfetched_and_reports_once() {
    let mut console = console();
    let head = console.tree_init().unwrap();
    console.directory_mut().set_offline(true);

    let err = console.expand(head).unwrap_err();
    assert!(err.is_connection());
    assert_eq!(
        console.model().fetch_state(head),
        Some(FetchState::Unfetched)
    );
    assert_eq!(error_count(&console), 1);

    console.directory_mut().set_offline(false);
    console.expand(head).unwrap();
    assert_eq!(console.model().fetch_state(head), Some(FetchState::Fetched));
}

#[test]
fn user_filter_never_hides_containers() {
    let mut console = console_with(ConsoleSettings {
        advanced_view: true,
        ..ConsoleSettings::default()
    });
    console.set_user_filter(Some(Filter::parse("(objectClass=user)").unwrap()));
    let head = expanded_head(&mut console);

    assert_eq!(row_names(&console, head), vec!["Ops", "Sales", "Users"]);
    assert_eq!(child_texts(&console, head), vec!["Ops", "Sales", "Users"]);
}

#[test]
fn user_filter_is_widened_by_non_advanced_objects() {
    let mut console = console();
    console.set_user_filter(Some(Filter::parse("(objectClass=user)").unwrap()));
    let head = expanded_head(&mut console);

    let rows = row_names(&console, head);
    assert!(rows.contains(&"Staff".to_owned()), "{rows:?}");
    assert!(!rows.contains(&"Printer".to_owned()), "{rows:?}");
}

// ── Activation ──────────────────────────────────────────────────────

#[test]
fn activating_a_row_selects_and_fetches_its_buddy() {
    let mut console = console();
    let head = expanded_head(&mut console);
    console.select(head).unwrap();
    let sales = child_named(&console, head, "Sales");
    assert_eq!(
        console.model().fetch_state(sales),
        Some(FetchState::Unfetched)
    );

    console.activate(row_named(&console, head, "Sales")).unwrap();

    assert_eq!(console.current_scope(), Some(sales));
    assert_eq!(console.model().fetch_state(sales), Some(FetchState::Fetched));
    assert_eq!(console.current_results_count(), 2);
    assert_eq!(console.current_description().as_deref(), Some("2 objects"));
}

#[test]
fn activating_a_row_without_buddy_keeps_scope() {
    let mut console = console();
    let head = expanded_head(&mut console);
    console.select(head).unwrap();
    assert_eq!(console.current_results_count(), 4);

    console.activate(row_named(&console, head, "Staff")).unwrap();
    assert_eq!(console.current_scope(), Some(head));
}

#[test]
fn results_count_is_zero_without_a_scope() {
    let mut console = console();
    expanded_head(&mut console);
    assert_eq!(console.current_results_count(), 0);
    assert_eq!(console.current_description(), None);
}

// ── Create / delete / move ──────────────────────────────────────────

#[test]
fn create_under_unfetched_parent_is_deferred_to_fetch() {
    let mut console = console();
    let head = console.tree_init().unwrap();
    let new_ou = dn("OU=Labs,DC=example,DC=com");
    console
        .directory_mut()
        .add_object(&new_ou, &["top", "organizationalUnit"])
        .unwrap();

    console.object_create(&[new_ou], Some(head)).unwrap();
    assert!(console.model().children(head).is_empty());

    console.expand(head).unwrap();
    assert_eq!(
        child_texts(&console, head),
        vec!["Labs", "Ops", "Sales", "Users"]
    );
}

#[test]
fn move_creates_before_deleting() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    let ops = child_named(&console, head, "Ops");
    console.expand(sales).unwrap();
    console.expand(ops).unwrap();

    let ann = dn("CN=Ann,OU=Sales,DC=example,DC=com");
    let ops_dn = dn("OU=Ops,DC=example,DC=com");
    console.directory_mut().move_object(&ann, &ops_dn).unwrap();

    let mut events = console.model().subscribe_events();
    console.object_move(std::slice::from_ref(&ann), &ops_dn).unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    let added = seen
        .iter()
        .position(|e| matches!(e, ModelEvent::ItemAdded { .. }))
        .unwrap();
    let removed = seen
        .iter()
        .position(|e| matches!(e, ModelEvent::ItemRemoved { dn: Some(d), .. } if *d == ann))
        .unwrap();
    assert!(added < removed);

    assert_eq!(row_names(&console, sales), vec!["Bob"]);
    assert_eq!(row_names(&console, ops), vec!["Ann"]);
}

#[test]
fn create_object_adds_row_under_loaded_parent() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    console.expand(sales).unwrap();

    let sales_dn = dn("OU=Sales,DC=example,DC=com");
    let created = console
        .create_object(
            ObjectKind::User,
            "Carl",
            &sales_dn,
            &[AttributeEdit::new("description", ["Field rep"])],
        )
        .unwrap();

    assert_eq!(created.as_str(), "CN=Carl,OU=Sales,DC=example,DC=com");
    assert_eq!(row_names(&console, sales), vec!["Ann", "Bob", "Carl"]);
    let last = console.status().messages().last().unwrap();
    assert_eq!(last.text, "Created User - \"Carl\"");
}

#[test]
fn failed_create_leaves_nothing_behind() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    console.expand(sales).unwrap();
    console.directory_mut().reject_attribute("description");

    let sales_dn = dn("OU=Sales,DC=example,DC=com");
    let result = console.create_object(
        ObjectKind::User,
        "Carl",
        &sales_dn,
        &[AttributeEdit::new("description", ["Field rep"])],
    );

    assert!(result.is_err());
    assert!(
        console
            .directory()
            .get(&dn("CN=Carl,OU=Sales,DC=example,DC=com"))
            .is_none()
    );
    assert_eq!(row_names(&console, sales), vec!["Ann", "Bob"]);
    assert_eq!(error_count(&console), 1);
    let last = console.status().messages().last().unwrap();
    assert!(
        last.text.starts_with("Failed to create User - \"Carl\": Operation rejected"),
        "{}",
        last.text
    );
}

/// Memory directory whose single-object lookups can be made to fail.
struct FlakyLookup {
    inner: MemoryDirectory,
    fail_lookups: bool,
}

impl DirectoryService for FlakyLookup {
    fn host(&self) -> &str {
        self.inner.host()
    }

    fn search(
        &mut self,
        filter: &Filter,
        attributes: &[String],
        scope: SearchScope,
        base: &Dn,
    ) -> Result<SearchResults, DirectoryError> {
        self.inner.search(filter, attributes, scope, base)
    }

    fn search_object(
        &mut self,
        dn: &Dn,
        attributes: &[String],
    ) -> Result<ObjectRecord, DirectoryError> {
        if self.fail_lookups {
            return Err(DirectoryError::NoSuchObject { dn: dn.to_string() });
        }
        self.inner.search_object(dn, attributes)
    }

    fn move_object(&mut self, dn: &Dn, new_parent: &Dn) -> Result<Dn, DirectoryError> {
        self.inner.move_object(dn, new_parent)
    }

    fn rename_object(&mut self, dn: &Dn, new_name: &str) -> Result<Dn, DirectoryError> {
        self.inner.rename_object(dn, new_name)
    }

    fn delete_object(&mut self, dn: &Dn) -> Result<(), DirectoryError> {
        self.inner.delete_object(dn)
    }

    fn add_object(&mut self, dn: &Dn, object_classes: &[&str]) -> Result<(), DirectoryError> {
        self.inner.add_object(dn, object_classes)
    }

    fn replace_attribute(
        &mut self,
        dn: &Dn,
        attribute: &str,
        values: &[String],
    ) -> Result<(), DirectoryError> {
        self.inner.replace_attribute(dn, attribute, values)
    }

    fn add_member(&mut self, group: &Dn, member: &Dn) -> Result<(), DirectoryError> {
        self.inner.add_member(group, member)
    }
}

#[test]
fn create_that_cannot_be_loaded_never_reports_success() {
    let mut schema = SchemaConfig::default();
    schema.roots = WellKnownRoots::for_domain(dn(HEAD));
    let flaky = FlakyLookup {
        inner: directory(),
        fail_lookups: false,
    };
    let mut console = Console::new(flaky, ConsoleSettings::default(), schema);
    let head = console.tree_init().unwrap();
    console.expand(head).unwrap();
    let sales = child_named_in(console.model(), head, "Sales");
    console.expand(sales).unwrap();
    console.directory_mut().fail_lookups = true;

    let sales_dn = dn("OU=Sales,DC=example,DC=com");
    let result = console.create_object(ObjectKind::User, "Carl", &sales_dn, &[]);

    assert!(result.is_err());
    let messages = console.status().messages();
    assert!(messages.iter().all(|m| m.kind == StatusKind::Error));
    assert!(
        messages
            .last()
            .unwrap()
            .text
            .starts_with("Created User - \"Carl\" but failed to load it")
    );
}

#[test]
fn rename_moves_console_items_to_new_dn() {
    let mut console = console();
    let head = expanded_head(&mut console);

    let new_dn = console
        .rename_object(&dn("OU=Ops,DC=example,DC=com"), "Operations")
        .unwrap();

    assert_eq!(new_dn.as_str(), "OU=Operations,DC=example,DC=com");
    assert_eq!(
        child_texts(&console, head),
        vec!["Operations", "Sales", "Users"]
    );
    let node = child_named(&console, head, "Operations");
    assert!(console.model().get_buddy(node.into()).is_some());
}

#[test]
fn deleting_a_node_removes_its_buddy_row() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let ops = child_named(&console, head, "Ops");

    let deleted = console.delete_objects(&[ops.into()]);

    assert_eq!(deleted, vec![dn("OU=Ops,DC=example,DC=com")]);
    assert_eq!(child_texts(&console, head), vec!["Sales", "Users"]);
    assert!(!row_names(&console, head).contains(&"Ops".to_owned()));
    assert_eq!(
        console.status().messages().last().unwrap().text,
        "Deleted \"Ops\""
    );
}

#[test]
fn deleting_a_non_leaf_reports_failure() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");

    let deleted = console.delete_objects(&[sales.into()]);

    assert!(deleted.is_empty());
    assert!(console.model().is_valid(sales.into()));
    assert_eq!(error_count(&console), 1);
}

// ── Drag and drop ───────────────────────────────────────────────────

#[test]
fn drop_user_on_group_adds_member() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    console.expand(sales).unwrap();

    let ann = ItemHandle::Results(row_named(&console, sales, "Ann"));
    let staff = ItemHandle::Results(row_named(&console, head, "Staff"));
    assert_eq!(console.classify_drop(ann, staff), DropType::AddToGroup);
    assert!(console.can_drop(&[ann], staff));

    let summary = console.drop_items(&[ann], staff).unwrap();

    assert_eq!(summary.added_to_group, 1);
    let group = console
        .directory()
        .get(&dn("CN=Staff,DC=example,DC=com"))
        .unwrap();
    assert_eq!(
        group.values("member"),
        ["CN=Ann,OU=Sales,DC=example,DC=com".to_owned()]
    );
    assert_eq!(row_names(&console, sales), vec!["Ann", "Bob"]);
}

#[test]
fn drop_ou_on_ou_moves_subtree() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    let ops = child_named(&console, head, "Ops");
    console.expand(ops).unwrap();

    let summary = console.drop_items(&[sales.into()], ops.into()).unwrap();

    assert_eq!(summary.moved, 1);
    assert_eq!(child_texts(&console, head), vec!["Ops", "Users"]);
    assert_eq!(child_texts(&console, ops), vec!["Sales"]);
    assert!(
        console
            .directory()
            .get(&dn("CN=Ann,OU=Sales,OU=Ops,DC=example,DC=com"))
            .is_some()
    );
    assert_eq!(
        console.status().messages().last().unwrap().text,
        "Moved 1 object to \"Ops\""
    );
}

#[test]
fn mixed_drop_skips_what_does_not_apply() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    console.expand(sales).unwrap();

    let ann = ItemHandle::Results(row_named(&console, sales, "Ann"));
    let bob = ItemHandle::Results(row_named(&console, sales, "Bob"));
    assert_eq!(console.classify_drop(ann, bob), DropType::None);
    assert!(!console.can_drop(&[ann], bob));
    assert!(console.can_drop(&[ann, bob], bob));

    let summary = console.drop_items(&[ann, bob], bob).unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(row_names(&console, sales), vec!["Ann", "Bob"]);
}

#[test]
fn partly_failed_drop_reports_what_succeeded() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    let ops = child_named(&console, head, "Ops");
    console.expand(sales).unwrap();
    console.expand(ops).unwrap();
    let ann = ItemHandle::Results(row_named(&console, sales, "Ann"));

    let summary = console.drop_items(&[sales.into(), ann], ops.into()).unwrap();

    assert_eq!((summary.moved, summary.failed), (1, 1));
    let last = console.status().messages().last().unwrap();
    assert_eq!(last.kind, StatusKind::Error);
    assert!(
        last.text.starts_with("Failed to drop 1 object onto \"Ops\""),
        "{}",
        last.text
    );
    assert!(last.text.ends_with("Moved 1 object to \"Ops\""), "{}", last.text);
}

// ── Saved queries ───────────────────────────────────────────────────

fn users_query(console: &mut Console<MemoryDirectory>) -> NodeHandle {
    let root = console.query_root().unwrap();
    let query = console
        .create_query_item(
            root,
            QueryDefinition {
                name: "All users".into(),
                description: "Every user account".into(),
                filter: Filter::parse("(objectClass=user)").unwrap(),
                search_base: dn(HEAD),
            },
        )
        .unwrap();
    console.select(query).unwrap();
    query
}

#[test]
fn query_item_lists_subtree_matches() {
    let mut console = console();
    expanded_head(&mut console);
    let query = users_query(&mut console);

    assert_eq!(row_names(&console, query), vec!["Ann", "Bob"]);
    assert!(console.model().children(query).is_empty());
    assert_eq!(console.saved_queries().len(), 1);
}

#[test]
fn query_rows_go_stale_on_indirect_delete() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    console.expand(sales).unwrap();
    let query = users_query(&mut console);

    let ann = row_named(&console, sales, "Ann");
    console.delete_objects(&[ann.into()]);

    assert_eq!(row_names(&console, sales), vec!["Bob"]);
    assert_eq!(row_names(&console, query), vec!["Ann", "Bob"]);
}

#[test]
fn query_rows_removed_on_direct_delete() {
    let mut console = console();
    let head = expanded_head(&mut console);
    let sales = child_named(&console, head, "Sales");
    console.expand(sales).unwrap();
    let query = users_query(&mut console);

    let bob = row_named(&console, query, "Bob");
    console.delete_objects(&[bob.into()]);

    assert_eq!(row_names(&console, query), vec!["Ann"]);
    assert_eq!(row_names(&console, sales), vec!["Ann"]);
}

#[test]
fn query_names_are_validated() {
    let mut console = console();
    let root = console.query_root().unwrap();
    console.create_query_folder(root, "Audits", "").unwrap();

    let duplicate = console.create_query_folder(root, "Audits", "");
    let slashed = console.create_query_folder(root, "a/b", "");
    assert!(duplicate.is_err());
    assert!(slashed.is_err());
}
