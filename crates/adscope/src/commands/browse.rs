//! Read-only browsing: tree, results, queries, actions.

use adscope_core::{FetchState, NodeHandle, ObjectAction, QueryDefinition};
use adscope_directory::Filter;
use indexmap::IndexMap;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{ActionsArgs, QueryArgs, ResultsArgs, TreeArgs};
use crate::error::CliError;
use crate::output;

use super::Session;

// ── Tree ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TreeLine {
    depth: usize,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dn: Option<String>,
    class: String,
    state: FetchState,
}

#[derive(Tabled)]
struct TreeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    class: String,
    #[tabled(rename = "State")]
    state: String,
}

pub fn tree(session: &mut Session, args: &TreeArgs) -> Result<(), CliError> {
    for dn in &args.expand {
        let node = session.reveal(dn)?;
        session.console.expand(node)?;
    }

    let lines = tree_lines(session);
    let rendered = output::render_list(
        session.format,
        &lines,
        |l| TreeRow {
            name: format!("{}{}", "  ".repeat(l.depth), l.name),
            class: l.class.clone(),
            state: l.state.to_string(),
        },
        |l| format!("{}{}", "  ".repeat(l.depth), l.name),
    )?;
    session.print(&rendered);
    session.flush_status();
    Ok(())
}

/// Pre-order walk of the scope tree.
fn tree_lines(session: &Session) -> Vec<TreeLine> {
    let console = &session.console;
    let model = console.model();
    let mut lines = Vec::new();
    let mut stack: Vec<(NodeHandle, usize)> =
        model.roots().iter().rev().map(|r| (*r, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let Some(scope) = model.scope_node(node) else {
            continue;
        };
        let data = scope.data();
        lines.push(TreeLine {
            depth,
            name: scope.text().to_owned(),
            dn: data.dn.as_ref().map(ToString::to_string),
            class: data
                .main_class()
                .map(|c| console.schema().class_display_name(c).to_owned())
                .unwrap_or_default(),
            state: scope.fetch_state(),
        });
        stack.extend(model.children(node).iter().rev().map(|c| (*c, depth + 1)));
    }
    lines
}

// ── Results ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ResultLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    dn: Option<String>,
    cells: IndexMap<String, String>,
}

pub fn results(session: &mut Session, args: &ResultsArgs) -> Result<(), CliError> {
    let node = match &args.dn {
        Some(dn) => session.reveal(dn)?,
        None => session.head()?.0,
    };
    session.console.select(node)?;
    print_rows(session, node, args.all_columns)
}

pub fn query(session: &mut Session, args: QueryArgs) -> Result<(), CliError> {
    let search_base = match args.base {
        Some(base) => base,
        None => session.head()?.1,
    };
    let definition = QueryDefinition {
        name: args.name,
        description: String::new(),
        filter: Filter::parse(&args.query_filter)?,
        search_base,
    };

    let root = session.console.query_root()?;
    let node = session.console.create_query_item(root, definition)?;
    session.console.select(node)?;
    print_rows(session, node, false)
}

fn print_rows(session: &mut Session, node: NodeHandle, all_columns: bool) -> Result<(), CliError> {
    let model = session.console.model();
    let view = model
        .scope_node(node)
        .and_then(|scope| model.results_view(scope.results()))
        .ok_or_else(|| CliError::Internal {
            message: "results view not registered".into(),
        })?;
    let shown: Vec<usize> = if all_columns {
        (0..view.columns.len()).collect()
    } else {
        view.default_columns.clone()
    };
    let headers: Vec<String> = shown
        .iter()
        .filter_map(|i| view.columns.get(*i).cloned())
        .collect();

    let mut lines: Vec<ResultLine> = model
        .results_of(node)
        .iter()
        .filter_map(|r| model.results_row(*r))
        .map(|row| ResultLine {
            dn: row.data().dn.as_ref().map(ToString::to_string),
            cells: shown
                .iter()
                .filter_map(|i| Some((view.columns.get(*i)?.clone(), row.cells().get(*i)?.clone())))
                .collect(),
        })
        .collect();
    lines.sort_by_cached_key(|l| l.cells.values().next().map(|v| v.to_lowercase()));

    let rendered = output::render_grid(
        session.format,
        &lines,
        &headers,
        |l| l.cells.values().cloned().collect(),
        |l| l.dn.clone().unwrap_or_default(),
    )?;
    session.print(&rendered);
    session.flush_status();
    Ok(())
}

// ── Actions ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ActionLine {
    action: ObjectAction,
    enabled: bool,
}

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

pub fn actions(session: &mut Session, args: &ActionsArgs) -> Result<(), CliError> {
    let items = session.locate_all(&args.dns)?;
    let set = session.console.actions_for(&items);
    let lines: Vec<ActionLine> = set
        .visible()
        .map(|action| ActionLine {
            action,
            enabled: set.is_enabled(action),
        })
        .collect();

    let rendered = output::render_list(
        session.format,
        &lines,
        |l| ActionRow {
            action: l.action.to_string(),
            enabled: if l.enabled { "yes" } else { "no" }.into(),
        },
        |l| l.action.to_string(),
    )?;
    session.print(&rendered);
    Ok(())
}
