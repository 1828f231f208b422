//! Drag-and-drop handlers.

use adscope_core::{DropSummary, DropType};
use serde::Serialize;

use crate::cli::{ClassifyArgs, DropArgs};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Serialize)]
struct Classification {
    dragged: String,
    target: String,
    drop_type: DropType,
    droppable: bool,
}

pub fn classify(session: &mut Session, args: &ClassifyArgs) -> Result<(), CliError> {
    let dragged = session.locate(&args.dn)?;
    let target = session.locate(&args.onto)?;

    let result = Classification {
        dragged: args.dn.to_string(),
        target: args.onto.to_string(),
        drop_type: session.console.classify_drop(dragged, target),
        droppable: session.console.can_drop(&[dragged], target),
    };
    let rendered = output::render_single(
        session.format,
        &result,
        |c| format!("{} onto {}: {}", c.dragged, c.target, c.drop_type),
        |c| c.drop_type.to_string(),
    )?;
    session.print(&rendered);
    Ok(())
}

pub fn drop(session: &mut Session, args: &DropArgs) -> Result<(), CliError> {
    let dragged = session.locate_all(&args.dns)?;
    let target = session.locate(&args.onto)?;

    if !session.console.can_drop(&dragged, target) {
        return Err(CliError::Validation {
            field: "--onto".into(),
            reason: format!("nothing can be dropped onto {}", args.onto),
        });
    }

    let summary = session.console.drop_items(&dragged, target)?;
    session.flush_status();
    if args.save {
        session.save()?;
    }

    let rendered = output::render_single(
        session.format,
        &summary,
        describe,
        |s| format!("{} {} {} {}", s.moved, s.added_to_group, s.skipped, s.failed),
    )?;
    session.print(&rendered);
    Ok(())
}

fn describe(summary: &DropSummary) -> String {
    format!(
        "moved: {}  added to group: {}  skipped: {}  failed: {}",
        summary.moved, summary.added_to_group, summary.skipped, summary.failed
    )
}
