//! Object edits: create, rename, delete.

use serde::Serialize;

use crate::cli::{CreateArgs, DeleteArgs, RenameArgs};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Serialize)]
struct Changed {
    dn: String,
}

fn print_changed(session: &Session, changed: &[Changed]) -> Result<(), CliError> {
    let rendered = output::render_grid(
        session.format,
        changed,
        &["Distinguished name".to_owned()],
        |c| vec![c.dn.clone()],
        |c| c.dn.clone(),
    )?;
    session.print(&rendered);
    Ok(())
}

pub fn create(session: &mut Session, args: &CreateArgs) -> Result<(), CliError> {
    // Loads the parent so the new object shows up under it.
    let parent = session.reveal(&args.parent)?;
    session.console.expand(parent)?;

    let created = session
        .console
        .create_object(args.kind, &args.name, &args.parent, &args.edits);
    session.flush_status();
    let dn = created?;
    if args.save {
        session.save()?;
    }
    print_changed(session, &[Changed { dn: dn.to_string() }])
}

pub fn rename(session: &mut Session, args: &RenameArgs) -> Result<(), CliError> {
    session.locate(&args.dn)?;

    let renamed = session.console.rename_object(&args.dn, &args.new_name);
    session.flush_status();
    let dn = renamed?;
    if args.save {
        session.save()?;
    }
    print_changed(session, &[Changed { dn: dn.to_string() }])
}

pub fn delete(session: &mut Session, args: &DeleteArgs) -> Result<(), CliError> {
    let items = session.locate_all(&args.dns)?;

    let deleted = session.console.delete_objects(&items);
    let failed = deleted.len() < items.len();
    session.flush_status();
    if args.save && !deleted.is_empty() {
        session.save()?;
    }

    let changed: Vec<Changed> = deleted
        .iter()
        .map(|dn| Changed { dn: dn.to_string() })
        .collect();
    print_changed(session, &changed)?;
    if failed {
        return Err(CliError::Rejected {
            message: format!("{} of {} deletions failed", items.len() - deleted.len(), items.len()),
        });
    }
    Ok(())
}
