//! Command dispatch: bridges CLI args -> console operations -> output formatting.

pub mod browse;
pub mod config_cmd;
pub mod drop;
pub mod edit;

use std::path::PathBuf;

use adscope_config::Config;
use adscope_core::{Console, ItemHandle, NodeHandle};
use adscope_directory::{Dn, Filter, MemoryDirectory};
use clap::ValueEnum;
use tracing::debug;

use crate::cli::{ColorMode, Command, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Dispatch a directory-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session = Session::open(global)?;
    match cmd {
        Command::Tree(args) => browse::tree(&mut session, &args),
        Command::Results(args) => browse::results(&mut session, &args),
        Command::Query(args) => browse::query(&mut session, args),
        Command::Actions(args) => browse::actions(&mut session, &args),
        Command::Classify(args) => drop::classify(&mut session, &args),
        Command::Drop(args) => drop::drop(&mut session, &args),
        Command::Create(args) => edit::create(&mut session, &args),
        Command::Rename(args) => edit::rename(&mut session, &args),
        Command::Delete(args) => edit::delete(&mut session, &args),
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal {
            message: "command does not use a directory".into(),
        }),
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// A console opened over a snapshot, with the head already expanded.
pub struct Session {
    pub console: Console<MemoryDirectory>,
    snapshot: PathBuf,
    pub format: OutputFormat,
    color: bool,
    pub quiet: bool,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::load(global)?;
        let snapshot = global
            .directory
            .clone()
            .or_else(|| cfg.directory.clone())
            .ok_or_else(|| CliError::NoDirectory {
                config_path: config::path(global).display().to_string(),
            })?;
        let directory = MemoryDirectory::load(&snapshot).map_err(|e| CliError::Snapshot {
            message: e.to_string(),
        })?;

        let mut settings = cfg.console_settings();
        settings.advanced_view |= global.advanced;
        settings.dev_mode |= global.dev_mode;
        settings.show_non_containers |= global.show_non_containers;

        let mut schema = cfg.schema_config();
        if schema.roots.domain_head.is_none() {
            schema.roots.domain_head = directory.domain_head();
        }

        let mut console = Console::new(directory, settings, schema);
        if let Some(raw) = &global.filter {
            console.set_user_filter(Some(Filter::parse(raw)?));
        }
        let head = console.tree_init()?;
        console.expand(head)?;
        debug!(snapshot = %snapshot.display(), ?settings, "session opened");

        Ok(Self {
            console,
            snapshot,
            format: resolve_format(global, &cfg),
            color: output::should_color(resolve_color(global, &cfg)),
            quiet: global.quiet,
        })
    }

    fn head(&self) -> Result<(NodeHandle, Dn), CliError> {
        let head = self.console.head().ok_or_else(|| CliError::Internal {
            message: "console has no domain head".into(),
        })?;
        let dn = self
            .console
            .schema()
            .roots
            .domain_head
            .clone()
            .ok_or_else(|| CliError::Internal {
                message: "no domain head configured".into(),
            })?;
        Ok((head, dn))
    }

    /// Expand every container from the head down to `dn` and return the
    /// node or row that shows it.
    pub fn locate(&mut self, dn: &Dn) -> Result<ItemHandle, CliError> {
        let (head, head_dn) = self.head()?;
        if *dn == head_dn {
            return Ok(head.into());
        }
        let not_found = || CliError::NotFound { dn: dn.to_string() };
        if !dn.is_descendant_of(&head_dn) {
            return Err(not_found());
        }

        let parent_dn = dn.parent().ok_or_else(not_found)?;
        let parent = self.reveal(&parent_dn)?;
        self.console.expand(parent)?;

        if let Some(node) = self.console.node_for_dn(dn) {
            return Ok(node.into());
        }
        let model = self.console.model();
        model
            .results_of(parent)
            .iter()
            .copied()
            .find(|row| {
                model
                    .results_row(*row)
                    .and_then(|r| r.data().dn.as_ref())
                    .is_some_and(|candidate| candidate == dn)
            })
            .map(ItemHandle::from)
            .ok_or_else(not_found)
    }

    /// Like `locate`, but `dn` must be a scope node.
    pub fn reveal(&mut self, dn: &Dn) -> Result<NodeHandle, CliError> {
        match self.locate(dn)? {
            ItemHandle::Scope(node) => Ok(node),
            ItemHandle::Results(_) => Err(CliError::NotContainer { dn: dn.to_string() }),
        }
    }

    pub fn locate_all(&mut self, dns: &[Dn]) -> Result<Vec<ItemHandle>, CliError> {
        dns.iter().map(|dn| self.locate(dn)).collect()
    }

    /// Print and clear the status messages collected so far.
    pub fn flush_status(&mut self) {
        for message in self.console.status_mut().take_messages() {
            if !self.quiet {
                eprintln!("{}", output::format_status(&message, self.color));
            }
        }
    }

    /// Write the directory back to the snapshot it was loaded from.
    pub fn save(&self) -> Result<(), CliError> {
        self.console.directory().save(&self.snapshot)?;
        debug!(snapshot = %self.snapshot.display(), "snapshot saved");
        Ok(())
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.quiet);
    }
}

fn resolve_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

fn resolve_color(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global
        .color
        .or_else(|| ColorMode::from_str(&cfg.defaults.color, true).ok())
        .unwrap_or(ColorMode::Auto)
}
