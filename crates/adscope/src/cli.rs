//! Clap derive structures for the `adscope` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use adscope_core::{AttributeEdit, ObjectKind};
use adscope_directory::Dn;
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adscope -- scope/results console for directory snapshots
#[derive(Debug, Parser)]
#[command(
    name = "adscope",
    version,
    about = "Browse and edit a directory tree from the command line",
    long_about = "Loads a directory snapshot into the adscope console engine.\n\n\
        Containers are fetched lazily as they are expanded, and every edit\n\
        (create, rename, delete, drag-and-drop) is mirrored into the tree.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "ADSCOPE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory snapshot to open (YAML or JSON)
    #[arg(long, short = 'd', env = "ADSCOPE_DIRECTORY", global = true)]
    pub directory: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Show objects flagged advanced-view-only
    #[arg(long, global = true)]
    pub advanced: bool,

    /// Show configuration and schema objects
    #[arg(long, global = true)]
    pub dev_mode: bool,

    /// Put leaf objects in the tree as well as the results
    #[arg(long, global = true)]
    pub show_non_containers: bool,

    /// Extra LDAP filter OR'd into every fetch, e.g. "(objectClass=user)"
    #[arg(long, short = 'f', global = true)]
    pub filter: Option<String>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the scope tree
    Tree(TreeArgs),

    /// List the results pane of a container
    #[command(alias = "ls")]
    Results(ResultsArgs),

    /// Run an ad-hoc saved query and list its matches
    Query(QueryArgs),

    /// Show how dropping an object onto another would be handled
    Classify(ClassifyArgs),

    /// Drag objects onto a target: move them, or add them to a group
    Drop(DropArgs),

    /// Create an object
    Create(CreateArgs),

    /// Rename an object
    Rename(RenameArgs),

    /// Delete leaf objects
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// List the actions offered for a selection
    Actions(ActionsArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Browsing ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Containers to expand below the domain head
    #[arg(long, short = 'e')]
    pub expand: Vec<Dn>,
}

#[derive(Debug, Args)]
pub struct ResultsArgs {
    /// Container to list [default: the domain head]
    pub dn: Option<Dn>,

    /// Show every configured column, not just the default ones
    #[arg(long, short = 'a')]
    pub all_columns: bool,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// LDAP filter, e.g. "(&(objectClass=user)(description=*))"
    pub query_filter: String,

    /// Search base [default: the domain head]
    #[arg(long, short = 'b')]
    pub base: Option<Dn>,

    /// Name of the query item
    #[arg(long, default_value = "Query")]
    pub name: String,
}

// ── Drag and drop ────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Dragged object
    pub dn: Dn,

    /// Drop target
    #[arg(long)]
    pub onto: Dn,
}

#[derive(Debug, Args)]
pub struct DropArgs {
    /// Dragged objects
    #[arg(required = true)]
    pub dns: Vec<Dn>,

    /// Drop target
    #[arg(long)]
    pub onto: Dn,

    /// Write the modified directory back to the snapshot
    #[arg(long)]
    pub save: bool,
}

// ── Editing ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Kind of object: user, group, ou, computer
    pub kind: ObjectKind,

    /// Name of the new object
    pub name: String,

    /// Container to create it in
    #[arg(long, short = 'p')]
    pub parent: Dn,

    /// Initial attribute value, as ATTRIBUTE=VALUE (repeatable)
    #[arg(long = "set", value_parser = parse_edit)]
    pub edits: Vec<AttributeEdit>,

    /// Write the modified directory back to the snapshot
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    pub dn: Dn,

    pub new_name: String,

    /// Write the modified directory back to the snapshot
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(required = true)]
    pub dns: Vec<Dn>,

    /// Write the modified directory back to the snapshot
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct ActionsArgs {
    /// Selected objects
    #[arg(required = true)]
    pub dns: Vec<Dn>,
}

fn parse_edit(raw: &str) -> Result<AttributeEdit, String> {
    let (attribute, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ATTRIBUTE=VALUE, got '{raw}'"))?;
    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(format!("missing attribute name in '{raw}'"));
    }
    Ok(AttributeEdit::new(attribute, [value]))
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
