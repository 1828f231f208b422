//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use adscope_config::ConfigError;
use adscope_core::CoreError;
use adscope_directory::DirectoryError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach directory server {host}")]
    #[diagnostic(
        code(adscope::connection_failed),
        help("Reason: {reason}")
    )]
    ConnectionFailed { host: String, reason: String },

    // ── Objects ──────────────────────────────────────────────────────
    #[error("Object '{dn}' not found")]
    #[diagnostic(
        code(adscope::not_found),
        help("Run: adscope results <parent DN> to see what the container holds")
    )]
    NotFound { dn: String },

    #[error("'{dn}' is not a container")]
    #[diagnostic(
        code(adscope::not_container),
        help("Only containers have a results pane. Use --show-non-containers to list leaves in the tree.")
    )]
    NotContainer { dn: String },

    #[error("The directory refused the change: {message}")]
    #[diagnostic(code(adscope::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(adscope::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No directory snapshot given")]
    #[diagnostic(
        code(adscope::no_directory),
        help(
            "Pass --directory <FILE>, set ADSCOPE_DIRECTORY, or add\n\
             directory = \"<FILE>\" to {config_path}"
        )
    )]
    NoDirectory { config_path: String },

    #[error("Cannot load directory snapshot: {message}")]
    #[diagnostic(code(adscope::snapshot))]
    Snapshot { message: String },

    #[error(transparent)]
    #[diagnostic(code(adscope::config))]
    Config(#[from] ConfigError),

    #[error("Console error: {message}")]
    #[diagnostic(code(adscope::internal))]
    Internal { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(adscope::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(adscope::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(adscope::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } | Self::NotContainer { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NoDirectory { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { host, reason } => {
                CliError::ConnectionFailed { host, reason }
            }

            CoreError::ObjectNotFound { dn } => CliError::NotFound { dn },

            CoreError::InvalidIdentifier { value, reason } => CliError::Validation {
                field: value,
                reason,
            },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::QueryName(err) => CliError::Validation {
                field: "query name".into(),
                reason: err.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::StaleHandle => CliError::Internal {
                message: "console item no longer exists".into(),
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

impl From<DirectoryError> for CliError {
    fn from(err: DirectoryError) -> Self {
        CoreError::from(err).into()
    }
}
