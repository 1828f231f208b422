// ── Core error types ──
//
// User-facing errors from adscope-core. Consumers never see raw
// directory failures: the `From<DirectoryError>` impl translates them
// into console-level variants.

use adscope_directory::DirectoryError;
use thiserror::Error;

use crate::console::QueryNameError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach directory server {host}: {reason}")]
    ConnectionFailed { host: String, reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Object not found: {dn}")]
    ObjectNotFound { dn: String },

    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Console item no longer exists")]
    StaleHandle,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by server: {message}")]
    Rejected { message: String },

    #[error(transparent)]
    QueryName(#[from] QueryNameError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Connectivity failures abort a whole fetch rather than one item.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }
}

// ── Conversion from directory errors ─────────────────────────────────

impl From<DirectoryError> for CoreError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Connection { host, reason } => {
                CoreError::ConnectionFailed { host, reason }
            }
            DirectoryError::NoSuchObject { dn } => CoreError::ObjectNotFound { dn },
            DirectoryError::AlreadyExists { dn } => CoreError::Rejected {
                message: format!("{dn} already exists"),
            },
            DirectoryError::ConstraintViolation { dn, reason } => CoreError::Rejected {
                message: format!("{dn}: {reason}"),
            },
            DirectoryError::InvalidDn { value, reason }
            | DirectoryError::InvalidFilter { value, reason } => {
                CoreError::InvalidIdentifier { value, reason }
            }
            DirectoryError::Snapshot { path, reason } => {
                CoreError::Internal(format!("Snapshot {}: {reason}", path.display()))
            }
            DirectoryError::Io(e) => CoreError::Internal(format!("I/O error: {e}")),
        }
    }
}
