// ── Directory error types ──
//
// Errors raised by a `DirectoryService` backend. The core crate
// translates these into domain-level `CoreError` variants; consumers
// above the core never see them directly.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach directory server {host}: {reason}")]
    Connection { host: String, reason: String },

    // ── Object state ─────────────────────────────────────────────────
    #[error("No such object: {dn}")]
    NoSuchObject { dn: String },

    #[error("Object already exists: {dn}")]
    AlreadyExists { dn: String },

    #[error("Constraint violation on {dn}: {reason}")]
    ConstraintViolation { dn: String, reason: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid distinguished name '{value}': {reason}")]
    InvalidDn { value: String, reason: String },

    #[error("Invalid filter '{value}': {reason}")]
    InvalidFilter { value: String, reason: String },

    // ── Snapshot files (in-memory backend) ───────────────────────────
    #[error("Failed to read directory snapshot {path}: {reason}")]
    Snapshot { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DirectoryError {
    /// Whether the error means the server could not be reached at all,
    /// as opposed to the server rejecting a specific request.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}
