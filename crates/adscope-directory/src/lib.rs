//! Directory access layer for the adscope console.
//!
//! Everything the console knows about a directory server flows through
//! this crate:
//!
//! - **[`DirectoryService`]**: Synchronous search / move / rename /
//!   delete / create operations. The console engine is generic over it.
//!
//! - **[`Dn`]** and **[`Filter`]**: Distinguished names with
//!   case-insensitive identity, and RFC 4515 search filters that can be
//!   parsed, printed, and evaluated against a record.
//!
//! - **[`ObjectRecord`]**: One object's queried attributes, with
//!   decoders for `systemFlags`, `userAccountControl`, and `groupType`.
//!
//! - **[`MemoryDirectory`]**: An in-memory backend loaded from a YAML
//!   or JSON snapshot, used by the CLI and the test suites.

pub mod dn;
pub mod error;
pub mod filter;
pub mod memory;
pub mod record;
pub mod service;

// ── Primary re-exports ──────────────────────────────────────────────
pub use dn::Dn;
pub use error::DirectoryError;
pub use filter::{ATTRIBUTE_OBJECT_CLASS, Filter};
pub use memory::{DirectorySnapshot, MemoryDirectory};
pub use record::{GroupScope, GroupType, ObjectRecord, SystemFlag};
pub use service::{DirectoryService, SearchResults, SearchScope};
