//! SQLite-backed journal for the supply chain ledger.
//!
//! The ledger core is a pure in-memory state machine. This crate gives it a
//! durable, totally ordered log of committed operations so that state can be
//! rebuilt by replay after a restart.
//!
//! # Core Concepts
//!
//! ## Journal
//!
//! The [`Journal`] wraps a SQLite database. Entries are only ever appended;
//! each receives a strictly increasing `sequence` which defines the commit
//! order used on replay.
//!
//! ## Entry
//!
//! An [`Entry`] records one committed operation:
//! - A unique [`EntryId`]
//! - Its position in the total order
//! - A UTC timestamp
//! - The caller identity and the operation kind
//! - The operation payload as JSON
//!
//! # Example
//!
//! ```no_run
//! use storage::{Journal, NewEntry};
//! use serde_json::json;
//!
//! let journal = Journal::open("ledger.db")?;
//! journal.append(&NewEntry::new("0xabc", "order", json!({ "name": "Cell-100" })))?;
//!
//! for entry in journal.load_all()? {
//!     println!("#{} {} by {}", entry.sequence, entry.kind, entry.caller);
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod entry;
mod error;
mod journal;

pub use entry::{Entry, EntryId, NewEntry};
pub use error::{Error, Result};
pub use journal::Journal;
