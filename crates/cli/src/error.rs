//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The journal file does not exist.
    ///
    /// This typically means the ledger has not been bootstrapped yet.
    #[error("ledger not found at {path}. Run 'provenance init' first")]
    DatabaseNotFound { path: PathBuf },

    /// No data directory could be determined for the journal.
    #[error("no data directory available; pass --db <path>")]
    NoDataDir,

    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the ledger.
    #[error(transparent)]
    Ledger(#[from] ledger::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// Output could not be encoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
