use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("row decode error: {0}")]
    Row(#[from] serde_rusqlite::Error),

    #[error("corrupt journal entry {sequence}: {reason}")]
    Corrupt { sequence: i64, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
