//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller does not satisfy the requirement of the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

pub type Result<T> = std::result::Result<T, Error>;
