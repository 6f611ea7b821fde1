//! Ledger error types.

use crate::{Stage, UnitId};
use policy::{Identity, RoleKind};
use thiserror::Error;

/// Ledger errors.
///
/// The first four variants are the canonical failures of the state machine.
/// Every one of them is reported before any state is touched, so repeating a
/// failed call against unchanged state fails the same way.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller is not the administrator, lacks the required role, or is
    /// not the retailer of record.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The identity already holds a role.
    #[error("{identity} is already registered as {role}")]
    AlreadyRegistered { identity: Identity, role: RoleKind },

    /// The unit id is outside `1..=count`.
    #[error("unit {unit_id} not found ({count} units exist)")]
    UnitNotFound { unit_id: UnitId, count: u64 },

    /// The unit is not at the stage the operation starts from.
    #[error("unit {unit_id} is at stage {actual}, operation requires {required}")]
    InvalidStageTransition {
        unit_id: UnitId,
        actual: Stage,
        required: Stage,
    },

    /// Bootstrap was attempted on a journal that already holds entries.
    #[error("ledger already bootstrapped")]
    AlreadyBootstrapped,

    /// The journal holds no bootstrap entry.
    #[error("ledger not bootstrapped")]
    NotBootstrapped,

    /// A recorded entry could not be re-applied.
    #[error("replay failed at entry {sequence}: {reason}")]
    Replay { sequence: u64, reason: String },

    #[error(transparent)]
    Storage(#[from] storage::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl From<policy::Error> for Error {
    fn from(err: policy::Error) -> Self {
        match err {
            policy::Error::Unauthorized(reason) => Error::Unauthorized(reason),
            other => Error::Unauthorized(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
