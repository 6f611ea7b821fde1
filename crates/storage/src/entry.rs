//! Journal entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entry about to be appended.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Identity that submitted the operation.
    pub caller: String,
    /// Short operation name, e.g. `register` or `sell`.
    pub kind: String,
    /// Full operation payload.
    pub data: serde_json::Value,
}

impl NewEntry {
    pub fn new(caller: impl Into<String>, kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            caller: caller.into(),
            kind: kind.into(),
            data,
        }
    }

    /// Encode any serializable payload.
    pub fn encode<T: Serialize>(
        caller: impl Into<String>,
        kind: impl Into<String>,
        payload: &T,
    ) -> crate::Result<Self> {
        Ok(Self::new(caller, kind, serde_json::to_value(payload)?))
    }
}

/// A committed journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Position in the total order, starting at 1.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub caller: String,
    pub kind: String,
    pub data: serde_json::Value,
}

impl Entry {
    /// Decode the payload into a concrete type.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}
