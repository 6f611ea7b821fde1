//! SQLite journal implementation.

use crate::{Entry, EntryId, Error, NewEntry, Result};
use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior, params};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// How long a writer waits for another process holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Append-only SQLite journal of committed operations.
#[derive(Debug)]
pub struct Journal {
    conn: Connection,
}

/// Raw row shape, decoded with `serde_rusqlite`.
#[derive(Debug, Deserialize)]
struct EntryRow {
    sequence: i64,
    id: String,
    timestamp: String,
    caller: String,
    kind: String,
    data: String,
}

impl Journal {
    /// Open or create a journal at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let journal = Self { conn };
        journal.init_schema()?;
        Ok(journal)
    }

    /// Create an in-memory journal (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let journal = Self { conn };
        journal.init_schema()?;
        Ok(journal)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                sequence INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                timestamp TEXT NOT NULL,
                caller TEXT NOT NULL,
                kind TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entries_kind
                ON entries(kind, sequence);
            "#,
        )?;
        Ok(())
    }

    /// Append an entry unconditionally, returning it with its sequence number.
    pub fn append(&self, entry: &NewEntry) -> Result<Entry> {
        insert(&self.conn, entry)
    }

    /// Append an entry decided against everything committed after `after`.
    ///
    /// Holds the database write lock for the whole call. `decide` receives
    /// the entries other writers committed since `after` and returns the
    /// entry to append plus a value handed back to the caller. If `decide`
    /// fails nothing is written.
    pub fn append_after<T, E, F>(
        &mut self,
        after: u64,
        decide: F,
    ) -> std::result::Result<(Entry, T), E>
    where
        E: From<Error>,
        F: FnOnce(&[Entry]) -> std::result::Result<(NewEntry, T), E>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(Error::from)?;
        let newer = load_where(&tx, "sequence > ?1", [after as i64])?;
        let (entry, value) = decide(&newer)?;
        let entry = insert(&tx, &entry)?;
        tx.commit().map_err(Error::from)?;
        Ok((entry, value))
    }

    /// Load every entry in commit order.
    pub fn load_all(&self) -> Result<Vec<Entry>> {
        load_where(&self.conn, "1 = 1", params![])
    }

    /// Load entries committed after `sequence`, in commit order.
    pub fn load_after(&self, sequence: u64) -> Result<Vec<Entry>> {
        load_where(&self.conn, "sequence > ?1", [sequence as i64])
    }

    /// Load entries of one kind in commit order.
    pub fn load_kind(&self, kind: &str) -> Result<Vec<Entry>> {
        load_where(&self.conn, "kind = ?1", [kind])
    }

    /// Number of committed entries.
    pub fn len(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", params![], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn insert(conn: &Connection, entry: &NewEntry) -> Result<Entry> {
    let id = EntryId::new();
    let timestamp = Utc::now();
    conn.execute(
        "INSERT INTO entries (id, timestamp, caller, kind, data) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id.to_string(),
            timestamp.to_rfc3339(),
            entry.caller,
            entry.kind,
            serde_json::to_string(&entry.data)?,
        ],
    )?;
    let sequence = conn.last_insert_rowid() as u64;
    debug!(sequence, kind = %entry.kind, caller = %entry.caller, "journal entry appended");

    Ok(Entry {
        id,
        sequence,
        timestamp,
        caller: entry.caller.clone(),
        kind: entry.kind.clone(),
        data: entry.data.clone(),
    })
}

fn load_where<P: rusqlite::Params>(conn: &Connection, filter: &str, params: P) -> Result<Vec<Entry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT sequence, id, timestamp, caller, kind, data FROM entries
         WHERE {filter} ORDER BY sequence"
    ))?;

    let rows = serde_rusqlite::from_rows::<EntryRow>(stmt.query(params)?);
    let mut entries = Vec::new();
    for row in rows {
        entries.push(parse_row(row?)?);
    }
    Ok(entries)
}

fn parse_row(row: EntryRow) -> Result<Entry> {
    let sequence = row.sequence;
    let corrupt = |reason: String| Error::Corrupt { sequence, reason };

    let id = row
        .id
        .parse()
        .map_err(|e| corrupt(format!("bad id: {e}")))?;
    let timestamp = row
        .timestamp
        .parse()
        .map_err(|e| corrupt(format!("bad timestamp: {e}")))?;
    let data = serde_json::from_str(&row.data).map_err(|e| corrupt(format!("bad data: {e}")))?;

    Ok(Entry {
        id: EntryId(id),
        sequence: row.sequence as u64,
        timestamp,
        caller: row.caller,
        kind: row.kind,
        data,
    })
}
