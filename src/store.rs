//! Durable sequence registry access.
//!
//! Three operations, each a single transaction against the shared registry
//! table: `load` an existing record, `create` a brand-new one, `extend` the
//! reserved range through a version-guarded conditional update. The version
//! check is the sole cross-process synchronization point; a lost race
//! surfaces as [`StoreError::VersionConflict`] and is resolved by the
//! engine's retry, never inside the adapter.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};

use crate::error::StoreError;

const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Durable row image for one key: high-water mark plus version stamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeRecord {
    pub value: i64,
    pub version: i64,
}

/// Result of a successful extension: the half-open range `(pointer, valve]`
/// now belongs exclusively to the calling process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReservedRange {
    pub pointer: i64,
    pub valve: i64,
}

/// Store seam for the engine. Implemented by [`SqliteSequenceStore`] in
/// production and by in-memory doubles in tests.
pub trait SequenceStore: Send + Sync {
    /// Read the record for `key`, or `None` when no row exists. A relaxed
    /// read: it only seeds an in-memory estimate that `extend` reconciles.
    fn load(&self, key: &str) -> Result<Option<RangeRecord>, StoreError>;

    /// Insert `(key, initial_value, version = 0)`. Exactly one row must be
    /// affected; a concurrent creator surfaces as an error.
    fn create(&self, key: &str, initial_value: i64) -> Result<(), StoreError>;

    /// Advance the record by `increment` under the version guard and return
    /// the newly reserved range.
    fn extend(&self, key: &str, increment: i64) -> Result<ReservedRange, StoreError>;
}

/// SQLite-backed registry. A connection is opened per operation and closed
/// on every exit path; commits are explicit and a dropped transaction rolls
/// back.
pub struct SqliteSequenceStore {
    db_path: PathBuf,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
}

impl SqliteSequenceStore {
    /// Open the registry at `db_path`, provisioning `table` if absent.
    pub fn open(db_path: &Path, table: &str) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.to_path_buf(),
            select_sql: format!("SELECT value, version FROM {table} WHERE name = ?1"),
            insert_sql: format!("INSERT INTO {table} (name, value, version) VALUES (?1, ?2, 0)"),
            update_sql: format!(
                "UPDATE {table} SET value = ?1, version = ?2 WHERE name = ?3 AND version = ?4"
            ),
        };
        let conn = store.connect(true)?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (\
                 name TEXT PRIMARY KEY, \
                 value INTEGER NOT NULL, \
                 version INTEGER NOT NULL)"
            ),
            [],
        )?;
        Ok(store)
    }

    fn connect(&self, create: bool) -> Result<Connection, StoreError> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let conn = Connection::open_with_flags(&self.db_path, flags)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        Ok(conn)
    }
}

impl SequenceStore for SqliteSequenceStore {
    fn load(&self, key: &str) -> Result<Option<RangeRecord>, StoreError> {
        let mut conn = self.connect(false)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let record = tx
            .query_row(&self.select_sql, params![key], |row| {
                Ok(RangeRecord {
                    value: row.get(0)?,
                    version: row.get(1)?,
                })
            })
            .optional()?;
        tx.commit()?;
        tracing::debug!(key, found = record.is_some(), "loaded sequence record");
        Ok(record)
    }

    fn create(&self, key: &str, initial_value: i64) -> Result<(), StoreError> {
        let mut conn = self.connect(false)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows = tx.execute(&self.insert_sql, params![key, initial_value])?;
        if rows != 1 {
            return Err(StoreError::CreateConflict {
                key: key.to_string(),
                rows,
            });
        }
        tx.commit()?;
        tracing::debug!(key, initial_value, "created sequence record");
        Ok(())
    }

    fn extend(&self, key: &str, increment: i64) -> Result<ReservedRange, StoreError> {
        let mut conn = self.connect(false)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let record = tx
            .query_row(&self.select_sql, params![key], |row| {
                Ok(RangeRecord {
                    value: row.get(0)?,
                    version: row.get(1)?,
                })
            })
            .optional()?
            .ok_or_else(|| StoreError::RowMissing {
                key: key.to_string(),
            })?;

        let new_value = record.value + increment;
        let rows = tx.execute(
            &self.update_sql,
            params![new_value, record.version + 1, key, record.version],
        )?;
        if rows == 0 {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected: record.version,
            });
        }
        tx.commit()?;
        tracing::debug!(
            key,
            pointer = record.value,
            valve = new_value,
            version = record.version + 1,
            "extended sequence record"
        );
        Ok(ReservedRange {
            pointer: record.value,
            valve: new_value,
        })
    }
}
