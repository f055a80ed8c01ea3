//! Error taxonomy.
//!
//! Store-level failures are bounded and normalized to [`StoreError`]; the
//! only failure callers of `next_value` ever see is [`AllocationError`],
//! which carries the key and the root cause after retries are exhausted.

use thiserror::Error;

/// Failure of a single durable operation against the sequence registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Connection or transaction-level failure from the backing store.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The conditional extension update matched zero rows: a concurrent
    /// writer advanced the version first. Resolved by the engine's retry.
    #[error("version conflict extending `{key}` (expected version {expected})")]
    VersionConflict { key: String, expected: i64 },

    /// `extend` was asked for a key that has no registry row.
    #[error("no sequence row for `{key}`")]
    RowMissing { key: String },

    /// The insert for a new key affected a row count other than one.
    #[error("insert for `{key}` affected {rows} rows")]
    CreateConflict { key: String, rows: usize },
}

/// Terminal failure of [`next_value`](crate::SequenceEngine::next_value):
/// every configured attempt failed.
#[derive(Debug, Error)]
#[error("failed to allocate next value for `{key}` after {attempts} attempts")]
pub struct AllocationError {
    pub key: String,
    pub attempts: u32,
    #[source]
    pub source: StoreError,
}

/// Configuration rejected at construction time. Never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("increment {got} is below the minimum of {min}")]
    IncrementTooSmall { got: i64, min: i64 },

    #[error("failed to read config at {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("failed to parse config at {path}: {reason}")]
    Unparsable { path: String, reason: String },
}

/// Invalid input to the base-62 codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Base62Error {
    #[error("cannot encode negative id {0}")]
    Negative(i64),

    #[error("empty base62 code")]
    Empty,

    #[error("`{0}` is not a base62 symbol")]
    InvalidSymbol(char),

    #[error("base62 code overflows i64")]
    Overflow,
}
