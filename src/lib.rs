//! Keyed sequence allocation over a shared SQLite registry.
//!
//! `sequin` hands out globally unique, monotonically increasing `i64`
//! identifiers per string key, shared by any number of threads and
//! processes that persist against the same registry. Each process reserves
//! value ranges in batches, so the common `next_value` call is a single
//! atomic increment; refills go through a version-guarded conditional
//! update, and contention between processes is absorbed by a bounded retry
//! with jittered backoff.
//!
//! Sequences are unique and monotonic per key, but not gap-free: a process
//! restart abandons the unused remainder of its reservation.
//!
//! ```no_run
//! use std::path::Path;
//! use sequin::{SequenceConfig, SequenceEngine, SqliteSequenceStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SequenceConfig::default();
//! let store = SqliteSequenceStore::open(Path::new("registry.sqlite"), &config.table)?;
//! let engine = SequenceEngine::new(store, config)?;
//! let id = engine.next_value("orders")?;
//! println!("order id: {}", sequin::base62::encode(id)?);
//! # Ok(())
//! # }
//! ```

pub mod base62;
mod config;
mod engine;
mod error;
mod partition;
mod store;
mod window;

pub use config::{SequenceConfig, DEFAULT_INCREMENT, DEFAULT_INIT_VALUE, MIN_INCREMENT};
pub use engine::SequenceEngine;
pub use error::{AllocationError, Base62Error, ConfigError, StoreError};
pub use partition::{PartitionedSequence, DEFAULT_PARTITION};
pub use store::{RangeRecord, ReservedRange, SequenceStore, SqliteSequenceStore};
pub use window::AllocationWindow;
