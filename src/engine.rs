//! Batch-allocation engine.
//!
//! One engine per process. Each key maps to an [`AllocationWindow`] in the
//! process-wide cache; the common path for `next_value` is a single bounded
//! atomic claim. A window that is uninitialized or exhausted is refilled
//! under its per-key lock through the store's create/extend protocol, and
//! the whole allocation is wrapped in a bounded retry with jittered backoff
//! to absorb contention with other processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;

use crate::config::SequenceConfig;
use crate::error::{AllocationError, ConfigError, StoreError};
use crate::store::SequenceStore;
use crate::window::AllocationWindow;

pub struct SequenceEngine<S> {
    store: S,
    config: SequenceConfig,
    windows: Mutex<HashMap<String, Arc<AllocationWindow>>>,
}

impl<S: SequenceStore> SequenceEngine<S> {
    /// Build an engine over `store`. Rejects invalid configuration
    /// synchronously; that failure is a setup bug and is never retried.
    pub fn new(store: S, config: SequenceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            windows: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issue the next value for `key`.
    ///
    /// Transient store contention is absorbed by the retry policy; when
    /// every attempt fails the last cause surfaces in the error.
    pub fn next_value(&self, key: &str) -> Result<i64, AllocationError> {
        let attempts = self.config.retry_attempts.max(1);
        let mut last = None;
        for attempt in 1..=attempts {
            if attempt > 1 {
                self.backoff();
            }
            match self.allocate_once(key) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(key, attempt, error = %err, "allocation attempt failed");
                    last = Some(err);
                }
            }
        }
        Err(AllocationError {
            key: key.to_string(),
            attempts,
            source: last.expect("at least one attempt ran"),
        })
    }

    fn backoff(&self) {
        let jitter = if self.config.retry_jitter_max_ms > 0 {
            rand::rng().random_range(0..self.config.retry_jitter_max_ms)
        } else {
            0
        };
        std::thread::sleep(self.config.retry_base_delay() + Duration::from_millis(jitter));
    }

    fn allocate_once(&self, key: &str) -> Result<i64, StoreError> {
        let window = self.window(key);

        if !window.is_initialized() {
            let _refill = window.refill_lock();
            // Another thread may have finished initialization while this
            // one waited on the lock.
            if !window.is_initialized() {
                match self.store.load(key)? {
                    None => {
                        // Seed the row at the window's valve: the range
                        // (init_value, valve] is then already reserved for
                        // this process.
                        self.store.create(key, window.valve())?;
                    }
                    Some(_) => {
                        let range = self.store.extend(key, self.config.increment)?;
                        window.sync_from(range);
                    }
                }
                window.mark_initialized();
            }
        }

        loop {
            if let Some(value) = window.try_claim() {
                tracing::debug!(key, value, "issued sequence value");
                return Ok(value);
            }
            let _refill = window.refill_lock();
            if window.at_watermark() {
                let range = self.store.extend(key, self.config.increment)?;
                window.sync_from(range);
            }
        }
    }

    /// Look up or create the window for `key`. Insert-if-absent is atomic
    /// under the cache mutex; racing creators both proceed with the one
    /// window that won.
    fn window(&self, key: &str) -> Arc<AllocationWindow> {
        let mut windows = self.windows.lock().expect("window cache poisoned");
        let window = windows.entry(key.to_string()).or_insert_with(|| {
            Arc::new(AllocationWindow::new(
                key,
                self.config.init_value,
                self.config.init_value + self.config.increment,
            ))
        });
        Arc::clone(window)
    }
}
