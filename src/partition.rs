//! Partition-scoped view over a shared engine.

use std::sync::Arc;

use crate::engine::SequenceEngine;
use crate::error::AllocationError;
use crate::store::SequenceStore;

pub const DEFAULT_PARTITION: &str = "default";

/// Namespaces sub-keys under a partition name before delegating to the
/// engine. Pure key composition; all allocation logic stays in the engine.
pub struct PartitionedSequence<S> {
    partition: String,
    engine: Arc<SequenceEngine<S>>,
}

impl<S: SequenceStore> PartitionedSequence<S> {
    pub fn new(engine: Arc<SequenceEngine<S>>, partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            engine,
        }
    }

    pub fn with_default_partition(engine: Arc<SequenceEngine<S>>) -> Self {
        Self::new(engine, DEFAULT_PARTITION)
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Next value for the partition's own counter.
    pub fn next_value(&self) -> Result<i64, AllocationError> {
        self.engine.next_value(&self.partition)
    }

    /// Next value for `key` scoped under this partition.
    pub fn next_value_for(&self, key: &str) -> Result<i64, AllocationError> {
        self.engine.next_value(&format!("{}.{}", self.partition, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SequenceConfig;
    use crate::error::StoreError;
    use crate::store::{RangeRecord, ReservedRange};
    use std::sync::Mutex;

    /// Records every key the engine asks the store about.
    struct KeyRecorder {
        keys: Mutex<Vec<String>>,
    }

    impl SequenceStore for KeyRecorder {
        fn load(&self, key: &str) -> Result<Option<RangeRecord>, StoreError> {
            self.keys.lock().unwrap().push(key.to_string());
            Ok(None)
        }

        fn create(&self, _key: &str, _initial_value: i64) -> Result<(), StoreError> {
            Ok(())
        }

        fn extend(&self, key: &str, increment: i64) -> Result<ReservedRange, StoreError> {
            let _ = key;
            Ok(ReservedRange {
                pointer: 1,
                valve: 1 + increment,
            })
        }
    }

    fn recording_engine() -> Arc<SequenceEngine<KeyRecorder>> {
        let store = KeyRecorder {
            keys: Mutex::new(Vec::new()),
        };
        Arc::new(SequenceEngine::new(store, SequenceConfig::default()).unwrap())
    }

    #[test]
    fn sub_keys_are_prefixed_with_the_partition() {
        let engine = recording_engine();
        let partitioned = PartitionedSequence::new(Arc::clone(&engine), "tenantA");
        partitioned.next_value_for("orders").unwrap();
        assert_eq!(
            *engine.store().keys.lock().unwrap(),
            vec!["tenantA.orders".to_string()]
        );
    }

    #[test]
    fn bare_calls_use_the_partition_key_itself() {
        let engine = recording_engine();
        let partitioned = PartitionedSequence::new(Arc::clone(&engine), "tenantA");
        partitioned.next_value().unwrap();
        assert_eq!(
            *engine.store().keys.lock().unwrap(),
            vec!["tenantA".to_string()]
        );
    }

    #[test]
    fn default_partition_name() {
        let engine = recording_engine();
        let partitioned = PartitionedSequence::with_default_partition(engine);
        assert_eq!(partitioned.partition(), "default");
    }
}
