//! Per-key allocation window.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::store::ReservedRange;

/// In-memory issuance state for one key.
///
/// `pointer` is the last value handed out; `valve` is the upper bound of the
/// range currently reserved in the store. Claims advance `pointer` through a
/// compare-exchange bounded by `valve`, so a value is never issued outside a
/// committed reservation. The engine holds `refill` while it initializes or
/// extends the reservation; plain claims take no lock.
pub struct AllocationWindow {
    key: String,
    pointer: AtomicI64,
    valve: AtomicI64,
    initialized: AtomicBool,
    refill: Mutex<()>,
}

impl AllocationWindow {
    pub fn new(key: impl Into<String>, pointer: i64, valve: i64) -> Self {
        Self {
            key: key.into(),
            pointer: AtomicI64::new(pointer),
            valve: AtomicI64::new(valve),
            initialized: AtomicBool::new(false),
            refill: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn pointer(&self) -> i64 {
        self.pointer.load(Ordering::Acquire)
    }

    pub fn valve(&self) -> i64 {
        self.valve.load(Ordering::Acquire)
    }

    pub fn set_pointer(&self, pointer: i64) {
        self.pointer.store(pointer, Ordering::Release);
    }

    pub fn set_valve(&self, valve: i64) {
        self.valve.store(valve, Ordering::Release);
    }

    /// Widen the valve in place and return the new value.
    pub fn extend_valve(&self, by: i64) -> i64 {
        self.valve.fetch_add(by, Ordering::AcqRel) + by
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// The window is exhausted and must be extended before the next claim.
    pub fn at_watermark(&self) -> bool {
        self.pointer() >= self.valve()
    }

    /// Claim the next value, or `None` if the reservation is exhausted.
    pub fn try_claim(&self) -> Option<i64> {
        let mut current = self.pointer.load(Ordering::Acquire);
        loop {
            if current >= self.valve.load(Ordering::Acquire) {
                return None;
            }
            match self.pointer.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(current + 1),
                Err(observed) => current = observed,
            }
        }
    }

    /// Copy a freshly reserved range into the window.
    ///
    /// Must be called with the refill lock held. The pointer is written
    /// before the valve: claims are bounded by the old valve until the new
    /// one lands, so no claim can slip into a range this process does not
    /// own.
    pub fn sync_from(&self, range: ReservedRange) {
        self.set_pointer(range.pointer);
        self.set_valve(range.valve);
    }

    /// Serializes initialization and extension for this key. Other keys'
    /// windows are unaffected.
    pub fn refill_lock(&self) -> MutexGuard<'_, ()> {
        self.refill.lock().expect("window refill lock poisoned")
    }
}

impl std::fmt::Debug for AllocationWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationWindow")
            .field("key", &self.key)
            .field("pointer", &self.pointer())
            .field("valve", &self.valve())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn claims_stop_at_the_valve() {
        let window = AllocationWindow::new("orders", 1, 4);
        assert_eq!(window.try_claim(), Some(2));
        assert_eq!(window.try_claim(), Some(3));
        assert_eq!(window.try_claim(), Some(4));
        assert!(window.at_watermark());
        assert_eq!(window.try_claim(), None);
        assert_eq!(window.pointer(), 4);
    }

    #[test]
    fn sync_replaces_a_stale_seed() {
        // A window seeded before its key was known to exist in the store
        // must adopt the store's (possibly smaller) reservation wholesale.
        let window = AllocationWindow::new("orders", 1, 1001);
        window.sync_from(ReservedRange {
            pointer: 51,
            valve: 61,
        });
        assert_eq!(window.pointer(), 51);
        assert_eq!(window.valve(), 61);
        assert_eq!(window.try_claim(), Some(52));
    }

    #[test]
    fn extend_valve_widens_in_place() {
        let window = AllocationWindow::new("orders", 1, 11);
        assert_eq!(window.extend_valve(10), 21);
        assert_eq!(window.valve(), 21);
    }

    #[test]
    fn initialized_flag_is_one_shot() {
        let window = AllocationWindow::new("orders", 1, 11);
        assert!(!window.is_initialized());
        window.mark_initialized();
        assert!(window.is_initialized());
    }

    #[test]
    fn concurrent_claims_are_unique_and_bounded() {
        let window = Arc::new(AllocationWindow::new("orders", 0, 1000));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let window = Arc::clone(&window);
            handles.push(std::thread::spawn(move || {
                let mut claimed = Vec::new();
                while let Some(value) = window.try_claim() {
                    claimed.push(value);
                }
                claimed
            }));
        }
        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        let expected: Vec<i64> = (1..=1000).collect();
        assert_eq!(all, expected);
    }
}
