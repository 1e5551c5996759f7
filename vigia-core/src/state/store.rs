//! Mutex-guarded store of the latest value of every field
//!
//! Reads and writes wait for the lock at most `lock_timeout`. A write that
//! times out is dropped; a read that times out is served from the last
//! snapshot a read did obtain and is flagged as stale.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration};

use super::field::{SensorField, StateSnapshot};

/// Default bounded wait for the store lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Lock not obtained within the bounded wait; the update was dropped
    Timeout,
}

/// Result of [`SharedStateStore::fetch`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fetched {
    pub snapshot: StateSnapshot,
    /// Lock timed out; `snapshot` is the last one successfully fetched
    pub stale: bool,
}

/// The node's single shared state
///
/// Created once at boot and handed by reference to every task.
pub struct SharedStateStore<M: RawMutex> {
    state: Mutex<M, StateSnapshot>,
    last_fetched: BlockingMutex<M, Cell<StateSnapshot>>,
    lock_timeout: Duration,
}

impl<M: RawMutex> SharedStateStore<M> {
    /// Create a zeroed store with the default lock timeout
    pub const fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create a zeroed store
    pub const fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(StateSnapshot::ZERO),
            last_fetched: BlockingMutex::new(Cell::new(StateSnapshot::ZERO)),
            lock_timeout,
        }
    }

    /// Take a consistent snapshot
    ///
    /// Never fails. On lock timeout the previous snapshot is returned
    /// (zero if none was ever fetched) with `stale` set.
    pub async fn fetch(&self) -> Fetched {
        match with_timeout(self.lock_timeout, self.state.lock()).await {
            Ok(state) => {
                let snapshot = *state;
                drop(state);
                self.last_fetched.lock(|last| last.set(snapshot));
                Fetched {
                    snapshot,
                    stale: false,
                }
            }
            Err(_) => Fetched {
                snapshot: self.last_fetched.lock(Cell::get),
                stale: true,
            },
        }
    }

    /// Take a snapshot, ignoring staleness
    pub async fn get(&self) -> StateSnapshot {
        self.fetch().await.snapshot
    }

    /// Write one field
    pub async fn set(&self, field: SensorField) -> Result<(), StoreError> {
        self.apply(&[field]).await
    }

    /// Write several fields under one lock
    ///
    /// Readers see either none or all of `fields`.
    pub async fn apply(&self, fields: &[SensorField]) -> Result<(), StoreError> {
        let mut state = with_timeout(self.lock_timeout, self.state.lock())
            .await
            .map_err(|_| StoreError::Timeout)?;
        for field in fields {
            state.apply(*field);
        }
        Ok(())
    }
}

impl<M: RawMutex> Default for SharedStateStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use proptest::prelude::*;

    type Store = SharedStateStore<NoopRawMutex>;

    #[test]
    fn test_starts_zeroed() {
        let store = Store::new();
        let fetched = block_on(store.fetch());
        assert_eq!(fetched.snapshot, StateSnapshot::ZERO);
        assert!(!fetched.stale);
    }

    #[test]
    fn test_set_then_get() {
        let store = Store::new();
        block_on(async {
            store.set(SensorField::Temperature(23.4)).await.unwrap();
            store.set(SensorField::Opened(true)).await.unwrap();
            let s = store.get().await;
            assert_eq!(s.temperature_c, 23.4);
            assert!(s.opened);
            assert_eq!(s.humidity_pct, 0.0);
        });
    }

    #[test]
    fn test_set_times_out_while_held() {
        let store = Store::with_lock_timeout(Duration::from_millis(10));
        block_on(async {
            let _held = store.state.lock().await;
            assert_eq!(
                store.set(SensorField::Collision(true)).await,
                Err(StoreError::Timeout)
            );
        });
        // Dropped write left no trace
        assert!(!block_on(store.get()).collision);
    }

    #[test]
    fn test_fetch_serves_last_snapshot_on_timeout() {
        let store = Store::with_lock_timeout(Duration::from_millis(10));
        block_on(async {
            store.set(SensorField::Humidity(55.2)).await.unwrap();
            let fresh = store.fetch().await;
            assert!(!fresh.stale);

            let mut held = store.state.lock().await;
            held.humidity_pct = 99.0;
            let stale = store.fetch().await;
            assert!(stale.stale);
            assert_eq!(stale.snapshot, fresh.snapshot);
        });
    }

    #[test]
    fn test_fetch_timeout_before_any_read_is_zero() {
        let store = Store::with_lock_timeout(Duration::from_millis(10));
        block_on(async {
            store.set(SensorField::Temperature(30.0)).await.unwrap();
            let _held = store.state.lock().await;
            let fetched = store.fetch().await;
            assert!(fetched.stale);
            assert_eq!(fetched.snapshot, StateSnapshot::ZERO);
        });
    }

    fn field_strategy() -> impl Strategy<Value = SensorField> {
        prop_oneof![
            (-40.0f32..85.0).prop_map(SensorField::Temperature),
            (0.0f32..100.0).prop_map(SensorField::Humidity),
            any::<bool>().prop_map(SensorField::Opened),
            any::<bool>().prop_map(SensorField::Collision),
        ]
    }

    proptest! {
        /// Every snapshot holds, per field, the initial value or one that was written
        #[test]
        fn test_snapshots_hold_only_written_values(
            ops in proptest::collection::vec(proptest::option::of(field_strategy()), 1..64)
        ) {
            let store = Store::new();
            let mut written: std::vec::Vec<SensorField> = std::vec::Vec::new();
            let mut model = StateSnapshot::ZERO;

            block_on(async {
                for op in &ops {
                    match op {
                        Some(field) => {
                            store.set(*field).await.unwrap();
                            written.push(*field);
                            model.apply(*field);
                        }
                        None => {
                            let s = store.get().await;
                            // Linearizable: the snapshot equals the sequential model
                            assert_eq!(s, model);
                            let seen = |f: SensorField| written.contains(&f);
                            assert!(s.temperature_c == 0.0 || seen(SensorField::Temperature(s.temperature_c)));
                            assert!(s.humidity_pct == 0.0 || seen(SensorField::Humidity(s.humidity_pct)));
                            assert!(!s.opened || seen(SensorField::Opened(true)));
                            assert!(!s.collision || seen(SensorField::Collision(true)));
                        }
                    }
                }
            });
        }

        /// A multi-field write is never observed half-applied
        #[test]
        fn test_grouped_write_is_atomic(t in -40.0f32..85.0, h in 0.0f32..100.0) {
            let store = Store::new();
            block_on(async {
                store
                    .apply(&[SensorField::Temperature(t), SensorField::Humidity(h)])
                    .await
                    .unwrap();
                let s = store.get().await;
                assert_eq!((s.temperature_c, s.humidity_pct), (t, h));
            });
        }
    }
}
