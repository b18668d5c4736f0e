//! Per-account exclusive access for the balance ledger
//!
//! Two implementations of [`KeyLock`] are provided, selected by [`LockConfig`]:
//!
//! - [`PerKeyLockManager`] (default): one mutex per account id, created on
//!   first use in a `DashMap` and evicted once nobody holds or waits on it.
//!   Account ids are unbounded, so the registry only tracks ids that are in
//!   flight; distinct ids never contend.
//! - [`StripedLockManager`]: a fixed number of mutexes selected by hashing the
//!   id. Memory is bounded up front at the price of occasional contention
//!   between unrelated ids that hash to the same stripe. A single stripe is
//!   the degenerate global lock.
//!
//! The mutexes guard `()`: the protected state lives in the stores, so a
//! poisoned mutex carries no broken data and is simply re-entered.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tracing::warn;

use super::traits::KeyLock;
use crate::types::AccountId;

/// Which lock manager the ledger uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    /// One lock per account id
    PerKey,
    /// A fixed pool of locks shared by hash
    Striped,
}

/// Configuration for the key lock manager
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockConfig {
    /// Lock manager implementation
    pub mode: LockMode,
    /// Number of stripes (striped mode only)
    pub stripes: usize,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            mode: LockMode::PerKey,
            stripes: 64,
        }
    }
}

impl LockConfig {
    /// Create a new LockConfig, falling back to the default stripe count for zero
    pub fn new(mode: LockMode, stripes: usize) -> Self {
        let default = Self::default();

        let stripes = if stripes == 0 {
            warn!(
                stripes,
                fallback = default.stripes,
                "Invalid stripe count, using default"
            );
            default.stripes
        } else {
            stripes
        };

        Self { mode, stripes }
    }
}

fn acquire(mutex: &Mutex<()>) -> MutexGuard<'_, ()> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One lock per account id, created on demand
///
/// The registry maps ids to `Arc<Mutex<()>>`. Get-or-create goes through the
/// `DashMap` entry API, so concurrent first touches of the same id agree on a
/// single mutex, and first touches of different ids only meet on a shard.
#[derive(Debug, Default)]
pub struct PerKeyLockManager {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl PerKeyLockManager {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Number of ids that currently have a lock in the registry
    pub fn tracked_keys(&self) -> usize {
        self.locks.len()
    }

    fn lock_for(&self, id: AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Drops the registry entry once the last holder is gone
///
/// Clones of the `Arc` are only handed out under the shard lock, and
/// `remove_if` runs under the same shard lock, so a strong count of one means
/// no caller holds or waits on this mutex and none can obtain it meanwhile.
struct EvictOnRelease<'a> {
    locks: &'a DashMap<AccountId, Arc<Mutex<()>>>,
    id: AccountId,
}

impl Drop for EvictOnRelease<'_> {
    fn drop(&mut self) {
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl KeyLock for PerKeyLockManager {
    fn with_exclusive<R, F>(&self, id: AccountId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // Locals drop in reverse order: guard, then our Arc, then eviction.
        let _evict = EvictOnRelease {
            locks: &self.locks,
            id,
        };
        let lock = self.lock_for(id);
        let _guard = acquire(&lock);
        f()
    }
}

/// Fixed pool of locks selected by hashing the account id
#[derive(Debug)]
pub struct StripedLockManager {
    stripes: Box<[Mutex<()>]>,
    hasher: RandomState,
}

impl StripedLockManager {
    /// Create a manager with `stripes` locks (at least one)
    pub fn new(stripes: usize) -> Self {
        let stripes = (0..stripes.max(1)).map(|_| Mutex::new(())).collect();
        Self {
            stripes,
            hasher: RandomState::new(),
        }
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Index of the stripe guarding `id`
    pub fn stripe_of(&self, id: AccountId) -> usize {
        (self.hasher.hash_one(id) % self.stripes.len() as u64) as usize
    }
}

impl KeyLock for StripedLockManager {
    fn with_exclusive<R, F>(&self, id: AccountId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = acquire(&self.stripes[self.stripe_of(id)]);
        f()
    }
}

/// Lock manager chosen at runtime from a [`LockConfig`]
#[derive(Debug)]
pub enum KeyLockManager {
    PerKey(PerKeyLockManager),
    Striped(StripedLockManager),
}

impl KeyLockManager {
    pub fn from_config(config: &LockConfig) -> Self {
        match config.mode {
            LockMode::PerKey => KeyLockManager::PerKey(PerKeyLockManager::new()),
            LockMode::Striped => KeyLockManager::Striped(StripedLockManager::new(config.stripes)),
        }
    }
}

impl Default for KeyLockManager {
    fn default() -> Self {
        Self::from_config(&LockConfig::default())
    }
}

impl KeyLock for KeyLockManager {
    fn with_exclusive<R, F>(&self, id: AccountId, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        match self {
            KeyLockManager::PerKey(locks) => locks.with_exclusive(id, f),
            KeyLockManager::Striped(locks) => locks.with_exclusive(id, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_with_exclusive_returns_closure_result() {
        let manager = PerKeyLockManager::new();

        let result = manager.with_exclusive(1, || 40 + 2);

        assert_eq!(result, 42);
    }

    #[test]
    fn test_per_key_evicts_idle_lock() {
        let manager = PerKeyLockManager::new();

        manager.with_exclusive(1, || {
            assert_eq!(manager.tracked_keys(), 1);
        });

        assert_eq!(manager.tracked_keys(), 0);
    }

    #[test]
    fn test_per_key_releases_after_panic() {
        let manager = PerKeyLockManager::new();

        let result = catch_unwind(AssertUnwindSafe(|| {
            manager.with_exclusive(1, || panic!("boom"));
        }));
        assert!(result.is_err());

        // Lock is free again and the registry is clean
        assert_eq!(manager.with_exclusive(1, || 7), 7);
        assert_eq!(manager.tracked_keys(), 0);
    }

    #[test]
    fn test_striped_releases_after_panic() {
        let manager = StripedLockManager::new(4);

        let result = catch_unwind(AssertUnwindSafe(|| {
            manager.with_exclusive(1, || panic!("boom"));
        }));
        assert!(result.is_err());

        assert_eq!(manager.with_exclusive(1, || 7), 7);
    }

    #[rstest]
    #[case::zero_becomes_one(0, 1)]
    #[case::single(1, 1)]
    #[case::many(16, 16)]
    fn test_striped_stripe_count(#[case] requested: usize, #[case] expected: usize) {
        let manager = StripedLockManager::new(requested);
        assert_eq!(manager.stripe_count(), expected);
        assert!(manager.stripe_of(12345) < expected);
    }

    #[test]
    fn test_stripe_of_is_stable() {
        let manager = StripedLockManager::new(8);
        assert_eq!(manager.stripe_of(99), manager.stripe_of(99));
    }

    #[rstest]
    #[case::default_config(LockConfig::default(), LockMode::PerKey, 64)]
    #[case::zero_stripes(LockConfig::new(LockMode::Striped, 0), LockMode::Striped, 64)]
    #[case::custom_stripes(LockConfig::new(LockMode::Striped, 8), LockMode::Striped, 8)]
    fn test_lock_config(
        #[case] config: LockConfig,
        #[case] mode: LockMode,
        #[case] stripes: usize,
    ) {
        assert_eq!(config.mode, mode);
        assert_eq!(config.stripes, stripes);
    }

    #[test]
    fn test_from_config_selects_implementation() {
        let per_key = KeyLockManager::from_config(&LockConfig::default());
        assert!(matches!(per_key, KeyLockManager::PerKey(_)));

        let striped = KeyLockManager::from_config(&LockConfig::new(LockMode::Striped, 4));
        match striped {
            KeyLockManager::Striped(locks) => assert_eq!(locks.stripe_count(), 4),
            other => panic!("Expected striped manager, got {:?}", other),
        }
    }

    /// Runs many increments of a non-atomic read-then-write under the lock
    fn assert_same_key_serialized(manager: Arc<KeyLockManager>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..16 {
            let manager = Arc::clone(&manager);
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                for _ in 0..200 {
                    manager.with_exclusive(5, || {
                        let current = counter.load(Ordering::Relaxed);
                        thread::yield_now();
                        counter.store(current + 1, Ordering::Relaxed);
                    });
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::Relaxed), 16 * 200);
    }

    #[test]
    fn test_per_key_serializes_same_key() {
        assert_same_key_serialized(Arc::new(KeyLockManager::PerKey(PerKeyLockManager::new())));
    }

    #[test]
    fn test_striped_serializes_same_key() {
        assert_same_key_serialized(Arc::new(KeyLockManager::Striped(StripedLockManager::new(
            4,
        ))));
    }

    /// Holds `held` exclusively and checks that `other` can still be entered
    fn assert_keys_independent(manager: Arc<KeyLockManager>, held: AccountId, other: AccountId) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                manager.with_exclusive(held, || {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                });
            })
        };

        entered_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let other_thread = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                manager.with_exclusive(other, || done_tx.send(()).unwrap());
            })
        };

        // The other key completes while the first one is still held
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("independent key was blocked by an unrelated exclusive region");

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        other_thread.join().unwrap();
    }

    #[test]
    fn test_per_key_distinct_keys_do_not_block() {
        assert_keys_independent(
            Arc::new(KeyLockManager::PerKey(PerKeyLockManager::new())),
            1,
            2,
        );
    }

    #[test]
    fn test_striped_distinct_stripes_do_not_block() {
        let locks = StripedLockManager::new(8);
        let held = 1;
        let other = (2..1000)
            .find(|id| locks.stripe_of(*id) != locks.stripe_of(held))
            .unwrap();

        assert_keys_independent(Arc::new(KeyLockManager::Striped(locks)), held, other);
    }

    #[test]
    fn test_concurrent_first_touch_same_key() {
        let manager = Arc::new(PerKeyLockManager::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..10 {
            let manager = Arc::clone(&manager);
            let inside = Arc::clone(&inside);
            handles.push(thread::spawn(move || {
                manager.with_exclusive(77, || {
                    // Nobody else may be inside at the same time
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    thread::sleep(Duration::from_millis(1));
                    inside.fetch_sub(1, Ordering::SeqCst);
                });
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(manager.tracked_keys(), 0);
    }
}
