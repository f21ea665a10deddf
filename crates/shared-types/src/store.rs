//! # Aggregate Store
//!
//! Keyed store in which every aggregate (order, account, batch) has its own
//! lock. A transaction runs against a working copy of one aggregate while
//! holding that aggregate's lock:
//!
//! ```text
//! begin ──► closure(&mut draft) ──Ok──► commit (draft replaces aggregate)
//!                                 └─Err─► rollback (draft dropped)
//! ```
//!
//! Transactions on different keys never contend. The map-level lock is only
//! held long enough to look up the aggregate's cell.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the store itself.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No aggregate under the key.
    #[error("aggregate not found")]
    NotFound,
    /// An aggregate already exists under the key.
    #[error("aggregate already exists")]
    AlreadyExists,
}

/// Keyed collection of independently locked aggregates.
pub struct AggregateStore<K, V> {
    cells: RwLock<HashMap<K, Arc<Mutex<V>>>>,
}

impl<K, V> AggregateStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new aggregate.
    ///
    /// # Errors
    /// - `AlreadyExists` if the key is taken
    pub fn insert(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut cells = self.cells.write();
        if cells.contains_key(&key) {
            return Err(StoreError::AlreadyExists);
        }
        cells.insert(key, Arc::new(Mutex::new(value)));
        Ok(())
    }

    /// Returns true if an aggregate exists under the key.
    pub fn contains(&self, key: &K) -> bool {
        self.cells.read().contains_key(key)
    }

    /// Number of aggregates.
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Returns a consistent snapshot of one aggregate.
    pub fn get(&self, key: &K) -> Option<V> {
        let cell = self.cell(key)?;
        let value = cell.lock().clone();
        Some(value)
    }

    /// Runs `f` as a transaction on the aggregate under `key`.
    ///
    /// The aggregate's lock is held for the whole closure. The working copy
    /// is committed only if `f` returns `Ok`.
    ///
    /// # Errors
    /// - `E::from(StoreError::NotFound)` if the key is absent
    /// - Whatever `f` returns; the aggregate is left untouched in that case
    pub fn transaction<R, E>(&self, key: &K, f: impl FnOnce(&mut V) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let cell = self.cell(key).ok_or(StoreError::NotFound)?;
        let mut guard = cell.lock();
        let mut draft = guard.clone();
        let result = f(&mut draft)?;
        *guard = draft;
        Ok(result)
    }

    /// Snapshot of every aggregate matching `filter`.
    pub fn collect_where(&self, mut filter: impl FnMut(&V) -> bool) -> Vec<V> {
        let cells: Vec<Arc<Mutex<V>>> = self.cells.read().values().cloned().collect();
        cells
            .into_iter()
            .filter_map(|cell| {
                let value = cell.lock();
                filter(&*value).then(|| (*value).clone())
            })
            .collect()
    }

    fn cell(&self, key: &K) -> Option<Arc<Mutex<V>>> {
        self.cells.read().get(key).cloned()
    }
}

impl<K, V> Default for AggregateStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug)]
    enum TestError {
        Store(StoreError),
        Rejected,
    }

    impl From<StoreError> for TestError {
        fn from(e: StoreError) -> Self {
            Self::Store(e)
        }
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let store: AggregateStore<u64, u32> = AggregateStore::new();
        store.insert(1, 10).unwrap();
        assert_eq!(store.insert(1, 20), Err(StoreError::AlreadyExists));
        assert_eq!(store.get(&1), Some(10));
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let store: AggregateStore<u64, u32> = AggregateStore::new();
        store.insert(1, 10).unwrap();

        let out: Result<u32, TestError> = store.transaction(&1, |v| {
            *v += 5;
            Ok(*v)
        });

        assert_eq!(out.unwrap(), 15);
        assert_eq!(store.get(&1), Some(15));
    }

    #[test]
    fn test_transaction_rolls_back_on_err() {
        let store: AggregateStore<u64, Vec<u32>> = AggregateStore::new();
        store.insert(1, vec![1]).unwrap();

        let out: Result<(), TestError> = store.transaction(&1, |v| {
            v.push(2);
            v.push(3);
            Err(TestError::Rejected)
        });

        assert!(matches!(out, Err(TestError::Rejected)));
        assert_eq!(store.get(&1), Some(vec![1]));
    }

    #[test]
    fn test_transaction_missing_key() {
        let store: AggregateStore<u64, u32> = AggregateStore::new();
        let out: Result<(), TestError> = store.transaction(&9, |_| Ok(()));
        assert!(matches!(out, Err(TestError::Store(StoreError::NotFound))));
    }

    #[test]
    fn test_concurrent_transactions_serialize_per_key() {
        let store: Arc<AggregateStore<u64, u64>> = Arc::new(AggregateStore::new());
        store.insert(1, 0).unwrap();
        store.insert(2, 0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let key = if i % 2 == 0 { 1 } else { 2 };
                        let _: Result<(), TestError> = store.transaction(&key, |v| {
                            *v += 1;
                            Ok(())
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get(&1), Some(2000));
        assert_eq!(store.get(&2), Some(2000));
    }

    #[test]
    fn test_collect_where() {
        let store: AggregateStore<u64, u32> = AggregateStore::new();
        for i in 0..10 {
            store.insert(i, i as u32).unwrap();
        }
        let mut even = store.collect_where(|v| v % 2 == 0);
        even.sort_unstable();
        assert_eq!(even, vec![0, 2, 4, 6, 8]);
    }
}
