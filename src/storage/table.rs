//! In-memory row table with per-row locks
//!
//! The table map is only locked long enough to find, insert or remove a row
//! handle. Reads and writes of a row's contents take that row's own mutex, so
//! callers working on different keys never wait on each other.
//!
//! Writes go through [`RowTable::transact`]: the closure works on a staged
//! copy of the row while the row lock is held, and the copy replaces the row
//! only if the closure returns `Ok`. An `Err` leaves the row untouched.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::{StoreError, StoreResult};

// `None` marks a row removed while another caller still held its handle.
type Row<V> = Arc<Mutex<Option<V>>>;

/// A keyed table whose rows are locked individually
pub struct RowTable<K, V> {
    name: &'static str,
    rows: RwLock<HashMap<K, Row<V>>>,
}

impl<K, V> RowTable<K, V>
where
    K: Copy + Eq + Hash,
    V: Clone,
{
    /// Create an empty table; `name` is used in error messages
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the table contents
    pub fn load(&self, rows: impl IntoIterator<Item = (K, V)>) -> StoreResult<()> {
        let mut map = self
            .rows
            .write()
            .map_err(|_| StoreError::lock_poisoned(self.name))?;

        map.clear();
        for (key, value) in rows {
            map.insert(key, Arc::new(Mutex::new(Some(value))));
        }
        Ok(())
    }

    fn handle(&self, key: K) -> StoreResult<Option<Row<V>>> {
        let map = self
            .rows
            .read()
            .map_err(|_| StoreError::lock_poisoned(self.name))?;
        Ok(map.get(&key).cloned())
    }

    fn lock<'r>(&self, row: &'r Row<V>) -> StoreResult<MutexGuard<'r, Option<V>>> {
        row.lock().map_err(|_| StoreError::lock_poisoned(self.name))
    }

    /// Get a copy of a row
    pub fn get(&self, key: K) -> StoreResult<Option<V>> {
        match self.handle(key)? {
            Some(row) => Ok(self.lock(&row)?.clone()),
            None => Ok(None),
        }
    }

    /// Check if a row exists
    pub fn contains(&self, key: K) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Insert a row that must not already exist
    ///
    /// Returns `false` and leaves the table untouched if the key is taken.
    pub fn insert_new(&self, key: K, value: V) -> StoreResult<bool> {
        let mut map = self
            .rows
            .write()
            .map_err(|_| StoreError::lock_poisoned(self.name))?;

        if let Some(existing) = map.get(&key) {
            if self.lock(existing)?.is_some() {
                return Ok(false);
            }
        }
        map.insert(key, Arc::new(Mutex::new(Some(value))));
        Ok(true)
    }

    /// Insert `init()` if the key has no row yet
    pub fn ensure(&self, key: K, init: impl FnOnce() -> V) -> StoreResult<()> {
        if self.handle(key)?.is_some() {
            return Ok(());
        }
        let mut map = self
            .rows
            .write()
            .map_err(|_| StoreError::lock_poisoned(self.name))?;
        map.entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(Some(init()))));
        Ok(())
    }

    /// Remove a row, returning its last contents
    pub fn remove(&self, key: K) -> StoreResult<Option<V>> {
        let row = {
            let mut map = self
                .rows
                .write()
                .map_err(|_| StoreError::lock_poisoned(self.name))?;
            map.remove(&key)
        };

        match row {
            Some(row) => Ok(self.lock(&row)?.take()),
            None => Ok(None),
        }
    }

    /// Run `f` against a staged copy of the row under the row lock
    ///
    /// The staged copy is written back only when `f` returns `Ok`. Returns
    /// `Ok(None)` if the row does not exist.
    pub fn transact<R, F>(&self, key: K, f: F) -> StoreResult<Option<R>>
    where
        F: FnOnce(&mut V) -> StoreResult<R>,
    {
        let Some(row) = self.handle(key)? else {
            return Ok(None);
        };
        let mut guard = self.lock(&row)?;
        let Some(current) = guard.as_ref() else {
            return Ok(None);
        };

        let mut staged = current.clone();
        let result = f(&mut staged)?;
        *guard = Some(staged);
        Ok(Some(result))
    }

    /// Copies of every row
    ///
    /// Each row is locked only while it is cloned, so the result is not a
    /// point-in-time view across rows.
    pub fn snapshot(&self) -> StoreResult<Vec<V>> {
        let handles: Vec<Row<V>> = {
            let map = self
                .rows
                .read()
                .map_err(|_| StoreError::lock_poisoned(self.name))?;
            map.values().cloned().collect()
        };

        let mut values = Vec::with_capacity(handles.len());
        for row in &handles {
            if let Some(value) = self.lock(row)?.clone() {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Keys matching a predicate
    pub fn keys_where(&self, pred: impl Fn(&K) -> bool) -> StoreResult<Vec<K>> {
        let map = self
            .rows
            .read()
            .map_err(|_| StoreError::lock_poisoned(self.name))?;
        Ok(map.keys().filter(|k| pred(k)).copied().collect())
    }

    /// Count rows
    pub fn len(&self) -> StoreResult<usize> {
        let map = self
            .rows
            .read()
            .map_err(|_| StoreError::lock_poisoned(self.name))?;
        Ok(map.len())
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}
