//! Fixed-capacity key/value cache with first-in-first-out eviction.
//!
//! Used for commit messages and object sizes, both immutable for a given id,
//! so entries only ever leave the cache through eviction. Re-setting an
//! existing key replaces the value but keeps its original queue position.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;

use crate::error::{AppError, Result};

pub struct BoundedCache<K, V> {
    capacity: usize,
    inner: Mutex<Inner<K, V>>,
}

struct Inner<K, V> {
    entries: HashMap<K, V>,
    /// Keys in first-insertion order
    fifo: VecDeque<K>,
}

impl<K, V> Inner<K, V> {
    fn consistent(&self) -> bool {
        self.entries.len() == self.fifo.len()
    }
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(capacity),
                fifo: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let inner = self.inner.lock().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        Ok(inner.entries.get(key).cloned())
    }

    pub fn set(&self, key: K, value: V) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        debug_assert!(inner.consistent());

        if !inner.entries.contains_key(&key) {
            inner.fifo.push_back(key.clone());
        }
        inner.entries.insert(key, value);

        while inner.fifo.len() > self.capacity {
            if let Some(oldest) = inner.fifo.pop_front() {
                inner.entries.remove(&oldest);
            }
        }

        debug_assert!(inner.consistent());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
