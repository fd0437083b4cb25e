//! One `RepositoryCache` per repository location.
//!
//! The registry hands out shared handles and remembers each instance weakly,
//! so a cache lives exactly as long as somebody holds it. Acquiring with
//! `Retention::Strong` additionally pins the instance inside the registry
//! until a later `Retention::Weak` acquire releases the pin.
//!
//! Construction of a first instance happens under the registry lock, so
//! racing callers for the same unseen location all receive the same cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use crate::error::{AppError, Result};
use crate::git::cache::{CacheConfig, RepositoryCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Reclaimed once the last external handle is dropped
    Weak,
    /// Kept alive by the registry itself
    Strong,
}

type Factory = dyn Fn(&Path) -> Result<RepositoryCache> + Send + Sync;

struct Entry {
    instance: Weak<RepositoryCache>,
    pinned: Option<Arc<RepositoryCache>>,
}

pub struct Registry {
    factory: Box<Factory>,
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

impl Registry {
    /// Registry opening each location with `RepositoryCache::open`.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_factory(move |git_dir| RepositoryCache::open(git_dir, &config))
    }

    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&Path) -> Result<RepositoryCache> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn key(location: &Path) -> PathBuf {
        std::fs::canonicalize(location).unwrap_or_else(|_| location.to_path_buf())
    }

    /// Shared cache for `location`, constructing it on first use.
    pub fn acquire<P: AsRef<Path>>(&self, location: P, retention: Retention) -> Result<Arc<RepositoryCache>> {
        let key = Self::key(location.as_ref());
        let mut entries = self.entries.lock().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;

        entries.retain(|_, entry| entry.instance.strong_count() > 0);

        let cache = match entries.get(&key).and_then(|entry| entry.instance.upgrade()) {
            Some(cache) => cache,
            None => {
                let cache = Arc::new((self.factory)(&key)?);
                entries.insert(
                    key.clone(),
                    Entry {
                        instance: Arc::downgrade(&cache),
                        pinned: None,
                    },
                );
                cache
            }
        };

        if let Some(entry) = entries.get_mut(&key) {
            entry.pinned = match retention {
                Retention::Strong => Some(Arc::clone(&cache)),
                Retention::Weak => None,
            };
        }

        tracing::debug!(
            "requested {}revision cache {:p} for '{}'",
            if retention == Retention::Weak { "weak " } else { "" },
            Arc::as_ptr(&cache),
            key.display()
        );

        Ok(cache)
    }

    /// Whether the registry itself keeps the cache for `location` alive.
    pub fn is_pinned<P: AsRef<Path>>(&self, location: P) -> bool {
        let key = Self::key(location.as_ref());
        self.entries
            .lock()
            .map(|entries| entries.get(&key).is_some_and(|entry| entry.pinned.is_some()))
            .unwrap_or(false)
    }

    /// Number of locations with a live cache.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| {
                entries
                    .values()
                    .filter(|entry| entry.instance.strong_count() > 0)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
