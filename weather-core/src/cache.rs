//! Per-query memoization for provider results.
//!
//! Each key owns a [`OnceCell`], so concurrent requests for the same uncached
//! key share a single computation. Entries expire after an optional TTL and
//! the oldest insertion is evicted once the cache is full.

use parking_lot::Mutex;
use std::{collections::HashMap, fmt::Debug, future::Future, hash::Hash, sync::Arc, time::Duration};
use tokio::{sync::OnceCell, time::Instant};

#[derive(Debug)]
struct Entry<V> {
    cell: Arc<OnceCell<V>>,
    inserted: Instant,
}

#[derive(Debug)]
pub struct QueryCache<K, V> {
    name: &'static str,
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// `ttl` of `None` keeps entries for the life of the process.
    pub fn new(name: &'static str, ttl: Option<Duration>, max_entries: usize) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Return the value cached under `key`, or run `compute` and cache its
    /// output. Errors are returned to the caller and leave nothing cached.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.slot(key.clone());
        match cell.get_or_try_init(compute).await {
            Ok(value) => Ok(value.clone()),
            Err(err) => {
                self.discard_empty(&key, &cell);
                Err(err)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: K) -> Arc<OnceCell<V>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(&key) {
            if !self.is_expired(entry, now) {
                if entry.cell.initialized() {
                    tracing::debug!(cache = self.name, ?key, "cache hit");
                }
                return Arc::clone(&entry.cell);
            }
            tracing::debug!(cache = self.name, ?key, "cache entry expired");
            entries.remove(&key);
        }

        if entries.len() >= self.max_entries {
            entries.retain(|_, entry| !self.is_expired(entry, now));
        }
        if entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.inserted)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                tracing::debug!(cache = self.name, key = ?oldest, "evicting oldest cache entry");
                entries.remove(&oldest);
            }
        }

        tracing::debug!(cache = self.name, ?key, "cache miss");
        let cell = Arc::new(OnceCell::new());
        entries.insert(
            key,
            Entry {
                cell: Arc::clone(&cell),
                inserted: now,
            },
        );
        cell
    }

    /// Drop the slot for `key` if it is still `cell` and was never filled.
    fn discard_empty(&self, key: &K, cell: &Arc<OnceCell<V>>) {
        let mut entries = self.entries.lock();
        let unfilled = entries
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.cell, cell) && !entry.cell.initialized());
        if unfilled {
            entries.remove(key);
        }
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.duration_since(entry.inserted) >= ttl)
    }
}
