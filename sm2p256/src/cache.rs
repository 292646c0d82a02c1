//! Bounded cache of public-key comb tables.

use crate::{arithmetic::PrecomputedTable, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::{
    fmt,
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Cache key: the public point's `X || Y` big-endian coordinates.
pub type Fingerprint = [u8; 64];

/// Counters describing cache effectiveness.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,

    /// Lookups which had to build a table.
    pub misses: u64,

    /// Entries dropped to stay within capacity.
    pub evictions: u64,
}

/// Least-recently-used map from key fingerprints to shared tables.
///
/// Safe for concurrent use. Tables are built outside the lock, so two threads
/// missing on the same key at once may both build it; the first insert wins
/// and both callers receive that table. A failed build leaves the cache
/// untouched.
pub struct TableCache {
    entries: Mutex<LruCache<Fingerprint, Arc<PrecomputedTable>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl TableCache {
    /// Create an empty cache holding at most `capacity` tables.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a table, marking it most recently used.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<PrecomputedTable>> {
        let table = self.entries.lock().get(fingerprint).cloned();

        if table.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        table
    }

    /// Return the cached table for `fingerprint`, building and inserting it
    /// with `builder` on a miss.
    pub fn get_or_build<F>(
        &self,
        fingerprint: &Fingerprint,
        builder: F,
    ) -> Result<Arc<PrecomputedTable>>
    where
        F: FnOnce() -> Result<PrecomputedTable>,
    {
        if let Some(table) = self.get(fingerprint) {
            tracing::trace!("key table cache hit");
            return Ok(table);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("key table cache miss, building table");

        let table = Arc::new(builder()?);
        Ok(self.insert(fingerprint, table))
    }

    /// Insert a table unless one is already present, returning the table
    /// which ends up cached.
    pub fn insert(
        &self,
        fingerprint: &Fingerprint,
        table: Arc<PrecomputedTable>,
    ) -> Arc<PrecomputedTable> {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(fingerprint) {
            return Arc::clone(existing);
        }

        if entries.push(*fingerprint, Arc::clone(&table)).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(len = entries.len(), "evicted least recently used key table");
        }

        table
    }

    /// Is a table for `fingerprint` cached? Does not affect recency.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.lock().contains(fingerprint)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Is the cache empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached tables.
    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.lock().cap()
    }

    /// Snapshot of the hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for TableCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}
