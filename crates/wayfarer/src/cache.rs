//! Bounded LRU cache over resolved route chains.
//!
//! Keyed by the normalized request path. Safe to share across requests
//! because the route table is immutable per process: a chain resolved once
//! is a chain resolved forever.
//!
//! Entries fall into two eviction classes. Chains that resolved to nothing
//! (or only to the ultimate catch) are "known-empty" and get reclaimed
//! before any real entry. Clients probing arbitrary non-existent paths can
//! only displace other probes, never real routes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use tracing::debug;
use wayfarer_router::{normalize_path, ResolvedChain};

/// Default capacity. Route shapes, not data, are cached, so entries are
/// small and the bound is generous.
pub const DEFAULT_CAPACITY: usize = 500_000;

struct CacheEntry {
    chain: Arc<ResolvedChain>,
    /// Recency tick at last touch; also the entry's key in its class index.
    tick: u64,
    known_empty: bool,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Recency index per class: tick -> path. Lowest tick = least recent.
    normal: BTreeMap<u64, String>,
    known_empty: BTreeMap<u64, String>,
    next_tick: u64,
}

impl CacheInner {
    fn touch(&mut self, path: &str) -> Option<Arc<ResolvedChain>> {
        let tick = self.next_tick;
        let entry = self.entries.get_mut(path)?;
        self.next_tick += 1;

        let index = if entry.known_empty {
            &mut self.known_empty
        } else {
            &mut self.normal
        };
        index.remove(&entry.tick);
        index.insert(tick, path.to_string());
        entry.tick = tick;

        Some(entry.chain.clone())
    }

    fn evict_one(&mut self) {
        // Known-empty entries go first; real routes are only displaced by
        // other real routes.
        let victim = self
            .known_empty
            .pop_first()
            .or_else(|| self.normal.pop_first());
        if let Some((_, path)) = victim {
            self.entries.remove(&path);
        }
    }

    fn insert(&mut self, path: String, chain: Arc<ResolvedChain>, capacity: usize) {
        if let Some(existing) = self.entries.get(&path) {
            let tick = existing.tick;
            if existing.known_empty {
                self.known_empty.remove(&tick);
            } else {
                self.normal.remove(&tick);
            }
            self.entries.remove(&path);
        }

        while self.entries.len() >= capacity {
            self.evict_one();
        }

        let tick = self.next_tick;
        self.next_tick += 1;
        let known_empty = chain.is_not_found();
        if known_empty {
            self.known_empty.insert(tick, path.clone());
        } else {
            self.normal.insert(tick, path.clone());
        }
        self.entries.insert(
            path,
            CacheEntry {
                chain,
                tick,
                known_empty,
            },
        );
    }
}

/// Shared, bounded, two-class LRU of resolved chains.
pub struct RouteCache {
    capacity: usize,
    inner: RwLock<CacheInner>,
}

impl Default for RouteCache {
    fn default() -> Self {
        RouteCache::new(DEFAULT_CAPACITY)
    }
}

impl RouteCache {
    pub fn new(capacity: usize) -> Self {
        RouteCache {
            capacity: capacity.max(1),
            inner: RwLock::new(CacheInner::default()),
        }
    }

    /// Looks up the chain for a request path, bumping its recency.
    pub fn get(&self, path: &str) -> Option<Arc<ResolvedChain>> {
        let key = normalize_path(path);
        let hit = self
            .inner
            .write()
            .expect("route cache lock poisoned")
            .touch(key.as_ref());
        debug!(path = key.as_ref(), hit = hit.is_some(), "route cache lookup");
        hit
    }

    /// Inserts a resolved chain under the normalized path.
    pub fn insert(&self, path: &str, chain: ResolvedChain) -> Arc<ResolvedChain> {
        let key = normalize_path(path).into_owned();
        let chain = Arc::new(chain);
        self.inner
            .write()
            .expect("route cache lock poisoned")
            .insert(key, chain.clone(), self.capacity);
        chain
    }

    /// Returns the cached chain for `path`, computing and caching it on a
    /// miss. The computation runs outside the lock. Two requests racing on
    /// the same cold path may both compute, which is wasted work but never
    /// incorrect: the chain is a pure function of the path.
    pub fn get_or_compute_with(
        &self,
        path: &str,
        compute: impl FnOnce() -> ResolvedChain,
    ) -> Arc<ResolvedChain> {
        if let Some(chain) = self.get(path) {
            return chain;
        }
        self.insert(path, compute())
    }

    /// Total cached entries.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("route cache lock poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in the known-empty (spam-protection) class.
    pub fn known_empty_len(&self) -> usize {
        self.inner
            .read()
            .expect("route cache lock poisoned")
            .known_empty
            .len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("route cache lock poisoned");
        *inner = CacheInner::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wayfarer_router::{resolve, RouteDefinition, RouteTable};

    fn table() -> RouteTable {
        RouteTable::new(vec![
            RouteDefinition::new("/*", "pages/catch-all"),
            RouteDefinition::new("/lion", "pages/lion"),
            RouteDefinition::new("/tiger", "pages/tiger"),
            RouteDefinition::new("/zebra", "pages/zebra"),
        ])
        .unwrap()
    }

    #[test]
    fn hit_after_insert() {
        let cache = RouteCache::new(16);
        let table = table();
        let chain = cache.get_or_compute_with("/lion", || resolve(&table, "/lion"));
        let again = cache.get("/lion").unwrap();
        assert_eq!(*chain, *again);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn key_is_normalized() {
        let cache = RouteCache::new(16);
        let table = table();
        cache.get_or_compute_with("/lion/", || resolve(&table, "/lion/"));
        assert!(cache.get("/lion").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cached_chain_equals_fresh_computation() {
        let cache = RouteCache::new(16);
        let table = table();
        let first = cache.get_or_compute_with("/tiger", || resolve(&table, "/tiger"));
        let second = cache.get_or_compute_with("/tiger", || unreachable!("must be a hit"));
        assert_eq!(*first, resolve(&table, "/tiger"));
        assert_eq!(first, second);
    }

    #[test]
    fn known_empty_entries_are_evicted_first() {
        let cache = RouteCache::new(3);
        let table = table();

        cache.get_or_compute_with("/lion", || resolve(&table, "/lion"));
        cache.get_or_compute_with("/spam-1", || resolve(&table, "/spam-1"));
        cache.get_or_compute_with("/spam-2", || resolve(&table, "/spam-2"));
        assert_eq!(cache.known_empty_len(), 2);

        // Full. The next insert must displace a spam entry, not /lion,
        // even though /lion is the least recently used entry overall.
        cache.get_or_compute_with("/tiger", || resolve(&table, "/tiger"));
        assert_eq!(cache.len(), 3);
        assert!(cache.get("/lion").is_some());
        assert!(cache.get("/tiger").is_some());
        assert_eq!(cache.known_empty_len(), 1);
    }

    #[test]
    fn lru_order_within_a_class() {
        let cache = RouteCache::new(2);
        let table = table();

        cache.get_or_compute_with("/lion", || resolve(&table, "/lion"));
        cache.get_or_compute_with("/tiger", || resolve(&table, "/tiger"));
        // Touch /lion so /tiger becomes least recent.
        cache.get("/lion");

        cache.get_or_compute_with("/zebra", || resolve(&table, "/zebra"));
        assert!(cache.get("/lion").is_some());
        assert!(cache.get("/tiger").is_none());
        assert!(cache.get("/zebra").is_some());
    }

    #[test]
    fn clear_resets_everything() {
        let cache = RouteCache::new(8);
        let table = table();
        cache.get_or_compute_with("/lion", || resolve(&table, "/lion"));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.known_empty_len(), 0);
    }
}
