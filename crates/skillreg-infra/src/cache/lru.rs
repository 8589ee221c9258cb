//! In-process LRU content cache (C3, §4.3): the hot tier in front of the
//! object store, keyed by `{owner}_{repo}_{path-or-"root"}`. Concurrent
//! readers are allowed; writers to the same key serialize through a
//! per-key lock so a slow refetch can't be clobbered by a faster one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    Host,
    Registry,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content: String,
    pub content_hash: String,
    pub commit_sha: Option<String>,
    pub source: ContentSource,
    pub cached_at: Instant,
    pub last_accessed_at: Instant,
}

/// What the read path should do given a lookup and the registry's view of
/// the current hash, per §4.3's read-path decision table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// Serve the cached content as-is.
    Serve,
    /// No usable cache entry; the caller must refetch and `put` the result.
    Refetch,
}

const NO_HASH_FRESHNESS_WINDOW: Duration = Duration::from_secs(3600);

/// Decides whether a cached entry (if any) may be served without a
/// refetch. `registry_hash` is `None` when the registry/source returned
/// no hash for this lookup (e.g. a plain file fetch with no ETag).
pub fn decide(entry: Option<&CacheEntry>, registry_hash: Option<&str>, now: Instant) -> CacheDecision {
    let Some(entry) = entry else {
        return CacheDecision::Refetch;
    };

    match registry_hash {
        Some(hash) if hash == entry.content_hash => CacheDecision::Serve,
        Some(_) => CacheDecision::Refetch,
        None if now.saturating_duration_since(entry.cached_at) < NO_HASH_FRESHNESS_WINDOW => CacheDecision::Serve,
        None => CacheDecision::Refetch,
    }
}

/// Bounded, key-locked content cache. `max_items` and `prune_fraction`
/// mirror the CLI-side defaults in §4.3 (100 items, evict oldest 20%).
pub struct ContentCache {
    entries: DashMap<String, CacheEntry>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    max_items: usize,
    prune_fraction: f64,
}

impl ContentCache {
    pub fn new(max_items: usize, prune_fraction: f64) -> Self {
        Self { entries: DashMap::new(), locks: DashMap::new(), max_items, prune_fraction }
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key).map(|e| e.clone());
        if entry.is_some() {
            if let Some(mut e) = self.entries.get_mut(key) {
                e.last_accessed_at = Instant::now();
            }
        }
        entry
    }

    /// Serializes writers to the same key; callers should hold the
    /// returned guard for the duration of a refetch-then-put sequence.
    pub async fn lock_key(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    pub fn put(&self, key: String, entry: CacheEntry) {
        self.entries.insert(key, entry);
        if self.entries.len() > self.max_items {
            self.prune();
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&self) {
        let target_evictions = ((self.entries.len() as f64) * self.prune_fraction).ceil() as usize;
        if target_evictions == 0 {
            return;
        }

        let mut by_access: Vec<(String, Instant)> =
            self.entries.iter().map(|e| (e.key().clone(), e.last_accessed_at)).collect();
        by_access.sort_by_key(|(_, accessed)| *accessed);

        for (key, _) in by_access.into_iter().take(target_evictions) {
            self.entries.remove(&key);
        }
    }
}

/// `{owner}_{repo}_{path-or-"root"}` per §4.3.
pub fn cache_key(owner: &str, repo: &str, path: &str) -> String {
    let path_component = if path.is_empty() { "root" } else { path };
    format!("{owner}_{repo}_{path_component}")
}
