//! Two-level memoizing key/value store with TTL expiry.
//!
//! L1 holds entries strongly and is size-bounded. On overflow a fraction of
//! L1 (arbitrary iteration order, deliberately not LRU) is demoted into L2,
//! a strict-capacity tier trimmed in insertion order. A key trimmed out of
//! L2 simply reads as a miss, so demoted-but-hot keys cost at worst one
//! recomputation.
//!
//! # Flow
//!
//! ```text
//! get_or_compute(key)
//!       │
//!       ├─→ L1 hit (unexpired)  → return
//!       ├─→ L2 hit (unexpired)  → promote to L1, return
//!       └─→ miss                → loader(), insert into L1, return
//! ```
//!
//! A key is resident in at most one tier at a time; promotion and demotion
//! move entries, never copy them.
//!
//! # Concurrency
//!
//! All lookups go through `DashMap` shards; no lock spans a full
//! `get_or_compute`, so two threads racing a miss on the same key may both
//! run the loader. Loaders must be pure. No call-coalescing is provided.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::trace;

use crate::config::CacheConfig;
use crate::metrics;

/// A cached value with its absolute expiry instant.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Point-in-time statistics snapshot for one cache instance.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Cache instance name
    pub name: &'static str,
    /// Current L1 entry count
    pub l1_entries: usize,
    /// Current L2 entry count
    pub l2_entries: usize,
    /// Lookups served from either tier
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Entries demoted from L1 on overflow
    pub evictions: u64,
    /// Entries dropped by TTL expiry
    pub expirations: u64,
    /// Entries trimmed out of L2 by its capacity bound
    pub reclaimed: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

/// Generic two-level memoizing cache. See the module docs for the contract.
pub struct TieredCache<K, V> {
    name: &'static str,
    /// L1: strongly held, size-bounded
    l1: DashMap<K, CacheEntry<V>>,
    /// L2: demotion target, trimmed in insertion order
    l2: DashMap<K, CacheEntry<V>>,
    /// L2 insertion order for trimming (may hold stale keys; trimming and
    /// sweeping tolerate that)
    l2_order: Mutex<VecDeque<K>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    reclaimed: AtomicU64,
}

impl<K, V> TieredCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the given instance name (used in metrics labels
    /// and stats snapshots) and configuration.
    pub fn new(name: &'static str, config: CacheConfig) -> Self {
        Self {
            name,
            l1: DashMap::with_capacity(config.l1_max_entries.min(1024)),
            l2: DashMap::new(),
            l2_order: Mutex::new(VecDeque::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
        }
    }

    /// Cache instance name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Default TTL from this cache's config.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.config.default_ttl_secs)
    }

    /// Look up `key`, invoking `loader` on a miss and caching its value for
    /// `ttl`.
    ///
    /// Concurrent misses on the same key may invoke `loader` more than once;
    /// the loader must be pure.
    pub fn get_or_compute<F>(&self, key: K, ttl: Duration, loader: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.find(&key) {
            return value;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_miss(self.name);

        let value = loader();
        self.insert_l1(key, value.clone(), ttl);
        value
    }

    /// Fallible variant of [`get_or_compute`](Self::get_or_compute). A loader
    /// error propagates to the caller and nothing is stored; the next call
    /// runs the loader again. No retry, no negative caching.
    pub fn try_get_or_compute<F, E>(&self, key: K, ttl: Duration, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.find(&key) {
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_miss(self.name);

        match loader() {
            Ok(value) => {
                self.insert_l1(key, value.clone(), ttl);
                Ok(value)
            }
            Err(e) => {
                metrics::record_loader_error(self.name);
                Err(e)
            }
        }
    }

    /// Look up `key` without a loader.
    ///
    /// Returns `None` when no live entry exists in either tier. A "cached
    /// absent" value is expressed by choosing `V = Option<T>`: the outer
    /// `Option` here is the presence sentinel, the inner one the cached
    /// answer.
    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.find(key);
        if found.is_none() {
            self.misses.fetch_add(1, Ordering::Relaxed);
            metrics::record_miss(self.name);
        }
        found
    }

    /// Unconditionally insert into L1, evicting first if L1 is full.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        self.insert_l1(key, value, ttl);
    }

    /// Remove `key` from both tiers.
    pub fn invalidate(&self, key: &K) {
        self.l1.remove(key);
        self.l2.remove(key);
    }

    /// Remove every key for which `pred` returns true, from both tiers.
    pub fn invalidate_matching<F>(&self, mut pred: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.l1.retain(|k, _| !pred(k));
        self.l2.retain(|k, _| !pred(k));
        self.l2_order.lock().retain(|k| !pred(k));
    }

    /// Drop everything from both tiers. Counters are preserved.
    pub fn clear(&self) {
        self.l1.clear();
        self.l2.clear();
        self.l2_order.lock().clear();
    }

    /// Current L1 entry count.
    pub fn l1_len(&self) -> usize {
        self.l1.len()
    }

    /// Current L2 entry count.
    pub fn l2_len(&self) -> usize {
        self.l2.len()
    }

    /// Total live-or-expired entries across both tiers.
    pub fn len(&self) -> usize {
        self.l1.len() + self.l2.len()
    }

    /// True when both tiers are empty.
    pub fn is_empty(&self) -> bool {
        self.l1.is_empty() && self.l2.is_empty()
    }

    /// Demote one eviction batch out of L1 right now, regardless of fill
    /// level. Used by proactive cleanup when a cache exceeds its ceiling.
    pub fn evict_batch(&self) -> usize {
        self.evict_l1_batch()
    }

    /// Remove expired entries from both tiers and drop stale L2 order-queue
    /// debris. Returns how many entries were removed. Called by the
    /// [`Sweeper`](crate::Sweeper); safe to call from anywhere.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.l1.len() + self.l2.len();
        self.l1.retain(|_, entry| entry.is_live(now));
        self.l2.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.l1.len() + self.l2.len());
        if removed > 0 {
            self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
            metrics::record_expirations(self.name, removed);
        }

        // Promotion leaves keys behind in the order queue; compact it so it
        // cannot grow past the live L2 population.
        {
            let mut order = self.l2_order.lock();
            if order.len() > self.l2.len() {
                order.retain(|k| self.l2.contains_key(k));
            }
        }

        metrics::set_tier_entries(self.name, "L1", self.l1.len());
        metrics::set_tier_entries(self.name, "L2", self.l2.len());
        metrics::set_hit_rate(self.name, self.stats().hit_rate);

        trace!(cache = self.name, removed, "sweep pass");
        removed
    }

    /// Point-in-time statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            name: self.name,
            l1_entries: self.l1.len(),
            l2_entries: self.l2.len(),
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            reclaimed: self.reclaimed.load(Ordering::Relaxed),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// The L1 → L2 lookup chain shared by `get` and `get_or_compute`.
    /// Records hits; leaves miss accounting to the caller.
    fn find(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        if let Some(entry) = self.l1.get(key) {
            if entry.is_live(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_hit(self.name, "L1");
                return Some(entry.value.clone());
            }
            // Expired in place; drop the read guard before removing.
            drop(entry);
            if self.l1.remove(key).is_some() {
                self.expirations.fetch_add(1, Ordering::Relaxed);
            }
        }

        // L2 hit promotes: take ownership out of L2 and move into L1. The
        // order queue keeps a stale key; trim and sweep tolerate that.
        if let Some((key, entry)) = self.l2.remove(key) {
            if entry.is_live(now) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_hit(self.name, "L2");
                let value = entry.value.clone();
                self.make_room_in_l1();
                self.l1.insert(key, entry);
                return Some(value);
            }
            self.expirations.fetch_add(1, Ordering::Relaxed);
        }

        None
    }

    fn insert_l1(&self, key: K, value: V, ttl: Duration) {
        // Evict before clearing L2: the eviction batch may demote this very
        // key's old L1 copy, and the key must not stay behind in L2.
        self.make_room_in_l1();
        self.l2.remove(&key);
        self.l1.insert(key, CacheEntry::new(value, ttl));
    }

    fn make_room_in_l1(&self) {
        if self.l1.len() >= self.config.l1_max_entries {
            self.evict_l1_batch();
        }
    }

    /// Demote one batch of L1 entries into L2, in whatever order the map
    /// iterates. Expired victims are dropped instead of demoted. Returns how
    /// many entries were demoted.
    fn evict_l1_batch(&self) -> usize {
        let batch = self.config.eviction_batch();
        let victims: Vec<K> = self
            .l1
            .iter()
            .take(batch)
            .map(|entry| entry.key().clone())
            .collect();

        let now = Instant::now();
        let mut demoted = 0usize;
        for key in victims {
            if let Some((key, entry)) = self.l1.remove(&key) {
                if entry.is_live(now) {
                    self.l2.insert(key.clone(), entry);
                    self.l2_order.lock().push_back(key);
                    demoted += 1;
                } else {
                    self.expirations.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        if demoted > 0 {
            self.evictions.fetch_add(demoted as u64, Ordering::Relaxed);
            metrics::record_evictions(self.name, demoted);
        }
        self.trim_l2();
        demoted
    }

    /// Keep L2 within its capacity bound by dropping oldest-inserted keys.
    fn trim_l2(&self) {
        if self.l2.len() <= self.config.l2_max_entries {
            return;
        }
        let mut order = self.l2_order.lock();
        let mut dropped = 0u64;
        while self.l2.len() > self.config.l2_max_entries {
            match order.pop_front() {
                Some(old) => {
                    if self.l2.remove(&old).is_some() {
                        dropped += 1;
                    }
                }
                None => break,
            }
        }
        if dropped > 0 {
            self.reclaimed.fetch_add(dropped, Ordering::Relaxed);
        }
    }
}

impl<V: Clone> TieredCache<String, V> {
    /// Remove every key starting with `prefix`, from both tiers.
    pub fn invalidate_by_prefix(&self, prefix: &str) {
        self.invalidate_matching(|k| k.starts_with(prefix));
    }
}
