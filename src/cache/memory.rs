use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheBackend, CacheError, glob_match};
use crate::util::lock;

/// Capacity used when no explicit limit is configured.
pub const DEFAULT_MAX_ENTRIES: NonZeroUsize = match NonZeroUsize::new(10_000) {
    Some(limit) => limit,
    None => NonZeroUsize::MIN,
};

/// Number of writes between full sweeps of expired entries.
const SWEEP_INTERVAL: usize = 128;

const TABLE: &str = "memory_cache";

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Process-local cache bounded by entry count.
///
/// Least recently used entries are evicted at capacity. Expired entries are
/// dropped on read and swept periodically from `set`, and before any eviction.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<LruCache<String, Entry>>,
    writes_since_sweep: AtomicUsize,
    closed: AtomicBool,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(max_entries)),
            writes_since_sweep: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        lock::read(&self.entries, TABLE, "capacity").cap()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        lock::read(&self.entries, TABLE, "len")
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .count()
    }

    /// Number of stored entries, expired ones included.
    pub fn retained(&self) -> usize {
        lock::read(&self.entries, TABLE, "retained").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks presence without touching recency.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        lock::read(&self.entries, TABLE, "contains_key")
            .peek(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = lock::write(&self.entries, TABLE, "purge_expired");
        let removed = sweep(&mut entries, Instant::now());
        self.writes_since_sweep.store(0, Ordering::Relaxed);
        removed
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }
}

fn sweep(entries: &mut LruCache<String, Entry>, now: Instant) -> usize {
    let expired: Vec<String> = entries
        .iter()
        .filter(|(_, entry)| !entry.is_live(now))
        .map(|(key, _)| key.clone())
        .collect();
    for key in &expired {
        entries.pop(key);
    }
    if !expired.is_empty() {
        debug!(
            target = "seo_svc::cache::memory",
            removed = expired.len(),
            "swept expired entries"
        );
    }
    expired.len()
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut entries = lock::write(&self.entries, TABLE, "get");

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        entries.pop(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_open()?;
        let mut entries = lock::write(&self.entries, TABLE, "set");
        if ttl.is_zero() {
            entries.pop(key);
            return Ok(());
        }

        let now = Instant::now();
        let writes = self.writes_since_sweep.fetch_add(1, Ordering::Relaxed) + 1;
        let full = entries.len() >= entries.cap().get() && !entries.contains(key);
        if full || writes >= SWEEP_INTERVAL {
            sweep(&mut entries, now);
            self.writes_since_sweep.store(0, Ordering::Relaxed);
        }

        let entry = Entry {
            value,
            expires_at: now + ttl,
        };
        if let Some((evicted, _)) = entries.push(key.to_string(), entry) {
            if evicted != key {
                debug!(
                    target = "seo_svc::cache::memory",
                    key = %evicted,
                    "evicted least recently used entry"
                );
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.ensure_open()?;
        lock::write(&self.entries, TABLE, "delete").pop(key);
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        self.ensure_open()?;
        let mut entries = lock::write(&self.entries, TABLE, "invalidate_pattern");
        let matched: Vec<String> = entries
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &matched {
            entries.pop(key);
        }
        let removed = matched.len() as u64;
        debug!(
            target = "seo_svc::cache::memory",
            pattern, removed, "invalidated keys by pattern"
        );
        Ok(removed)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        lock::write(&self.entries, TABLE, "close").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("k", Bytes::from_static(b"v"), Duration::from_secs(10))
            .await
            .expect("set");

        assert_eq!(
            cache.get("k").await.expect("get"),
            Some(Bytes::from_static(b"v"))
        );

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k").await.expect("get"), None);
        assert!(cache.is_empty());
        assert_eq!(cache.retained(), 0);
    }

    #[tokio::test]
    async fn entry_count_never_exceeds_capacity() {
        let cache = MemoryCache::with_capacity(limit(3));
        let ttl = Duration::from_secs(60);
        for key in ["a", "b", "c"] {
            cache
                .set(key, Bytes::from_static(b"x"), ttl)
                .await
                .expect("set");
        }
        // Touch `a` so `b` becomes the eviction candidate.
        cache.get("a").await.expect("get");

        for i in 0..50 {
            cache
                .set(&format!("extra-{i}"), Bytes::from_static(b"x"), ttl)
                .await
                .expect("set");
            assert!(cache.retained() <= 3);
        }
        assert_eq!(cache.capacity(), limit(3));
        assert!(!cache.contains_key("b"));
        assert!(cache.contains_key("extra-49"));
    }

    #[tokio::test]
    async fn recently_read_entries_outlive_idle_ones() {
        let cache = MemoryCache::with_capacity(limit(2));
        let ttl = Duration::from_secs(60);
        cache.set("old", Bytes::from_static(b"1"), ttl).await.expect("set");
        cache.set("hot", Bytes::from_static(b"2"), ttl).await.expect("set");
        cache.get("old").await.expect("get");

        cache.set("new", Bytes::from_static(b"3"), ttl).await.expect("set");

        assert!(cache.contains_key("old"));
        assert!(!cache.contains_key("hot"));
        assert!(cache.contains_key("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_swept_by_later_writes() {
        let cache = MemoryCache::with_capacity(limit(10_000));
        for i in 0..10_000 {
            cache
                .set(&format!("k{i}"), Bytes::from_static(b"x"), Duration::from_secs(1))
                .await
                .expect("set");
        }
        assert_eq!(cache.retained(), 10_000);

        tokio::time::advance(Duration::from_secs(3_600)).await;
        cache
            .set("fresh", Bytes::from_static(b"y"), Duration::from_secs(60))
            .await
            .expect("set");

        assert_eq!(cache.retained(), 1);
        assert!(cache.contains_key("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_sweep_runs_below_capacity() {
        let cache = MemoryCache::with_capacity(limit(1_000));
        for i in 0..10 {
            cache
                .set(&format!("short-{i}"), Bytes::from_static(b"x"), Duration::from_secs(1))
                .await
                .expect("set");
        }
        tokio::time::advance(Duration::from_secs(2)).await;

        for i in 0..SWEEP_INTERVAL {
            cache
                .set(&format!("long-{i}"), Bytes::from_static(b"x"), Duration::from_secs(60))
                .await
                .expect("set");
        }

        assert_eq!(cache.retained(), SWEEP_INTERVAL);
        assert_eq!(cache.purge_expired(), 0);
    }

    #[tokio::test]
    async fn pattern_invalidation_removes_only_matches() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        for key in ["ns:page:list", "ns:page:list:recent", "ns:page:item:list"] {
            cache
                .set(key, Bytes::from_static(b"x"), ttl)
                .await
                .expect("set");
        }

        let removed = cache
            .invalidate_pattern("ns:page:list*")
            .await
            .expect("invalidate");

        assert_eq!(removed, 2);
        assert!(cache.contains_key("ns:page:item:list"));
        assert!(!cache.contains_key("ns:page:list"));
    }

    #[tokio::test]
    async fn closed_cache_refuses_operations() {
        let cache = MemoryCache::new();
        cache.close().await;
        assert!(matches!(cache.get("k").await, Err(CacheError::Closed)));
        assert!(matches!(
            cache.set("k", Bytes::new(), Duration::from_secs(1)).await,
            Err(CacheError::Closed)
        ));
    }
}
