//! Cache backends for the cache-aside controller.
//!
//! The cache is an accelerator only: every value here can be rebuilt from the
//! store, so backends may lose entries at any time. Three backends exist:
//!
//! - [`RedisCache`]: shared cache for multi-instance deployments
//! - [`MemoryCache`]: process-local cache with TTL expiry
//! - [`NullCache`]: caching disabled; every lookup misses

mod config;
mod keys;
mod memory;
mod null;
mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use config::CachePolicy;
pub use keys::{CacheKeys, ItemRef, escape_segment};
pub use memory::MemoryCache;
pub use null::NullCache;
pub use redis_cache::RedisCache;

pub(crate) use keys::glob_match;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache operation `{op}` timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
    #[error("cached value could not be decoded: {0}")]
    Codec(String),
    #[error("cache is closed")]
    Closed,
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Key-value store with TTL expiry and prefix-pattern invalidation.
///
/// Patterns use Redis glob syntax; callers only ever pass patterns produced by
/// [`CacheKeys`], whose identity segments are escaped.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key matching `pattern`, returning how many were removed.
    async fn invalidate_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    async fn close(&self);
}
