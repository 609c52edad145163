//! Cache-aside controller shared by the HTTP and gRPC adapters.
//!
//! Reads consult the cache before the store and populate it on a store hit.
//! Writes go to the store first and then invalidate the record's key together
//! with every collection key of its resource family. The store is the only
//! source of truth; the cache may be empty, stale within its TTL, or down.

mod cache_aside;
mod context;
mod pages;
mod seo;

use std::sync::Arc;

pub use cache_aside::{BestEffort, CacheLookup};
pub use context::OpContext;

use crate::application::repos::Stores;
use crate::cache::{CacheBackend, CacheKeys, CachePolicy};

#[derive(Clone)]
pub struct Controller {
    stores: Stores,
    cache: Arc<dyn CacheBackend>,
    keys: CacheKeys,
    policy: CachePolicy,
}

impl Controller {
    pub fn new(
        stores: Stores,
        cache: Arc<dyn CacheBackend>,
        keys: CacheKeys,
        policy: CachePolicy,
    ) -> Self {
        Self {
            stores,
            cache,
            keys,
            policy,
        }
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.name()
    }

    /// Release the cache connection; called once during shutdown.
    pub async fn close(&self) {
        self.cache.close().await;
    }
}
