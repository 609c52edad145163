//! Cache-aside building blocks shared by the resource-specific operations.
//!
//! Cache interactions never return `Result`: a read yields [`CacheLookup`] and a
//! fill or invalidation yields [`BestEffort`], so an accelerator failure cannot
//! be `?`-propagated into a request failure by accident.

use std::future::Future;

use bytes::Bytes;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::{Controller, OpContext};
use crate::application::error::ControllerError;
use crate::application::repos::RepoError;
use crate::cache::{CacheError, ItemRef};
use crate::domain::ResourceKind;

/// Result of consulting the cache for a value.
#[derive(Debug)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
    /// The cache could not answer; callers fall back to the store.
    Unavailable(CacheError),
}

/// Result of a cache mutation that is allowed to fail.
#[must_use = "report skipped cache steps so they show up in logs"]
#[derive(Debug)]
pub enum BestEffort {
    Applied,
    Skipped(CacheError),
}

impl BestEffort {
    pub fn is_applied(&self) -> bool {
        matches!(self, BestEffort::Applied)
    }

    pub(super) fn report(self, op: &'static str, action: &'static str, key: &str) {
        if let BestEffort::Skipped(err) = self {
            report_cache_failure(op, action, key, &err);
        }
    }
}

fn report_cache_failure(op: &'static str, action: &'static str, key: &str, err: &CacheError) {
    warn!(
        target = "seo_svc::controller::cache",
        op,
        action,
        key,
        error = %err,
        "cache step skipped"
    );
    counter!("seo_svc_cache_error_total", "op" => action).increment(1);
}

impl Controller {
    async fn bounded<T, F>(&self, action: &'static str, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        let limit = self.policy.op_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                op: action,
                after: limit,
            }),
        }
    }

    pub(super) async fn lookup<T>(&self, resource: ResourceKind, key: &str) -> CacheLookup<T>
    where
        T: DeserializeOwned,
    {
        let raw = match self.bounded("get", self.cache.get(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!("seo_svc_cache_miss_total", "resource" => resource.as_str()).increment(1);
                return CacheLookup::Miss;
            }
            Err(err) => return CacheLookup::Unavailable(err),
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => {
                counter!("seo_svc_cache_hit_total", "resource" => resource.as_str()).increment(1);
                CacheLookup::Hit(value)
            }
            Err(err) => CacheLookup::Unavailable(CacheError::Codec(err.to_string())),
        }
    }

    pub(super) async fn fill<T>(&self, key: &str, value: &T) -> BestEffort
    where
        T: Serialize,
    {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => return BestEffort::Skipped(CacheError::Codec(err.to_string())),
        };

        match self
            .bounded("set", self.cache.set(key, bytes, self.policy.ttl))
            .await
        {
            Ok(()) => BestEffort::Applied,
            Err(err) => BestEffort::Skipped(err),
        }
    }

    /// Drop the record's own key and every collection key of its resource family.
    pub(super) async fn invalidate(&self, target: ItemRef<'_>) -> BestEffort {
        let item_key = self.keys.item(&target);
        let pattern = self.keys.list_pattern(target.kind());

        let item = self.bounded("delete", self.cache.delete(&item_key)).await;
        let lists = self
            .bounded(
                "invalidate_pattern",
                self.cache.invalidate_pattern(&pattern),
            )
            .await;

        match (item, lists) {
            (Ok(()), Ok(removed)) => {
                debug!(
                    target = "seo_svc::controller::cache",
                    key = %item_key,
                    pattern = %pattern,
                    removed,
                    "invalidated cache entries"
                );
                BestEffort::Applied
            }
            (Err(err), _) | (_, Err(err)) => BestEffort::Skipped(err),
        }
    }

    /// Cache-aside read: cache first, then the store, populating the cache on a store hit.
    ///
    /// Absence is never cached. `load` is only polled on a cache miss.
    pub(super) async fn read_through<T, F>(
        &self,
        ctx: &OpContext,
        op: &'static str,
        resource: ResourceKind,
        key: &str,
        load: F,
    ) -> Result<Option<T>, ControllerError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<Option<T>, RepoError>>,
    {
        match ctx.guard(op, self.lookup::<T>(resource, key)).await? {
            CacheLookup::Hit(value) => return Ok(Some(value)),
            CacheLookup::Miss => {}
            CacheLookup::Unavailable(err) => report_cache_failure(op, "get", key, &err),
        }

        let loaded = ctx
            .guard(op, load)
            .await?
            .map_err(|err| ControllerError::store(op, err))?;

        if let Some(value) = loaded.as_ref() {
            ctx.guard(op, self.fill(key, value))
                .await?
                .report(op, "set", key);
        }

        Ok(loaded)
    }

    /// Post-write invalidation. Cache failures are logged; only the deadline can fail here.
    pub(super) async fn invalidate_after_write(
        &self,
        ctx: &OpContext,
        op: &'static str,
        target: ItemRef<'_>,
    ) -> Result<(), ControllerError> {
        let outcome = ctx.guard(op, self.invalidate(target)).await?;
        outcome.report(op, "invalidate", &self.keys.item(&target));
        Ok(())
    }
}
