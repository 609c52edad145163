use std::time::Duration;

use crate::config::CacheSettings;

const DEFAULT_TTL_SECS: u64 = 3600;
const DEFAULT_OP_TIMEOUT_MS: u64 = 250;

/// How the controller uses the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Lifetime of populated entries; bounds staleness when an invalidation is lost.
    pub ttl: Duration,
    /// Upper bound for a single cache round trip before it counts as unavailable.
    pub op_timeout: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            op_timeout: Duration::from_millis(DEFAULT_OP_TIMEOUT_MS),
        }
    }
}

impl From<&CacheSettings> for CachePolicy {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            op_timeout: settings.op_timeout,
        }
    }
}
