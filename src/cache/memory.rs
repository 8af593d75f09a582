//! In-process cache with clock-driven expiry.

use super::{Cache, CacheError, CacheKey, CacheResult};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Thread-safe in-memory cache.
///
/// Expired entries are dropped lazily when read.
#[derive(Debug, Clone)]
pub struct InMemoryCache<C>
where
    C: Clock + Send + Sync,
{
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    clock: Arc<C>,
}

impl<C> InMemoryCache<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    fn write(&self) -> CacheResult<RwLockWriteGuard<'_, HashMap<CacheKey, CacheEntry>>> {
        self.entries
            .write()
            .map_err(|err| CacheError::backend(std::io::Error::other(err.to_string())))
    }
}

/// Returns the expiry instant, or `None` when the entry never expires or the
/// deadline is beyond what the timestamp type can represent.
fn deadline(now: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    let delta = TimeDelta::from_std(ttl?).ok()?;
    now.checked_add_signed(delta)
}

#[async_trait]
impl<C> Cache for InMemoryCache<C>
where
    C: Clock + Send + Sync,
{
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>> {
        let now = self.clock.utc();
        let mut entries = self.write()?;
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.is_live(now) {
            return Ok(Some(entry.value.clone()));
        }
        entries.remove(key);
        Ok(None)
    }

    async fn set(&self, key: CacheKey, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = deadline(self.clock.utc(), ttl);
        self.write()?.insert(key, CacheEntry { value, expires_at });
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.write()?.remove(key).is_some())
    }
}
