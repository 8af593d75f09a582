//! Expiring key-value cache consumed by reporting collaborators.
//!
//! Keys are built deterministically from an operation name and its
//! parameters so that equal queries share an entry regardless of the order
//! in which parameters were supplied.

mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use memory::InMemoryCache;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Deterministic cache key: `operation(name=value,...)` with parameters
/// sorted by name.
///
/// # Examples
///
///     use tasktrace::cache::CacheKey;
///
///     let key = CacheKey::new("tasks_by_status", [("status", "paused"), ("limit", "10")]);
///     assert_eq!(key.as_str(), "tasks_by_status(limit=10,status=paused)");
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key from an operation name and its parameters.
    #[must_use]
    pub fn new<K, V>(operation: &str, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        let mut pairs: Vec<(String, String)> = params
            .into_iter()
            .map(|(name, value)| (name.into(), value.to_string()))
            .collect();
        pairs.sort();
        let rendered = pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        Self(format!("{operation}({rendered})"))
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Errors returned by cache implementations.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The backing store failed.
    #[error("cache backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl CacheError {
    /// Wraps a backend failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}

/// Expiring key-value cache.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the live value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous entry. Without a
    /// `ttl` the entry never expires.
    async fn set(&self, key: CacheKey, value: Value, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes the entry for `key`. Returns `true` when one was present.
    async fn invalidate(&self, key: &CacheKey) -> CacheResult<bool>;
}
