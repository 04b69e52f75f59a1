//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::storage::CacheStorage;
use super::traits::{CacheEntry, CacheResult};

/// Entries older than this many minutes are treated as absent.
pub const DEFAULT_TTL_MINUTES: i64 = 60;

/// Cache layer that manages expiry and network fetching.
///
/// This layer sits between the storefront and the content client. It never
/// fails: caching is an optimization, so storage and parse problems are logged
/// and degrade to a miss or a skipped write.
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  /// How long a cached entry stays valid
  ttl: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
    Self {
      storage,
      ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
    }
  }

  /// Set the time-to-live for cached data.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// An entry is expired once strictly more than the TTL has elapsed.
  fn is_expired(&self, cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - cached_at > self.ttl
  }

  /// Read a fresh entry, purging it if it has expired.
  pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
    let raw = match self.storage.get(key.as_str()) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(%key, error = %e, "Cache read failed");
        return None;
      }
    };

    let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
      Ok(entry) => entry,
      Err(e) => {
        warn!(%key, error = %e, "Discarding unreadable cache entry");
        self.purge(key);
        return None;
      }
    };

    if self.is_expired(entry.timestamp, Utc::now()) {
      debug!(%key, cached_at = %entry.timestamp, "Cache entry expired");
      self.purge(key);
      return None;
    }

    Some(entry)
  }

  /// Store a value stamped with the current time.
  pub fn set<T: Serialize>(&self, key: &CacheKey, value: &T) {
    let raw = match serde_json::to_string(&CacheEntry::new(value)) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(%key, error = %e, "Failed to serialize cache entry");
        return;
      }
    };

    if let Err(e) = self.storage.set(key.as_str(), &raw) {
      warn!(%key, error = %e, "Cache write skipped");
    }
  }

  fn purge(&self, key: &CacheKey) {
    if let Err(e) = self.storage.remove(key.as_str()) {
      warn!(%key, error = %e, "Failed to purge cache entry");
    }
  }

  /// Fetch a list with cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. If expired or missing, run the fetcher once
  /// 3. Store the result only if the fetcher succeeded
  ///
  /// Fetcher errors are handed back untouched; nothing is cached for them.
  pub async fn fetch_list<T, E, F, Fut>(
    &self,
    key: &CacheKey,
    fetcher: F,
  ) -> Result<CacheResult<Vec<T>>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
  {
    if let Some(cached) = self.get::<Vec<T>>(key) {
      debug!(%key, "Cache hit");
      return Ok(CacheResult::from_cache(cached.data, cached.timestamp));
    }

    let data = fetcher().await?;
    self.set(key, &data);
    Ok(CacheResult::from_network(data))
  }
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}
