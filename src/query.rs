//! Latest-request-wins state for async data fetching.
//!
//! Inspired by TanStack Query, a `LatestQuery<T>` holds the visible state of
//! one operation family (data plus a loading flag). Every request captures an
//! id from the family's `RequestEpoch` when it is dispatched; when it
//! finishes, its result is applied only if no newer request was dispatched
//! since. Ids are taken synchronously, so the order requests are issued in
//! decides the winner, never the order their tasks are first polled.
//!
//! # Example
//!
//! ```ignore
//! let query = LatestQuery::new();
//!
//! // Two overlapping searches; only the newest one reaches visible state
//! let walkers = query.begin();
//! let canes = query.begin();
//! let (first, second) = tokio::join!(
//!     query.run_with(walkers, slow_search("walkers")),
//!     query.run_with(canes, fast_search("canes")),
//! );
//! assert!(matches!(first, Delivery::Superseded { .. }));
//! assert!(matches!(second, Delivery::Applied(_)));
//! ```

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Identifier captured by a request when it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
  pub fn get(self) -> u64 {
    self.0
  }
}

/// Monotonically increasing request counter for one operation family.
#[derive(Debug, Default)]
pub struct RequestEpoch {
  latest: AtomicU64,
}

impl RequestEpoch {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start a new request, superseding every earlier one.
  pub fn begin(&self) -> RequestId {
    RequestId(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
  }

  /// Whether `id` is still the newest request.
  pub fn is_current(&self, id: RequestId) -> bool {
    self.latest.load(Ordering::SeqCst) == id.0
  }

  pub fn latest(&self) -> RequestId {
    RequestId(self.latest.load(Ordering::SeqCst))
  }
}

/// Visible state of one operation family.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
  /// Result of the most recent applied request, kept while a newer one loads
  pub data: Option<T>,
  /// True from the start of the newest request until it is applied
  pub loading: bool,
  /// When `data` was applied
  pub fetched_at: Option<DateTime<Utc>>,
  /// Which request produced `data`
  pub applied: Option<RequestId>,
}

impl<T> Default for QueryState<T> {
  fn default() -> Self {
    Self {
      data: None,
      loading: false,
      fetched_at: None,
      applied: None,
    }
  }
}

impl<T> QueryState<T> {
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }
}

/// What happened to a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  /// The result became the visible state
  Applied(RequestId),
  /// A newer request started first; the result was discarded
  Superseded { id: RequestId, latest: RequestId },
}

impl Delivery {
  pub fn is_applied(&self) -> bool {
    matches!(self, Delivery::Applied(_))
  }
}

/// Visible state guarded by a request epoch.
///
/// The state lock is only held for bookkeeping, never across an `.await`.
#[derive(Debug)]
pub struct LatestQuery<T> {
  epoch: RequestEpoch,
  state: Mutex<QueryState<T>>,
}

impl<T> Default for LatestQuery<T> {
  fn default() -> Self {
    Self {
      epoch: RequestEpoch::new(),
      state: Mutex::new(QueryState::default()),
    }
  }
}

impl<T: Clone> LatestQuery<T> {
  pub fn new() -> Self {
    Self::default()
  }

  // Bookkeeping never leaves the state half-written, so a poisoned lock is
  // still safe to use.
  fn lock(&self) -> MutexGuard<'_, QueryState<T>> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Start a request: capture a new id and mark the family as loading.
  pub fn begin(&self) -> RequestId {
    let mut state = self.lock();
    let id = self.epoch.begin();
    state.loading = true;
    id
  }

  /// Apply `data` if `id` is still the newest request.
  ///
  /// Only the newest request may clear the loading flag.
  pub fn settle(&self, id: RequestId, data: T) -> Delivery {
    let mut state = self.lock();
    if !self.epoch.is_current(id) {
      let latest = self.epoch.latest();
      debug!(id = id.get(), latest = latest.get(), "Discarding superseded result");
      return Delivery::Superseded { id, latest };
    }

    state.data = Some(data);
    state.loading = false;
    state.fetched_at = Some(Utc::now());
    state.applied = Some(id);
    Delivery::Applied(id)
  }

  /// Await `fetch` for a request that already began, then settle it.
  pub async fn run_with<Fut>(&self, id: RequestId, fetch: Fut) -> Delivery
  where
    Fut: Future<Output = T>,
  {
    let data = fetch.await;
    self.settle(id, data)
  }

  /// Copy of the current visible state.
  pub fn snapshot(&self) -> QueryState<T> {
    self.lock().clone()
  }
}
