//! Consumer-side loading state around a typed fetch.
//!
//! A [`Query`] owns a loader for one logical subject (its key) and publishes
//! `Loading`, then a terminal state, every time it is refetched. Each refetch
//! is tagged with a generation number; a response that arrives after a newer
//! refetch has started is dropped instead of overwriting the newer state.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::FetchError;
use crate::result::QueryResult;

/// A [`QueryResult`] widened with an in-flight state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState<T, E = FetchError> {
    Loading,
    Success { result: T },
    Error { error: E },
}

impl<T, E> QueryState<T, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// `true` once a result or an error has landed.
    pub fn is_settled(&self) -> bool {
        !self.is_loading()
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Self::Success { result } => Some(result),
            Self::Loading | Self::Error { .. } => None,
        }
    }

    pub fn err(&self) -> Option<&E> {
        match self {
            Self::Error { error } => Some(error),
            Self::Loading | Self::Success { .. } => None,
        }
    }
}

impl<T, E> From<QueryResult<T, E>> for QueryState<T, E> {
    fn from(value: QueryResult<T, E>) -> Self {
        match value {
            QueryResult::Success { result } => Self::Success { result },
            QueryResult::Error { error } => Self::Error { error },
        }
    }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type Loader<K, T, E> = Arc<dyn Fn(K) -> BoxFuture<QueryResult<T, E>> + Send + Sync>;

/// Loading/result/error state for one subject, refetched on demand.
///
/// Share it through an [`Arc`] to refetch from several tasks; the most
/// recently started refetch always wins.
///
/// # Example
///
/// ```no_run
/// use typed_fetch::{typed_fetch, Query};
///
/// # async fn example() {
/// let query = Query::new("1".to_string(), |id: String| async move {
///     typed_fetch::<serde_json::Value>(format!("https://example.com/todos/{id}"), None).await
/// });
/// assert!(query.state().is_loading());
/// query.refetch().await;
/// # }
/// ```
pub struct Query<K, T, E = FetchError> {
    key: watch::Sender<K>,
    state: watch::Sender<QueryState<T, E>>,
    generation: AtomicU64,
    loader: Loader<K, T, E>,
}

impl<K, T, E> Query<K, T, E>
where
    K: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a query for `key`. The state starts as `Loading`; nothing is
    /// fetched until [`refetch`](Self::refetch) is called.
    pub fn new<F, Fut>(key: K, loader: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = QueryResult<T, E>> + Send + 'static,
    {
        let loader: Loader<K, T, E> =
            Arc::new(move |key: K| -> BoxFuture<QueryResult<T, E>> { Box::pin(loader(key)) });
        Self {
            key: watch::Sender::new(key),
            state: watch::Sender::new(QueryState::Loading),
            generation: AtomicU64::new(0),
            loader,
        }
    }

    /// Move to `Loading`, run the loader once, and publish its outcome.
    ///
    /// Returns `false` if another refetch started while this one was in
    /// flight; its result is then discarded.
    ///
    /// Cancel safe: if the returned future is dropped before the loader
    /// finishes (for example under `tokio::time::timeout`) and no newer
    /// refetch has started, the state and generation from before this call
    /// are restored, so an older refetch still in flight can settle. The key
    /// is left as it is.
    pub async fn refetch(&self) -> bool {
        let mut generation = 0;
        let mut previous = QueryState::Loading;
        // Bump under the state lock so a newer Loading can't be overwritten.
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            previous = std::mem::replace(state, QueryState::Loading);
        });
        let in_flight = InFlight {
            state: &self.state,
            latest: &self.generation,
            generation,
            previous: Some(previous),
        };

        let key = self.key.borrow().clone();
        tracing::debug!(?key, generation, "query refetch started");

        let outcome = (self.loader)(key).await;
        in_flight.settle(outcome)
    }

    /// Switch to a new subject and refetch it.
    ///
    /// Does nothing and returns `false` if `key` equals the current key.
    pub async fn set_key(&self, key: K) -> bool {
        let changed = self.key.send_if_modified(|current| {
            if *current == key {
                return false;
            }
            *current = key;
            true
        });
        if !changed {
            return false;
        }
        self.refetch().await
    }

    pub fn key(&self) -> K {
        self.key.borrow().clone()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState<T, E> {
        self.state.borrow().clone()
    }

    /// Number of refetches started so far, not counting cancelled ones.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Receive every state transition from now on.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T, E>> {
        self.state.subscribe()
    }
}

/// One refetch between entering `Loading` and settling.
///
/// Dropping it unsettled puts back the state it replaced and the previous
/// generation, provided its generation is still the latest.
struct InFlight<'a, T, E> {
    state: &'a watch::Sender<QueryState<T, E>>,
    latest: &'a AtomicU64,
    generation: u64,
    previous: Option<QueryState<T, E>>,
}

impl<T, E> InFlight<'_, T, E> {
    fn is_latest(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    fn settle(mut self, outcome: QueryResult<T, E>) -> bool {
        self.previous = None;
        let applied = self.state.send_if_modified(|state| {
            if !self.is_latest() {
                return false;
            }
            *state = outcome.into();
            true
        });

        if applied {
            tracing::debug!(generation = self.generation, "query settled");
        } else {
            tracing::trace!(generation = self.generation, "discarding stale query response");
        }
        applied
    }
}

impl<T, E> Drop for InFlight<'_, T, E> {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        // Hand the generation back so an older refetch still in flight can land.
        let restored = self.state.send_if_modified(|state| {
            let rolled_back = self.latest.compare_exchange(
                self.generation,
                self.generation - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
            if rolled_back.is_err() {
                return false;
            }
            *state = previous;
            true
        });
        if restored {
            tracing::debug!(
                generation = self.generation,
                "query refetch cancelled, previous state restored"
            );
        }
    }
}

impl<K: fmt::Debug, T: fmt::Debug, E: fmt::Debug> fmt::Debug for Query<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("key", &*self.key.borrow())
            .field("state", &*self.state.borrow())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
