//! Single-flight fetches shared by the query caches
//!
//! A [`Flight`] is one scheduled tool call. It runs as its own task, so it
//! always completes even if every caller gives up, and its settled result is
//! shared by every clone. Each flight carries an id so a caller can tell
//! whether the cache entry it waited on is still the live one.

use crate::error::{LensError, LensResult};
use crate::inflight::InFlight;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Result handed to every waiter of a flight
pub type SharedResult<T> = Result<T, Arc<LensError>>;

const BACKOFF_START: Duration = Duration::from_millis(5);
const BACKOFF_MAX: Duration = Duration::from_millis(200);

/// One in-flight or settled fetch
pub(crate) struct Flight<T: Clone> {
    id: u64,
    fut: Shared<BoxFuture<'static, SharedResult<T>>>,
}

impl<T: Clone> Clone for Flight<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fut: self.fut.clone(),
        }
    }
}

impl<T> Flight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start `fetch` on its own task, counted by the in-flight tracker
    pub(crate) fn spawn<F>(id: u64, inflight: &Arc<InFlight>, fetch: F) -> Self
    where
        F: Future<Output = LensResult<T>> + Send + 'static,
    {
        let handle = tokio::spawn(inflight.watch(fetch));
        let fut = async move {
            match handle.await {
                Ok(result) => result.map_err(Arc::new),
                Err(e) => Err(Arc::new(LensError::Internal(format!(
                    "fetch task failed: {e}"
                )))),
            }
        }
        .boxed()
        .shared();

        Self { id, fut }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Whether the fetch has produced a result yet
    pub(crate) fn is_settled(&self) -> bool {
        self.fut.peek().is_some()
    }

    async fn wait(self) -> SharedResult<T> {
        self.fut.await
    }
}

/// Await the flight `lookup` hands out, retrying while the entry behind it
/// gets evicted before it settles.
///
/// `lookup` returns the live flight for the key, creating one if needed.
/// `is_live` reports whether a flight id is still the one stored for the key.
/// A result from an evicted flight is never returned: the cache was cleared
/// or shrunk while it ran, so it may describe a graph that no longer exists.
pub(crate) async fn settle<T, L, C>(label: &str, mut lookup: L, is_live: C) -> SharedResult<T>
where
    T: Clone + Send + Sync + 'static,
    L: FnMut() -> Flight<T>,
    C: Fn(u64) -> bool,
{
    let mut backoff = Backoff::new();
    loop {
        let flight = lookup();
        let id = flight.id();
        let result = flight.wait().await;

        if is_live(id) {
            return result;
        }

        debug!(cache = label, flight = id, "Entry evicted while in flight, retrying");
        backoff.wait().await;
    }
}

/// Yield first, then sleep with doubling delays
struct Backoff {
    attempt: u32,
}

impl Backoff {
    fn new() -> Self {
        Self { attempt: 0 }
    }

    async fn wait(&mut self) {
        if self.attempt == 0 {
            tokio::task::yield_now().await;
        } else {
            let delay = BACKOFF_START
                .saturating_mul(1 << (self.attempt - 1).min(16))
                .min(BACKOFF_MAX);
            tokio::time::sleep(delay).await;
        }
        self.attempt = self.attempt.saturating_add(1);
    }
}

/// Single-slot memo with single-flight semantics
pub(crate) struct Slot<T: Clone> {
    label: &'static str,
    state: Mutex<SlotState<T>>,
}

struct SlotState<T: Clone> {
    current: Option<Flight<T>>,
    next_id: u64,
}

impl<T> Slot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            label,
            state: Mutex::new(SlotState {
                current: None,
                next_id: 0,
            }),
        }
    }

    /// Return the memoized result, starting `fetch` if the slot is empty
    pub(crate) async fn get_or_fetch<F, Fut>(
        &self,
        inflight: &Arc<InFlight>,
        fetch: F,
    ) -> SharedResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = LensResult<T>> + Send + 'static,
    {
        let lookup = || {
            let mut state = self.lock();
            if let Some(ref flight) = state.current {
                return flight.clone();
            }
            let id = state.next_id;
            state.next_id += 1;
            debug!(cache = self.label, flight = id, "Miss, fetching");
            let flight = Flight::spawn(id, inflight, fetch());
            state.current = Some(flight.clone());
            flight
        };
        let is_live = |id: u64| {
            self.lock()
                .current
                .as_ref()
                .is_some_and(|flight| flight.id() == id)
        };

        settle(self.label, lookup, is_live).await
    }

    /// Drop the memoized flight; returns whether there was one
    pub(crate) fn clear(&self) -> bool {
        self.lock().current.take().is_some()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|flight| flight.is_settled())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().current.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Remembers that the current failure episode was already shown to the user
#[derive(Debug, Default)]
pub struct ErrorLatch {
    reported: AtomicBool,
}

impl ErrorLatch {
    /// Returns true exactly once per episode: the caller should alert
    pub fn should_report(&self) -> bool {
        !self.reported.swap(true, Ordering::SeqCst)
    }

    /// End the episode (a fetch succeeded, or the cache was invalidated)
    pub fn reset(&self) {
        self.reported.store(false, Ordering::SeqCst);
    }
}
