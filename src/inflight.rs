//! Process-wide count of outstanding tool operations
//!
//! Drives the busy indicator. The tracker knows nothing about what it is
//! counting; it only reports the 0 -> 1 ("busy") and 1 -> 0 ("idle") edges.

use crate::signal::Signal;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Counter of watched operations
///
/// Count changes and the edge notifications they cause happen under one
/// lock, so subscribers see busy and idle strictly alternate even when
/// operations start and settle on different threads. Handlers must not
/// start or finish watched operations themselves.
pub struct InFlight {
    count: AtomicUsize,
    edges: Mutex<()>,
    changed: Signal<bool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
            edges: Mutex::new(()),
            changed: Signal::new("inflight"),
        }
    }

    /// Fires `true` when the first operation starts and `false` when the last one settles
    pub fn on_change(&self) -> &Signal<bool> {
        &self.changed
    }

    /// Whether any watched operation is outstanding
    pub fn has(&self) -> bool {
        self.count() > 0
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Track `fut`. The count is taken immediately, not on first poll, and
    /// released when the future settles or is dropped.
    pub fn watch<F>(self: &Arc<Self>, fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        let guard = self.enter();
        async move {
            let _guard = guard;
            fut.await
        }
    }

    /// Track a synchronous operation; a panic still releases the count
    pub fn watch_sync<T>(self: &Arc<Self>, op: impl FnOnce() -> T) -> T {
        let _guard = self.enter();
        op()
    }

    /// Take a count that is released when the guard drops
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        {
            let _edges = self.edges.lock().unwrap_or_else(PoisonError::into_inner);
            if self.count.fetch_add(1, Ordering::SeqCst) == 0 {
                self.changed.emit(&true);
            }
        }
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    fn leave(&self) {
        let _edges = self.edges.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = self.count.load(Ordering::SeqCst);
        debug_assert!(previous > 0, "in-flight count underflow");
        if previous == 0 {
            return;
        }
        self.count.store(previous - 1, Ordering::SeqCst);
        if previous == 1 {
            self.changed.emit(&false);
        }
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases one in-flight count on drop
#[must_use = "the count is released as soon as the guard drops"]
pub struct InFlightGuard {
    tracker: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}
