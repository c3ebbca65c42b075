//! Typed publish/subscribe signals
//!
//! A [`Signal`] fans one event out to every subscriber. Handlers run
//! synchronously on the emitting task, in subscription order. A handler that
//! panics is logged and skipped; the remaining handlers still run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::error;

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// Multicast event source
pub struct Signal<T> {
    name: &'static str,
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Signal<T> {
    /// Create a signal; `name` only shows up in logs
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler. It stays registered until the returned
    /// [`Subscription`] is dropped or unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.handlers.push((id, Arc::new(handler)));
            id
        };

        let registry: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    lock(&registry).handlers.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    /// Deliver `value` to every current subscriber
    pub fn emit(&self, value: &T) {
        // Snapshot so handlers may (un)subscribe while we iterate
        let handlers: Vec<Handler<T>> = lock(&self.registry)
            .handlers
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(value))).is_err() {
                error!(signal = self.name, "Signal handler panicked");
            }
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

/// Handle keeping a handler registered
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove the handler now
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
