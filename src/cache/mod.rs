//! Query caches in front of the build tool
//!
//! Two shapes share one lifecycle per entry (absent, pending, then resolved
//! or failed): [`ScopedQueryCache`] keeps one entry per package behind an LRU
//! bound, [`GraphQueryCache`] keeps a single entry for a whole-graph query.
//! Both drop everything when the context's invalidation signal fires and
//! then announce their own change.

mod flight;
mod graph;
mod key;
mod scoped;

pub use flight::{ErrorLatch, SharedResult};
pub use graph::GraphQueryCache;
pub use key::{normalize, package_key};
pub use scoped::{ScopedQueryCache, DEFAULT_CAPACITY};

use crate::error::LensError;
use crate::tool::Target;
use crate::ui::Notifier;
use std::sync::Arc;
use tracing::{debug, error};

/// Query result as shared between cache waiters
pub type Targets = Arc<Vec<Target>>;

/// Degrade a failed fetch to the default value, alerting the user only for
/// the first failure of an episode
pub(crate) fn or_report<T: Default>(
    label: &str,
    latch: &ErrorLatch,
    notifier: &dyn Notifier,
    result: SharedResult<T>,
) -> T {
    match result {
        Ok(value) => {
            latch.reset();
            value
        }
        Err(err) => {
            report(label, latch, notifier, &err);
            T::default()
        }
    }
}

fn report(label: &str, latch: &ErrorLatch, notifier: &dyn Notifier, err: &LensError) {
    if latch.should_report() {
        error!(cache = label, "{}", err);
        notifier.error(&format!("{label} failed: {err}"));
    } else {
        debug!(cache = label, "Suppressing repeated failure: {}", err);
    }
}
