//! Whole-graph query cache: one memoized query, no scoping

use super::flight::Slot;
use super::{or_report, ErrorLatch, SharedResult, Targets};
use crate::config::Config;
use crate::context::Context;
use crate::signal::{Signal, Subscription};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Flags derived from the settings current at fetch time
pub type FlagsFn = fn(&Config) -> Vec<String>;

pub struct GraphQueryCache {
    ctx: Arc<Context>,
    label: &'static str,
    expression: String,
    flags: FlagsFn,
    slot: Slot<Targets>,
    latch: ErrorLatch,
    changed: Signal<()>,
    subscription: Mutex<Option<Subscription>>,
}

impl GraphQueryCache {
    pub fn new(
        ctx: &Arc<Context>,
        label: &'static str,
        expression: impl Into<String>,
        flags: FlagsFn,
    ) -> Arc<Self> {
        let cache = Arc::new(Self {
            ctx: Arc::clone(ctx),
            label,
            expression: expression.into(),
            flags,
            slot: Slot::new(label),
            latch: ErrorLatch::default(),
            changed: Signal::new(label),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&cache);
        let subscription = ctx.on_invalidate().subscribe(move |_| {
            if let Some(cache) = weak.upgrade() {
                cache.invalidate();
            }
        });
        *cache
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        cache
    }

    pub fn on_change(&self) -> &Signal<()> {
        &self.changed
    }

    /// Tool and flags are read from the context on every attempt, so a retry
    /// after a settings change queries with the new settings
    pub async fn fetch(&self) -> SharedResult<Targets> {
        let ctx = Arc::clone(&self.ctx);
        let expression = self.expression.clone();
        let flags_for = self.flags;

        self.slot
            .get_or_fetch(self.ctx.inflight(), move || {
                let tool = ctx.tool();
                let flags = flags_for(&ctx.config());
                let expression = expression.clone();
                async move { tool.query(&expression, &flags).await.map(Arc::new) }
            })
            .await
    }

    /// Fetch with failures reported once per episode and degraded to no targets
    pub async fn targets(&self) -> Targets {
        let result = self.fetch().await;
        or_report(self.label, &self.latch, self.ctx.notifier().as_ref(), result)
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.is_settled()
    }

    /// Forget the memoized query and announce the change
    pub fn invalidate(&self) {
        let had_entry = self.slot.clear();
        self.latch.reset();
        debug!(cache = self.label, had_entry, "Graph cache cleared");
        self.changed.emit(&());
    }
}
