//! Package-scoped query cache
//!
//! One entry per package key, least recently used entries evicted beyond the
//! capacity. Concurrent fetches of a key share one tool call. A caller whose
//! entry is evicted before the call settles fetches again instead of seeing
//! the stale result.

use super::flight::{settle, Flight, Slot};
use super::{key::package_key, or_report, ErrorLatch, SharedResult, Targets};
use crate::context::{Context, Invalidation};
use crate::error::LensResult;
use crate::signal::{Signal, Subscription};
use crate::tool::expr;
use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Entry bound used when the config does not set one
pub const DEFAULT_CAPACITY: usize = 20;

const LABEL: &str = "query";

pub struct ScopedQueryCache {
    ctx: Arc<Context>,
    entries: Mutex<Entries>,
    root: Slot<PathBuf>,
    latch: ErrorLatch,
    changed: Signal<()>,
    subscription: Mutex<Option<Subscription>>,
}

struct Entries {
    lru: LruCache<String, Flight<Targets>>,
    next_id: u64,
}

impl ScopedQueryCache {
    /// Cache bounded by `cache.capacity` from the context's settings
    pub fn new(ctx: &Arc<Context>) -> Arc<Self> {
        let capacity = ctx.config().cache.capacity;
        Self::with_capacity(ctx, capacity)
    }

    pub fn with_capacity(ctx: &Arc<Context>, capacity: usize) -> Arc<Self> {
        let capacity = bound(capacity);
        let cache = Arc::new(Self {
            ctx: Arc::clone(ctx),
            entries: Mutex::new(Entries {
                lru: LruCache::new(capacity),
                next_id: 0,
            }),
            root: Slot::new("root"),
            latch: ErrorLatch::default(),
            changed: Signal::new("scoped-cache"),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&cache);
        let subscription = ctx.on_invalidate().subscribe(move |reason| {
            if let Some(cache) = weak.upgrade() {
                if *reason == Invalidation::SettingsChanged {
                    cache.resize(cache.ctx.config().cache.capacity);
                }
                cache.invalidate_all();
            }
        });
        *cache
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        cache
    }

    /// Fires after every invalidation, once the entries are gone
    pub fn on_change(&self) -> &Signal<()> {
        &self.changed
    }

    /// Targets of the package `key`, sharing any fetch already running
    pub async fn fetch(&self, key: &str) -> SharedResult<Targets> {
        let lookup = || {
            let mut entries = self.lock();
            if let Some(flight) = entries.lru.get(key) {
                debug!(package = key, "Cache hit");
                return flight.clone();
            }

            let id = entries.next_id;
            entries.next_id += 1;
            debug!(package = key, flight = id, "Cache miss, querying");
            let flight = Flight::spawn(id, self.ctx.inflight(), self.query(key));
            if let Some((evicted, _)) = entries.lru.push(key.to_string(), flight.clone()) {
                debug!(package = %evicted, "Evicted least recently used package");
            }
            flight
        };
        let is_live = |id: u64| {
            self.lock()
                .lru
                .peek(key)
                .is_some_and(|flight| flight.id() == id)
        };

        settle(LABEL, lookup, is_live).await
    }

    /// Like [`fetch`](Self::fetch), with failures reported once and degraded to no targets
    pub async fn targets(&self, key: &str) -> Targets {
        let result = self.fetch(key).await;
        or_report(LABEL, &self.latch, self.ctx.notifier().as_ref(), result)
    }

    /// Workspace root, looked up once until the next invalidation
    pub async fn workspace_root(&self) -> SharedResult<PathBuf> {
        let ctx = Arc::clone(&self.ctx);
        self.root
            .get_or_fetch(self.ctx.inflight(), move || {
                let tool = ctx.tool();
                async move { tool.query_root().await }
            })
            .await
    }

    /// Targets of the package containing `file`
    pub async fn targets_for_file(&self, file: &Path) -> Targets {
        let root = match self.workspace_root().await {
            Ok(root) => root,
            Err(err) => {
                return or_report(LABEL, &self.latch, self.ctx.notifier().as_ref(), Err(err))
            }
        };

        match package_key(&root, file) {
            Some(key) => self.targets(&key).await,
            None => {
                debug!(
                    "{} is outside workspace {}",
                    file.display(),
                    root.display()
                );
                Targets::default()
            }
        }
    }

    /// Drop every entry and the root lookup, then announce the change
    pub fn invalidate_all(&self) {
        let dropped = {
            let mut entries = self.lock();
            let dropped = entries.lru.len();
            entries.lru.clear();
            dropped
        };
        self.root.clear();
        self.latch.reset();
        debug!(entries = dropped, "Package cache cleared");

        self.changed.emit(&());
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Change the entry bound, evicting least recently used entries beyond it
    pub fn resize(&self, capacity: usize) {
        let capacity = bound(capacity);
        let mut entries = self.lock();
        if entries.lru.cap() != capacity {
            debug!(from = entries.lru.cap().get(), to = capacity.get(), "Resizing package cache");
            entries.lru.resize(capacity);
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().lru.cap().get()
    }

    /// Whether `key` has an entry, without touching its recency
    pub fn contains(&self, key: &str) -> bool {
        self.lock().lru.contains(key)
    }

    /// Whether `key` has an entry whose query has settled
    pub fn is_resolved(&self, key: &str) -> bool {
        self.lock()
            .lru
            .peek(key)
            .is_some_and(|flight| flight.is_settled())
    }

    fn query(&self, key: &str) -> impl Future<Output = LensResult<Targets>> + Send + 'static {
        let include_gen = self.ctx.config().build_files.copy_addr.gen;
        let expression = expr::package_query(key, include_gen);
        let tool = self.ctx.tool();
        async move { tool.query(&expression, &[]).await.map(Arc::new) }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Zero is not a usable bound; treat it as one entry
fn bound(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}
