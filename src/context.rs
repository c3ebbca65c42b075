//! Process context shared by every component
//!
//! Built once at startup and handed out as `Arc<Context>`. Holds the current
//! settings, the build tool, the in-flight tracker, the user notifier and the
//! invalidation signal every cache listens to.

use crate::config::Config;
use crate::error::{LensError, LensResult};
use crate::inflight::InFlight;
use crate::signal::Signal;
use crate::tool::BuildTool;
use crate::ui::Notifier;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, info};

/// Why cached build graph data was invalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// A build file was created, edited or removed
    BuildFileChanged(PathBuf),
    /// The user asked for a refresh
    Refresh,
    /// Settings that shape queries changed
    SettingsChanged,
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildFileChanged(path) => write!(f, "build file changed: {}", path.display()),
            Self::Refresh => write!(f, "refresh requested"),
            Self::SettingsChanged => write!(f, "settings changed"),
        }
    }
}

/// Shared process context
pub struct Context {
    config: RwLock<Config>,
    tool: RwLock<Arc<dyn BuildTool>>,
    inflight: Arc<InFlight>,
    notifier: Arc<dyn Notifier>,
    invalidation: Signal<Invalidation>,
    runtime: Handle,
}

impl Context {
    /// Create a context bound to the current tokio runtime
    pub fn new(
        config: Config,
        tool: Arc<dyn BuildTool>,
        notifier: Arc<dyn Notifier>,
    ) -> LensResult<Arc<Self>> {
        let runtime = Handle::try_current()
            .map_err(|e| LensError::Internal(format!("no tokio runtime: {e}")))?;

        Ok(Arc::new(Self {
            config: RwLock::new(config),
            tool: RwLock::new(tool),
            inflight: Arc::new(InFlight::new()),
            notifier,
            invalidation: Signal::new("invalidation"),
            runtime,
        }))
    }

    /// Snapshot of the current settings
    pub fn config(&self) -> Config {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap settings and invalidate everything derived from the old ones.
    /// A changed `[tool]` section rebuilds the tool before anything refetches.
    pub fn replace_config(&self, config: Config) {
        let tool_config = {
            let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
            let changed = current.tool != config.tool;
            *current = config;
            changed.then(|| current.tool.clone())
        };

        if let Some(tool_config) = tool_config {
            if let Some(tool) = self.tool().reconfigured(&tool_config) {
                debug!("Build tool is now {}", tool.tool_name());
                *self.tool.write().unwrap_or_else(PoisonError::into_inner) = tool;
            }
        }

        self.invalidate(Invalidation::SettingsChanged);
    }

    /// The build tool for the current settings
    pub fn tool(&self) -> Arc<dyn BuildTool> {
        self.tool
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn inflight(&self) -> &Arc<InFlight> {
        &self.inflight
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// The invalidation bus
    pub fn on_invalidate(&self) -> &Signal<Invalidation> {
        &self.invalidation
    }

    /// Tell every subscriber that build graph data may be stale
    pub fn invalidate(&self, reason: Invalidation) {
        info!("Invalidating cached build graph data: {}", reason);
        self.invalidation.emit(&reason);
    }

    /// Run a background task on the context's runtime
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(fut);
    }
}
