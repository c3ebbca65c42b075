//! Build tool abstraction
//!
//! Caches and views only ever talk to the build tool through this trait, so
//! the subprocess-backed implementation can be swapped for a fake in tests.

use crate::config::schema::ToolConfig;
use crate::error::LensResult;
use crate::tool::target::Target;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Typed operations of the external build tool
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Run a graph query and return the matching targets
    async fn query(&self, expression: &str, flags: &[String]) -> LensResult<Vec<Target>>;

    /// Discover the workspace root
    async fn query_root(&self) -> LensResult<PathBuf>;

    /// Format build file source; `cwd` is the directory of the file being formatted.
    /// Cancelling `cancel` interrupts the formatter.
    async fn format(&self, cwd: &Path, text: &str, cancel: CancellationToken) -> LensResult<String>;

    /// Get the human-readable tool name for display
    fn tool_name(&self) -> &str;

    /// A replacement built for new `[tool]` settings, or `None` to keep this one
    fn reconfigured(&self, _config: &ToolConfig) -> Option<Arc<dyn BuildTool>> {
        None
    }
}
