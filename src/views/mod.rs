//! Editor-facing views derived from the query caches
//!
//! Each view re-reads through a cache whenever it is asked, and re-announces
//! its cache's change signal so hosts know when to ask again.

mod build_lens;
mod editor;
mod file_run;
mod formatting;
mod tasks;

pub use build_lens::BuildFileLenses;
pub use editor::EditorState;
pub use file_run::FileRunProvider;
pub use formatting::{DocumentFormatter, TextEdit, TextPosition, TextRange};
pub use tasks::{Task, TaskDefinition, TaskProvider, TASK_TYPE};

use serde::Serialize;
use serde_json::Value;

/// Command identifiers understood by the editor host
pub mod commands {
    pub const COPY_ADDR: &str = "heph.copyAddr";
    pub const RUN_TARGET: &str = "heph.runTarget";
    pub const LAUNCH_TARGET: &str = "heph.launchTarget";
    pub const REFRESH_STATE: &str = "heph.refreshState";
    pub const EDITOR_RUN_CONFIGS: &str = "heph.editorRunConfigs";
}

/// A host command bound to a title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    pub command: String,
    pub arguments: Vec<Value>,
}

impl Action {
    pub fn new(title: impl Into<String>, command: &str, arguments: Vec<Value>) -> Self {
        Self {
            title: title.into(),
            tooltip: None,
            command: command.to_string(),
            arguments,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

/// An action shown above a 0-based line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeLens {
    pub line: u32,
    #[serde(flatten)]
    pub action: Action,
}
