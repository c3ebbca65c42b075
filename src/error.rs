//! Error types for heph-lens
//!
//! All modules use `LensResult<T>` as their return type.

use crate::tool::ExecOutput;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for heph-lens operations
pub type LensResult<T> = Result<T, LensError>;

/// All errors that can occur in heph-lens
#[derive(Error, Debug)]
pub enum LensError {
    // Build tool errors
    #[error("Failed to run {command}: {source}")]
    ProcessFailure {
        command: String,
        /// Whatever the process wrote before it failed
        partial: Box<ExecOutput>,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    QueryFailed(String),

    #[error("query root failed: {0}")]
    RootFailed(String),

    #[error("{0}")]
    FormatFailed(String),

    #[error("Malformed query output: {0}")]
    QueryParse(#[source] serde_json::Error),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid build file pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is outside the workspace: {0}")]
    OutsideWorkspace(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A failure shared by every waiter of one cached query
    #[error(transparent)]
    Shared(Arc<LensError>),

    // General errors
    #[error("{0}")]
    User(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LensError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a process failure carrying the output captured so far
    pub fn process(command: impl Into<String>, partial: ExecOutput, source: std::io::Error) -> Self {
        Self::ProcessFailure {
            command: command.into(),
            partial: Box::new(partial),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ProcessFailure { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Some("Install heph or point tool.bin (or --bin) at the binary")
            }
            Self::Shared(inner) => inner.hint(),
            Self::OutsideWorkspace(_) => Some("Run from inside a heph workspace"),
            Self::ConfigInvalid { .. } => Some("Fix the file, or pass --no-local to skip .heph-lens.toml"),
            _ => None,
        }
    }
}
