//! heph-lens - editor intelligence for heph workspaces
//!
//! Answers code lens, run configuration, task and formatting requests from
//! the heph build graph. Queries go through caches that share in-flight
//! work and are dropped whenever the workspace changes.

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod inflight;
pub mod signal;
pub mod tool;
pub mod ui;
pub mod views;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use context::{Context, Invalidation};
pub use error::{LensError, LensResult};
pub use workspace::Workspace;
