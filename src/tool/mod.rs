//! Command boundary to the external build tool
//!
//! - `exec`: process spawning, output capture, cancellation escalation
//! - `heph`: the `heph` CLI as a [`BuildTool`]
//! - `target`/`expr`: what queries return and how they are phrased

mod backend;
pub mod exec;
pub mod expr;
mod heph;
pub mod target;

pub use backend::BuildTool;
pub use exec::{exec, ExecOptions, ExecOutput, KILL_GRACE_PERIOD};
pub use heph::{HephCli, DEFAULT_BIN};
pub use target::{CallFrame, Package, PackageRoot, Position, SourceGroup, Target};

/// Pick the most useful diagnostic text out of a failed run.
pub(crate) fn diagnostic(output: &ExecOutput, prefer_combined: bool) -> String {
    let candidates = if prefer_combined {
        [&output.combined, &output.stderr]
    } else {
        [&output.stderr, &output.combined]
    };

    candidates
        .into_iter()
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("exit code {}", output.exit_code))
}
