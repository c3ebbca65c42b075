//! Terminal presentation: notifications, busy status and CLI output helpers
//!
//! Interactive terminals get cliclack framing and an indicatif spinner;
//! pipes and CI get plain lines.

mod context;
mod notify;
mod output;
mod status;

pub use context::UiContext;
pub use notify::{ConsoleNotifier, Notifier};
pub use output::{error_with_hint, section, step_info, step_ok, step_warn_hint};
pub use status::StatusIndicator;
