//! User-visible notifications
//!
//! Caches and views report failures through [`Notifier`] rather than
//! printing. The CLI installs [`ConsoleNotifier`]; tests record instead.

use super::context::UiContext;
use console::style;

/// Receiver of messages meant for the user, not the log
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Writes notifications to stderr so they never mix with command output
#[derive(Debug, Clone, Copy)]
pub struct ConsoleNotifier {
    ui: UiContext,
}

impl ConsoleNotifier {
    pub fn new(ui: UiContext) -> Self {
        Self { ui }
    }
}

impl Notifier for ConsoleNotifier {
    fn error(&self, message: &str) {
        if self.ui.use_fancy_output() {
            eprintln!("{} {}", style("✗").red(), message);
        } else {
            eprintln!("{} {}", style("[ERROR]").red(), message);
        }
    }
}
