//! Busy indicator driven by the in-flight tracker

use super::context::UiContext;
use crate::inflight::InFlight;
use crate::signal::Subscription;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

const LABEL: &str = "heph";

/// Shows a spinner while any tool operation is outstanding
pub struct StatusIndicator {
    interactive: bool,
    busy: AtomicBool,
    bar: Mutex<Option<ProgressBar>>,
    subscription: Mutex<Option<Subscription>>,
}

impl StatusIndicator {
    pub fn new(ui: &UiContext, inflight: &InFlight) -> Arc<Self> {
        let indicator = Arc::new(Self {
            interactive: ui.use_fancy_output(),
            busy: AtomicBool::new(false),
            bar: Mutex::new(None),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&indicator);
        let subscription = inflight.on_change().subscribe(move |busy| {
            if let Some(indicator) = weak.upgrade() {
                indicator.set_busy(*busy);
            }
        });
        *indicator
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        indicator
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// One-line state for the session protocol
    pub fn describe(&self) -> &'static str {
        if self.is_busy() {
            "busy"
        } else {
            "idle"
        }
    }

    fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
        debug!(busy, "Status changed");
        if !self.interactive {
            return;
        }

        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if busy {
            *bar = Some(spinner());
        } else if let Some(bar) = bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
    );
    bar.set_message(LABEL);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
