//! Run configurations for the focused file
//!
//! Recomputed whenever focus moves or the annotated target set changes.
//! Every trigger bumps a generation; a recomputation that finishes after a
//! newer trigger is dropped, so a slow query for an old file never
//! overwrites the list for the current one.

use super::{Action, FileRunProvider};
use crate::context::Context;
use crate::signal::{Signal, Subscription};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Default)]
struct State {
    focus: Option<PathBuf>,
    generation: u64,
    configs: Vec<Action>,
}

pub struct EditorState {
    ctx: Arc<Context>,
    provider: Arc<FileRunProvider>,
    state: Mutex<State>,
    has_run_configs: Signal<bool>,
    subscription: Mutex<Option<Subscription>>,
}

impl EditorState {
    pub fn new(ctx: &Arc<Context>, provider: &Arc<FileRunProvider>) -> Arc<Self> {
        let editor = Arc::new(Self {
            ctx: Arc::clone(ctx),
            provider: Arc::clone(provider),
            state: Mutex::new(State::default()),
            has_run_configs: Signal::new("has-run-configs"),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&editor);
        let subscription = provider.on_change().subscribe(move |_| {
            if let Some(editor) = weak.upgrade() {
                editor.retrigger();
            }
        });
        *editor
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        editor
    }

    /// Fires `configs().is_empty() == false` after every recomputation
    pub fn on_has_run_configs(&self) -> &Signal<bool> {
        &self.has_run_configs
    }

    pub fn focus(&self) -> Option<PathBuf> {
        self.lock().focus.clone()
    }

    /// Run configurations of the focused file, as of the last recomputation
    pub fn configs(&self) -> Vec<Action> {
        self.lock().configs.clone()
    }

    pub fn has_run_configs(&self) -> bool {
        !self.lock().configs.is_empty()
    }

    /// Move focus to `file` and recompute in the background
    pub fn set_focus(self: &Arc<Self>, file: impl Into<PathBuf>) {
        let generation = {
            let mut state = self.lock();
            state.focus = Some(file.into());
            state.generation += 1;
            state.generation
        };
        self.schedule(generation);
    }

    /// Recompute for the current focus and wait for the result
    pub async fn reconcile(&self) -> Vec<Action> {
        let generation = self.lock().generation;
        self.recompute(generation).await;
        self.configs()
    }

    fn retrigger(self: &Arc<Self>) {
        let generation = {
            let mut state = self.lock();
            if state.focus.is_none() {
                return;
            }
            state.generation += 1;
            state.generation
        };
        self.schedule(generation);
    }

    fn schedule(self: &Arc<Self>, generation: u64) {
        let editor = Arc::clone(self);
        self.ctx.spawn(async move {
            editor.recompute(generation).await;
        });
    }

    async fn recompute(&self, generation: u64) {
        let Some(file) = self.focus_if_current(generation) else {
            return;
        };

        let configs = if self.ctx.config().file_run.codelens {
            self.provider.editor_actions(&file).await
        } else {
            Vec::new()
        };

        let has_configs = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(file = %file.display(), "Discarding run configurations for a stale focus");
                return;
            }
            state.configs = configs;
            !state.configs.is_empty()
        };
        debug!(file = %file.display(), has_configs, "Run configurations updated");
        self.has_run_configs.emit(&has_configs);
    }

    fn focus_if_current(&self, generation: u64) -> Option<PathBuf> {
        let state = self.lock();
        if state.generation != generation {
            return None;
        }
        state.focus.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
