//! Run and launch configurations declared by annotated targets
//!
//! A target annotated `vscode-task` or `vscode-launch` whose annotation names
//! a file contributes actions to that file. The annotation's `file` is either
//! absolute or relative to the target's package directory.

use super::{commands, Action, CodeLens};
use crate::cache::{normalize, GraphQueryCache};
use crate::config::Config;
use crate::context::Context;
use crate::signal::{Signal, Subscription};
use crate::tool::expr::{self, ANNOTATION_LAUNCH, ANNOTATION_TASK, NO_GEN_FLAG};
use crate::tool::Target;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

const LAUNCH_TOOLTIP_PREFIX: &str = "Launch config:\n\n";

pub struct FileRunProvider {
    ctx: Arc<Context>,
    cache: Arc<GraphQueryCache>,
    changed: Arc<Signal<()>>,
    _subscription: Subscription,
}

impl FileRunProvider {
    pub fn new(ctx: &Arc<Context>) -> Arc<Self> {
        let cache = GraphQueryCache::new(ctx, "annotations", expr::run_config_query(), query_flags);
        let changed = Arc::new(Signal::new("file-run"));
        let forward = Arc::clone(&changed);
        let subscription = cache.on_change().subscribe(move |_| forward.emit(&()));

        Arc::new(Self {
            ctx: Arc::clone(ctx),
            cache,
            changed,
            _subscription: subscription,
        })
    }

    /// Fires when the annotated target set may have changed
    pub fn on_change(&self) -> &Signal<()> {
        &self.changed
    }

    pub fn cache(&self) -> &Arc<GraphQueryCache> {
        &self.cache
    }

    /// Annotated targets pointing at `file`
    pub async fn targets_for_file(&self, file: &Path) -> Vec<Target> {
        self.cache
            .targets()
            .await
            .iter()
            .filter(|target| targets_file(target, file))
            .cloned()
            .collect()
    }

    /// Lenses for the top of `file`, launch configurations first
    pub async fn code_lenses(&self, file: &Path) -> Vec<CodeLens> {
        if !self.ctx.config().file_run.codelens {
            return Vec::new();
        }
        code_lenses_for(&self.targets_for_file(file).await)
    }

    /// Actions for the editor's run menu, in annotation order per target
    pub async fn editor_actions(&self, file: &Path) -> Vec<Action> {
        editor_actions_for(&self.targets_for_file(file).await)
    }
}

fn query_flags(config: &Config) -> Vec<String> {
    if config.file_run.gen {
        Vec::new()
    } else {
        vec![NO_GEN_FLAG.to_string()]
    }
}

/// Whether any run annotation of `target` names `file`
pub fn targets_file(target: &Target, file: &Path) -> bool {
    [ANNOTATION_TASK, ANNOTATION_LAUNCH]
        .iter()
        .filter_map(|name| target.annotation(name))
        .filter_map(|annotation| annotation.get("file").and_then(Value::as_str))
        .filter(|declared| !declared.is_empty())
        .any(|declared| {
            let declared = Path::new(declared);
            let resolved = if declared.is_absolute() {
                normalize(declared)
            } else {
                normalize(&target.package.root.abs.join(declared))
            };
            resolved == file
        })
}

pub fn code_lenses_for(targets: &[Target]) -> Vec<CodeLens> {
    let launches = targets.iter().filter_map(launch_action);
    let tasks = targets.iter().filter_map(task_action);

    launches
        .chain(tasks)
        .map(|mut action| {
            action.tooltip = None;
            CodeLens { line: 0, action }
        })
        .collect()
}

pub fn editor_actions_for(targets: &[Target]) -> Vec<Action> {
    targets
        .iter()
        .flat_map(|target| {
            target
                .annotations
                .keys()
                .filter_map(move |name| match name.as_str() {
                    ANNOTATION_LAUNCH => launch_action(target),
                    ANNOTATION_TASK => task_action(target),
                    _ => None,
                })
        })
        .collect()
}

fn launch_action(target: &Target) -> Option<Action> {
    let configuration = target
        .annotation(ANNOTATION_LAUNCH)?
        .get("configuration")
        .filter(|configuration| configuration.is_object())?;

    let title = configuration
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(&target.addr);

    Some(
        Action::new(title, commands::LAUNCH_TARGET, vec![configuration.clone()])
            .with_tooltip(format!("{LAUNCH_TOOLTIP_PREFIX}{}", pretty(configuration))),
    )
}

fn task_action(target: &Target) -> Option<Action> {
    target.annotation(ANNOTATION_TASK)?;
    Some(Action::new(
        target.addr.clone(),
        commands::RUN_TARGET,
        vec![Value::from(target.addr.clone())],
    ))
}

/// JSON with four-space indentation
fn pretty(value: &Value) -> String {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => value.to_string(),
    }
}
