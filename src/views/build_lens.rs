//! Copy-address lenses for build files

use super::{commands, Action, CodeLens};
use crate::cache::ScopedQueryCache;
use crate::context::Context;
use crate::signal::{Signal, Subscription};
use crate::tool::Target;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// One lens per line declaring targets, offering to copy their addresses
pub struct BuildFileLenses {
    ctx: Arc<Context>,
    cache: Arc<ScopedQueryCache>,
    changed: Arc<Signal<()>>,
    _subscription: Subscription,
}

impl BuildFileLenses {
    pub fn new(ctx: &Arc<Context>, cache: &Arc<ScopedQueryCache>) -> Self {
        let changed = Arc::new(Signal::new("build-lenses"));
        let forward = Arc::clone(&changed);
        let subscription = cache.on_change().subscribe(move |_| forward.emit(&()));

        Self {
            ctx: Arc::clone(ctx),
            cache: Arc::clone(cache),
            changed,
            _subscription: subscription,
        }
    }

    pub fn on_change(&self) -> &Signal<()> {
        &self.changed
    }

    pub async fn lenses(&self, file: &Path) -> Vec<CodeLens> {
        let settings = self.ctx.config().build_files.copy_addr;
        if !settings.codelens {
            return Vec::new();
        }

        let targets = self.cache.targets_for_file(file).await;
        lenses_for(&targets, file, settings.show_all)
    }
}

/// Group the targets declared in `file` by line
pub fn lenses_for(targets: &[Target], file: &Path, show_all: bool) -> Vec<CodeLens> {
    let mut per_line: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for target in targets {
        if target.private && !show_all {
            continue;
        }
        if let Some(pos) = target.position_in(file) {
            per_line
                .entry(pos.editor_line())
                .or_default()
                .push(target.addr.clone());
        }
    }

    per_line
        .into_iter()
        .map(|(line, addrs)| {
            let title = match addrs.len() {
                1 => "copy addr".to_string(),
                n => format!("copy addr ({n})"),
            };
            CodeLens {
                line,
                action: Action::new(title, commands::COPY_ADDR, vec![Value::from(addrs)]),
            }
        })
        .collect()
}
