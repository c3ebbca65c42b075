//! Test doubles shared by unit tests

use crate::config::Config;
use crate::context::Context;
use crate::error::{LensError, LensResult};
use crate::tool::{BuildTool, CallFrame, Package, PackageRoot, Position, SourceGroup, Target};
use crate::ui::Notifier;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Scriptable BuildTool that records calls and can hold queries open
pub(crate) struct FakeTool {
    root: Mutex<Result<PathBuf, String>>,
    responses: Mutex<HashMap<String, Result<Vec<Target>, String>>>,
    format_response: Mutex<Option<Result<String, String>>>,
    calls: Mutex<Vec<String>>,
    root_calls: Mutex<usize>,
    /// Expressions whose queries block; `*` blocks everything
    held: watch::Sender<HashSet<String>>,
}

impl FakeTool {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        let (held, _) = watch::channel(HashSet::new());
        Self {
            root: Mutex::new(Ok(root.into())),
            responses: Mutex::new(HashMap::new()),
            format_response: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            root_calls: Mutex::new(0),
            held,
        }
    }

    pub(crate) fn respond(&self, expression: &str, targets: Vec<Target>) {
        self.responses
            .lock()
            .unwrap()
            .insert(expression.to_string(), Ok(targets));
    }

    pub(crate) fn fail(&self, expression: &str, stderr: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(expression.to_string(), Err(stderr.to_string()));
    }

    pub(crate) fn fail_root(&self, stderr: &str) {
        *self.root.lock().unwrap() = Err(stderr.to_string());
    }

    pub(crate) fn format_with(&self, result: Result<&str, &str>) {
        *self.format_response.lock().unwrap() =
            Some(result.map(str::to_string).map_err(str::to_string));
    }

    /// Hold every query until [`FakeTool::open`]
    pub(crate) fn hold_all(&self) {
        self.hold("*");
    }

    /// Hold queries for `expression` until [`FakeTool::open`]
    pub(crate) fn hold(&self, expression: &str) {
        self.held.send_modify(|held| {
            held.insert(expression.to_string());
        });
    }

    /// Release every held query
    pub(crate) fn open(&self) {
        self.held.send_modify(|held| held.clear());
    }

    /// Query expressions in call order, flags appended after a space
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn root_calls(&self) -> usize {
        *self.root_calls.lock().unwrap()
    }

    /// Yield until at least `n` queries have started
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        for _ in 0..1000 {
            if self.call_count() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} queries, saw {}", self.call_count());
    }

    async fn wait_released(&self, expression: &str) {
        let mut rx = self.held.subscribe();
        let _ = rx
            .wait_for(|held| !held.contains("*") && !held.contains(expression))
            .await;
    }
}

#[async_trait]
impl BuildTool for FakeTool {
    async fn query(&self, expression: &str, flags: &[String]) -> LensResult<Vec<Target>> {
        let call = std::iter::once(expression.to_string())
            .chain(flags.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(call);

        self.wait_released(expression).await;

        let response = self.responses.lock().unwrap().get(expression).cloned();
        match response {
            Some(Ok(targets)) => Ok(targets),
            Some(Err(stderr)) => Err(LensError::QueryFailed(stderr)),
            None => Ok(Vec::new()),
        }
    }

    async fn query_root(&self) -> LensResult<PathBuf> {
        *self.root_calls.lock().unwrap() += 1;
        self.root
            .lock()
            .unwrap()
            .clone()
            .map_err(LensError::RootFailed)
    }

    async fn format(
        &self,
        _cwd: &Path,
        text: &str,
        _cancel: CancellationToken,
    ) -> LensResult<String> {
        match self.format_response.lock().unwrap().clone() {
            Some(Ok(out)) => Ok(out),
            Some(Err(stderr)) => Err(LensError::FormatFailed(stderr)),
            None => Ok(text.to_string()),
        }
    }

    fn tool_name(&self) -> &str {
        "fake"
    }
}

/// Notifier that remembers what the user would have seen
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub(crate) fn context(tool: &Arc<FakeTool>) -> (Arc<Context>, Arc<RecordingNotifier>) {
    context_with(Config::default(), tool)
}

pub(crate) fn context_with(
    config: Config,
    tool: &Arc<FakeTool>,
) -> (Arc<Context>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = Context::new(config, Arc::clone(tool) as Arc<dyn BuildTool>, notifier.clone())
        .unwrap();
    (ctx, notifier)
}

/// Target living in package directory `abs`
pub(crate) fn target(addr: &str, abs: &str) -> Target {
    Target {
        addr: addr.to_string(),
        private: false,
        annotations: Default::default(),
        sources: Vec::new(),
        gen_sources: None,
        package: Package {
            root: PackageRoot {
                root: PathBuf::from("/ws"),
                rel_root: abs.trim_start_matches("/ws").trim_start_matches('/').to_string(),
                abs: PathBuf::from(abs),
            },
        },
    }
}

/// Target declared at `file:line`
pub(crate) fn declared_at(addr: &str, file: &str, line: u32) -> Target {
    let dir = Path::new(file)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut t = target(addr, &dir);
    t.sources.push(SourceGroup {
        call_frames: vec![CallFrame {
            name: "<module>".to_string(),
            pos: Position {
                file: PathBuf::from(file),
                line,
            },
        }],
    });
    t
}
