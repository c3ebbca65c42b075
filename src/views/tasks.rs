//! One runnable task per target in the graph

use crate::cache::GraphQueryCache;
use crate::context::Context;
use crate::tool::expr::ALL_TARGETS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Task type tag hosts use to route definitions back here
pub const TASK_TYPE: &str = "heph";

/// Persisted description of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub addr: String,
    #[serde(default)]
    pub force: bool,
}

impl TaskDefinition {
    /// Forced run of `addr`
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            kind: TASK_TYPE.to_string(),
            addr: addr.into(),
            force: true,
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string(), self.addr.clone()];
        if self.force {
            args.push("--force".to_string());
        }
        args
    }
}

/// A process the host can run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub name: String,
    pub definition: TaskDefinition,
    pub program: String,
    pub args: Vec<String>,
}

impl Task {
    pub fn new(program: impl Into<String>, definition: TaskDefinition) -> Self {
        Self {
            name: definition.addr.clone(),
            args: definition.args(),
            program: program.into(),
            definition,
        }
    }
}

pub struct TaskProvider {
    ctx: Arc<Context>,
    cache: Arc<GraphQueryCache>,
}

impl TaskProvider {
    pub fn new(ctx: &Arc<Context>) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            cache: GraphQueryCache::new(ctx, "tasks", ALL_TARGETS, |_| Vec::new()),
        }
    }

    pub fn cache(&self) -> &Arc<GraphQueryCache> {
        &self.cache
    }

    pub async fn provide_tasks(&self) -> Vec<Task> {
        let bin = self.ctx.config().tool.bin;
        self.cache
            .targets()
            .await
            .iter()
            .map(|target| Task::new(bin.clone(), TaskDefinition::new(target.addr.clone())))
            .collect()
    }

    /// Rebuild a task from a stored definition; `None` without an address
    pub fn resolve_task(&self, definition: &TaskDefinition) -> Option<Task> {
        if definition.addr.is_empty() {
            return None;
        }
        Some(Task::new(self.ctx.config().tool.bin, definition.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, target, FakeTool};

    #[tokio::test]
    async fn one_forced_task_per_target() {
        let tool = Arc::new(FakeTool::new("/ws"));
        tool.respond(
            ALL_TARGETS,
            vec![target("//app:build", "/ws/app"), target("//lib:test", "/ws/lib")],
        );
        let (ctx, _) = context(&tool);
        let provider = TaskProvider::new(&ctx);

        let tasks = provider.provide_tasks().await;
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "//app:build");
        assert_eq!(tasks[0].program, "heph");
        assert_eq!(tasks[0].args, vec!["run", "//app:build", "--force"]);

        provider.provide_tasks().await;
        assert_eq!(tool.calls(), vec![ALL_TARGETS]);
    }

    #[tokio::test]
    async fn resolves_stored_definitions() {
        let tool = Arc::new(FakeTool::new("/ws"));
        let (ctx, _) = context(&tool);
        let provider = TaskProvider::new(&ctx);

        let stored: TaskDefinition =
            serde_json::from_str(r#"{"type":"heph","addr":"//app:serve"}"#).unwrap();
        let task = provider.resolve_task(&stored).unwrap();
        assert_eq!(task.args, vec!["run", "//app:serve"]);

        let empty = TaskDefinition {
            addr: String::new(),
            ..TaskDefinition::new("x")
        };
        assert!(provider.resolve_task(&empty).is_none());
    }

    #[tokio::test]
    async fn failure_is_reported_once() {
        let tool = Arc::new(FakeTool::new("/ws"));
        tool.fail(ALL_TARGETS, "no workspace");
        let (ctx, notifier) = context(&tool);
        let provider = TaskProvider::new(&ctx);

        assert!(provider.provide_tasks().await.is_empty());
        assert!(provider.provide_tasks().await.is_empty());
        assert_eq!(notifier.errors(), vec!["tasks failed: no workspace"]);
    }
}
