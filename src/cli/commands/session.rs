//! Session command - long-running host protocol over stdin/stdout
//!
//! One request per line, one JSON reply per request. Change notifications
//! are written as `{"event": ...}` lines whenever they fire.
//!
//! Requests: `focus <file>`, `changed <path>`, `refresh`, `lenses <file>`,
//! `run-configs`, `tasks`, `set <key> <value>`, `status`, `quit`.

use super::absolute;
use super::config::apply_setting;
use crate::error::{LensError, LensResult};
use crate::signal::Subscription;
use crate::ui::StatusIndicator;
use crate::views::commands;
use crate::workspace::Workspace;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Debug, PartialEq)]
enum Request {
    Focus(PathBuf),
    Changed(PathBuf),
    Refresh,
    Lenses(PathBuf),
    RunConfigs,
    Tasks,
    Set { key: String, value: String },
    Status,
    Quit,
}

pub async fn execute(workspace: &Workspace, status: &Arc<StatusIndicator>) -> LensResult<()> {
    let _events = subscribe_events(workspace, |event| println!("{}", event));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| LensError::io("reading session request", e))?
    {
        let request = match parse_request(&line) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", json!({ "error": message }));
                continue;
            }
        };
        debug!(?request, "Session request");

        if request == Request::Quit {
            break;
        }
        println!("{}", handle(workspace, status, request).await);
    }

    Ok(())
}

fn parse_request(line: &str) -> Result<Option<Request>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let path = |verb: &str| {
        if rest.is_empty() {
            Err(format!("{verb} needs a path"))
        } else {
            Ok(PathBuf::from(rest))
        }
    };

    let request = match verb {
        "focus" => Request::Focus(path(verb)?),
        "changed" => Request::Changed(path(verb)?),
        "lenses" => Request::Lenses(path(verb)?),
        "refresh" | commands::REFRESH_STATE => Request::Refresh,
        "run-configs" | commands::EDITOR_RUN_CONFIGS => Request::RunConfigs,
        "tasks" => Request::Tasks,
        "status" => Request::Status,
        "quit" | "exit" => Request::Quit,
        "set" => {
            let (key, value) = rest
                .split_once(' ')
                .ok_or_else(|| "set needs a key and a value".to_string())?;
            Request::Set {
                key: key.to_string(),
                value: value.trim().to_string(),
            }
        }
        other => return Err(format!("unknown request: {other}")),
    };

    Ok(Some(request))
}

async fn handle(workspace: &Workspace, status: &StatusIndicator, request: Request) -> Value {
    match try_handle(workspace, status, request).await {
        Ok(reply) => reply,
        Err(err) => json!({ "error": err.to_string() }),
    }
}

async fn try_handle(
    workspace: &Workspace,
    status: &StatusIndicator,
    request: Request,
) -> LensResult<Value> {
    let reply = match request {
        Request::Focus(file) => {
            workspace.editor().set_focus(absolute(&file)?);
            json!({ "ok": true })
        }
        Request::Changed(path) => {
            let invalidated = workspace.file_changed(&absolute(&path)?);
            json!({ "ok": true, "invalidated": invalidated })
        }
        Request::Refresh => {
            workspace.refresh();
            json!({ "ok": true })
        }
        Request::Lenses(file) => {
            let lenses = workspace.lenses(&absolute(&file)?).await;
            json!({ "lenses": lenses })
        }
        Request::RunConfigs => {
            let configs = workspace.editor().reconcile().await;
            json!({ "configs": configs })
        }
        Request::Tasks => {
            let tasks = workspace.tasks().provide_tasks().await;
            json!({ "tasks": tasks })
        }
        Request::Set { key, value } => {
            let mut config = workspace.context().config();
            apply_setting(&mut config, &key, &value)?;
            workspace.apply_config(config)?;
            json!({ "ok": true })
        }
        Request::Status => json!({ "status": status.describe() }),
        Request::Quit => json!({ "ok": true }),
    };
    Ok(reply)
}

/// Forward change notifications to `sink` for as long as the subscriptions live
fn subscribe_events<F>(workspace: &Workspace, sink: F) -> Vec<Subscription>
where
    F: Fn(Value) + Clone + Send + Sync + 'static,
{
    let lenses = sink.clone();
    let run_lenses = sink.clone();
    let configs = sink.clone();
    let editor = Arc::downgrade(workspace.editor());

    vec![
        workspace
            .build_lenses()
            .on_change()
            .subscribe(move |_| lenses(json!({ "event": "lensesChanged", "kind": "build" }))),
        workspace
            .file_run()
            .on_change()
            .subscribe(move |_| run_lenses(json!({ "event": "lensesChanged", "kind": "run" }))),
        workspace
            .editor()
            .on_has_run_configs()
            .subscribe(move |has| {
                let file = editor.upgrade().and_then(|editor| editor.focus());
                configs(json!({ "event": "runConfigs", "file": file, "hasRunConfigs": has }))
            }),
        workspace
            .context()
            .inflight()
            .on_change()
            .subscribe(move |busy| sink(json!({ "event": "status", "busy": busy }))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, declared_at, FakeTool};
    use crate::tool::expr;
    use crate::ui::UiContext;
    use std::sync::Mutex;

    fn setup(tool: &Arc<FakeTool>) -> (Workspace, Arc<StatusIndicator>) {
        let (ctx, _) = context(tool);
        let status = StatusIndicator::new(&UiContext::non_interactive(), ctx.inflight());
        (Workspace::new(&ctx).unwrap(), status)
    }

    #[test]
    fn parses_requests() {
        assert_eq!(
            parse_request("focus /ws/app/main.go").unwrap(),
            Some(Request::Focus("/ws/app/main.go".into()))
        );
        assert_eq!(parse_request("  ").unwrap(), None);
        assert_eq!(parse_request("heph.refreshState").unwrap(), Some(Request::Refresh));
        assert_eq!(
            parse_request("set build_files.copy_addr.gen true").unwrap(),
            Some(Request::Set {
                key: "build_files.copy_addr.gen".into(),
                value: "true".into()
            })
        );
        assert!(parse_request("lenses").is_err());
        assert!(parse_request("launch //app:x").is_err());
    }

    #[tokio::test]
    async fn lenses_and_invalidation() {
        let tool = Arc::new(FakeTool::new("/ws"));
        tool.respond(
            &expr::package_targets("app"),
            vec![declared_at("//app:build", "/ws/app/BUILD", 2)],
        );
        let (workspace, status) = setup(&tool);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let _subs = subscribe_events(&workspace, move |event| sink.lock().unwrap().push(event));

        let reply = handle(&workspace, &status, Request::Lenses("/ws/app/BUILD".into())).await;
        assert_eq!(reply["lenses"][0]["line"], 1);
        assert_eq!(reply["lenses"][0]["title"], "copy addr");
        assert_eq!(reply["lenses"][0]["command"], "heph.copyAddr");

        let reply = handle(&workspace, &status, Request::Changed("/ws/app/BUILD".into())).await;
        assert_eq!(reply, json!({ "ok": true, "invalidated": true }));

        let events = events.lock().unwrap();
        assert!(events.contains(&json!({ "event": "status", "busy": true })));
        assert!(events.contains(&json!({ "event": "lensesChanged", "kind": "build" })));
        assert!(events.contains(&json!({ "event": "lensesChanged", "kind": "run" })));
    }

    #[tokio::test]
    async fn set_applies_settings() {
        let tool = Arc::new(FakeTool::new("/ws"));
        let (workspace, status) = setup(&tool);

        let reply = handle(
            &workspace,
            &status,
            Request::Set {
                key: "build_files.watcher_enabled".into(),
                value: "false".into(),
            },
        )
        .await;
        assert_eq!(reply, json!({ "ok": true }));
        assert!(!workspace.file_changed(std::path::Path::new("/ws/app/BUILD")));

        let reply = handle(
            &workspace,
            &status,
            Request::Set {
                key: "nope".into(),
                value: "1".into(),
            },
        )
        .await;
        assert!(reply["error"].as_str().unwrap().contains("Unknown config key"));
    }

    #[tokio::test]
    async fn set_reaches_running_components() {
        let tool = Arc::new(FakeTool::new("/ws"));
        let (workspace, status) = setup(&tool);

        let set = |key: &str, value: &str| Request::Set {
            key: key.into(),
            value: value.into(),
        };
        let reply = handle(&workspace, &status, set("cache.capacity", "3")).await;
        assert_eq!(reply, json!({ "ok": true }));
        assert_eq!(workspace.packages().capacity(), 3);

        let reply = handle(&workspace, &status, set("tool.bin", "/opt/heph")).await;
        assert_eq!(reply, json!({ "ok": true }));
        assert_eq!(workspace.context().config().tool.bin, "/opt/heph");
    }

    #[tokio::test]
    async fn status_reports_idle() {
        let tool = Arc::new(FakeTool::new("/ws"));
        let (workspace, status) = setup(&tool);

        let reply = handle(&workspace, &status, Request::Status).await;
        assert_eq!(reply, json!({ "status": "idle" }));
    }
}
