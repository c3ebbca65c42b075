//! `heph` CLI build tool
//!
//! Implements the BuildTool trait by shelling out to the heph binary.

use crate::config::schema::ToolConfig;
use crate::error::{LensError, LensResult};
use crate::tool::backend::BuildTool;
use crate::tool::exec::{exec, ExecOptions};
use crate::tool::expr::JSON_FIELDS;
use crate::tool::diagnostic;
use crate::tool::target::Target;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Binary used when nothing overrides it
pub const DEFAULT_BIN: &str = "heph";

/// Build tool backed by the `heph` executable
#[derive(Debug, Clone)]
pub struct HephCli {
    bin: String,
    cwd: Option<PathBuf>,
}

impl HephCli {
    /// Create a tool invoking `bin`
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            cwd: None,
        }
    }

    /// Create a tool from the `[tool]` config section
    pub fn from_config(config: &ToolConfig) -> Self {
        let mut cli = Self::new(config.bin.clone());
        cli.cwd = config.workspace.clone();
        cli
    }

    fn options<I, S>(&self, args: I) -> ExecOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = std::iter::once(self.bin.clone()).chain(args.into_iter().map(Into::into));
        let mut opts = ExecOptions::new(argv);
        opts.cwd = self.cwd.clone();
        opts
    }
}

impl Default for HephCli {
    fn default() -> Self {
        Self::new(DEFAULT_BIN)
    }
}

#[async_trait]
impl BuildTool for HephCli {
    async fn query(&self, expression: &str, flags: &[String]) -> LensResult<Vec<Target>> {
        let mut args = vec![
            "query".to_string(),
            format!("--json={}", JSON_FIELDS),
            expression.to_string(),
        ];
        args.extend(flags.iter().cloned());

        let output = exec(self.options(args)).await?;
        if !output.success() {
            return Err(LensError::QueryFailed(diagnostic(&output, false)));
        }

        let targets: Option<Vec<Target>> =
            serde_json::from_str(&output.stdout).map_err(LensError::QueryParse)?;
        let targets = targets.unwrap_or_default();
        debug!("Query {} returned {} targets", expression, targets.len());
        Ok(targets)
    }

    async fn query_root(&self) -> LensResult<PathBuf> {
        let output = exec(self.options(["query", "root"])).await?;
        if !output.success() {
            return Err(LensError::RootFailed(diagnostic(&output, false)));
        }

        let root = output.stdout.trim();
        if root.is_empty() {
            return Err(LensError::RootFailed("empty workspace root".to_string()));
        }
        Ok(PathBuf::from(root))
    }

    async fn format(&self, cwd: &Path, text: &str, cancel: CancellationToken) -> LensResult<String> {
        let opts = self
            .options(["fmt", "-"])
            .with_cwd(cwd)
            .with_stdin(text)
            .with_cancel(cancel);
        let output = exec(opts).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(LensError::FormatFailed(diagnostic(&output, true)))
        }
    }

    fn tool_name(&self) -> &str {
        &self.bin
    }

    fn reconfigured(&self, config: &ToolConfig) -> Option<Arc<dyn BuildTool>> {
        Some(Arc::new(Self::from_config(config)))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Install a fake heph that runs `body` as a shell script
    fn fake_heph(body: &str) -> (HephCli, TempDir) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("heph");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        (HephCli::new(path.to_string_lossy()), temp)
    }

    #[tokio::test]
    async fn query_parses_targets_and_passes_projection() {
        let (cli, _temp) = fake_heph(
            r#"[ "$2" = "--json={Addr,Private,Annotations,Package,Sources,GenSources}" ] || exit 9
echo '[{"Addr": "//app:a", "Package": {"Root": {"Abs": "/ws/app"}}}]'"#,
        );

        let targets = cli.query("//app:*", &[]).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].addr, "//app:a");
    }

    #[tokio::test]
    async fn query_null_is_empty() {
        let (cli, _temp) = fake_heph("echo null");
        assert!(cli.query(":", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_failure_carries_stderr() {
        let (cli, _temp) = fake_heph("echo 'bad expression' >&2; exit 1");
        let err = cli.query("??", &[]).await.unwrap_err();
        assert!(matches!(err, LensError::QueryFailed(ref msg) if msg == "bad expression"));
    }

    #[tokio::test]
    async fn query_malformed_output_is_parse_failure() {
        let (cli, _temp) = fake_heph("echo '{not json'");
        let err = cli.query(":", &[]).await.unwrap_err();
        assert!(matches!(err, LensError::QueryParse(_)));
    }

    #[tokio::test]
    async fn query_root_is_trimmed() {
        let (cli, _temp) = fake_heph("printf '  /ws/root \\n'");
        assert_eq!(cli.query_root().await.unwrap(), PathBuf::from("/ws/root"));
    }

    #[tokio::test]
    async fn format_pipes_stdin() {
        let (cli, temp) = fake_heph(r#"[ "$1 $2" = "fmt -" ] || exit 9
input=$(cat)
[ "$input" = "x=1" ] || exit 8
printf 'x = 1\n'"#);

        let out = cli.format(temp.path(), "x=1", CancellationToken::new()).await.unwrap();
        assert_eq!(out, "x = 1\n");
    }

    #[tokio::test]
    async fn format_failure_carries_combined_stream() {
        let (cli, temp) = fake_heph("cat >/dev/null; echo 'line 1: syntax error' >&2; exit 1");
        let err = cli.format(temp.path(), "x=", CancellationToken::new()).await.unwrap_err();
        match err {
            LensError::FormatFailed(msg) => assert!(msg.contains("syntax error")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn format_rejecting_unread_input_is_format_failure() {
        let (cli, temp) = fake_heph("echo 'line 1: syntax error' >&2; exit 1");
        let input = "x=\n".repeat(200_000);
        let err = cli
            .format(temp.path(), &input, CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            LensError::FormatFailed(msg) => assert!(msg.contains("syntax error")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_format_is_interrupted() {
        let (cli, temp) = fake_heph("cat >/dev/null; exec sleep 30");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = cli.format(temp.path(), "x=1", cancel).await.unwrap_err();
        assert!(matches!(err, LensError::FormatFailed(_)));
        assert!(started.elapsed() < crate::tool::KILL_GRACE_PERIOD);
    }

    #[tokio::test]
    async fn missing_binary_is_process_failure() {
        let cli = HephCli::new("/nonexistent/heph");
        let err = cli.query_root().await.unwrap_err();
        assert!(matches!(err, LensError::ProcessFailure { .. }));
        assert!(err.hint().is_some());
    }
}
