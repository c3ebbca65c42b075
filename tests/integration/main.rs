//! Integration tests for heph-lens

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn lens() -> Command {
        let mut cmd = cargo_bin_cmd!("heph-lens");
        cmd.arg("--no-local");
        cmd
    }

    #[test]
    fn help_displays() {
        lens()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("editor intelligence for heph"));
    }

    #[test]
    fn version_displays() {
        lens()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("heph-lens"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        lens()
            .args(["config", "path", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        lens()
            .args(["config", "show", "--config"])
            .arg(temp.path().join("config.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("[build_files]"))
            .stdout(predicate::str::contains("capacity = 20"));
    }

    #[test]
    fn config_init_then_set() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        lens()
            .args(["config", "init", "--config"])
            .arg(&path)
            .assert()
            .success();
        assert!(path.exists());

        lens()
            .args(["config", "set", "cache.capacity", "50", "--config"])
            .arg(&path)
            .assert()
            .success();
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("capacity = 50"));

        lens()
            .args(["config", "show", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("capacity = 50"));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let temp = TempDir::new().unwrap();
        lens()
            .args(["config", "set", "nope.key", "1", "--config"])
            .arg(temp.path().join("config.toml"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }

    #[test]
    fn invalid_config_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[cache]\ncapacity = \"lots\"\n").unwrap();

        lens()
            .args(["config", "show", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("hint:"));
    }

    #[test]
    fn missing_heph_binary_fails() {
        let temp = TempDir::new().unwrap();
        lens()
            .args(["root", "--bin", "/nonexistent/heph", "--config"])
            .arg(temp.path().join("config.toml"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("error:"));
    }
}

#[cfg(unix)]
mod workspace_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A workspace with one package `app` and a fake heph answering for it
    struct Fixture {
        temp: TempDir,
        bin: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let ws = temp.path().join("ws");
            std::fs::create_dir_all(ws.join("app")).unwrap();
            std::fs::write(ws.join("app/BUILD"), "x=1").unwrap();
            std::fs::write(ws.join("app/main.go"), "package main\n").unwrap();

            let ws = ws.display();
            let target = format!(
                r#"{{"Addr": "//app:build", "Package": {{"Root": {{"Root": "{ws}", "RelRoot": "app", "Abs": "{ws}/app"}}}}, "Sources": [{{"CallFrames": [{{"Name": "<module>", "Pos": {{"File": "{ws}/app/BUILD", "Line": 3}}}}]}}], "Annotations": {{"vscode-task": {{"file": "main.go"}}}}}}"#
            );
            let script = format!(
                r#"#!/bin/sh
case "$1 $2" in
  "query root") echo "{ws}"; exit 0 ;;
  "fmt -") input=$(cat); [ "$input" = "x=1" ] || {{ echo "syntax error" >&2; exit 1; }}; printf 'x = 1\n'; exit 0 ;;
esac
case "$3" in
  "//app:*"|":"|*has_annotation*) echo '[{target}]' ;;
  *) echo null ;;
esac
"#
            );

            let bin = temp.path().join("heph");
            std::fs::write(&bin, script).unwrap();
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

            Self { temp, bin }
        }

        fn ws(&self) -> PathBuf {
            self.temp.path().join("ws")
        }

        fn file(&self, rel: &str) -> PathBuf {
            self.ws().join(rel)
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("heph-lens");
            cmd.arg("--no-local")
                .arg("--bin")
                .arg(&self.bin)
                .arg("--config")
                .arg(self.temp.path().join("config.toml"))
                .current_dir(self.ws());
            cmd
        }
    }

    fn json(output: &[u8]) -> serde_json::Value {
        serde_json::from_slice(output).unwrap()
    }

    #[test]
    fn root_prints_workspace() {
        let fx = Fixture::new();
        fx.cmd()
            .arg("root")
            .assert()
            .success()
            .stdout(predicate::str::contains(fx.ws().display().to_string()));
    }

    #[test]
    fn build_file_lenses_as_json() {
        let fx = Fixture::new();
        let output = fx
            .cmd()
            .args(["lenses", "--format", "json"])
            .arg(fx.file("app/BUILD"))
            .output()
            .unwrap();
        assert!(output.status.success());

        let lenses = json(&output.stdout);
        assert_eq!(lenses[0]["line"], 2);
        assert_eq!(lenses[0]["title"], "copy addr");
        assert_eq!(lenses[0]["arguments"][0], "//app:build");
    }

    #[test]
    fn relative_paths_resolve_from_cwd() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["lenses", "--format", "plain", "app/BUILD"])
            .assert()
            .success()
            .stdout(predicate::str::contains("3\tcopy addr"));
    }

    #[test]
    fn targets_lists_package() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["targets", "--format", "plain"])
            .arg(fx.file("app/main.go"))
            .assert()
            .success()
            .stdout(predicate::str::contains("//app:build"));
    }

    #[test]
    fn targets_outside_workspace_fails() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["targets"])
            .arg(fx.temp.path().join("elsewhere.go"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("outside"));
    }

    #[test]
    fn run_lenses_for_source_file() {
        let fx = Fixture::new();
        let output = fx
            .cmd()
            .args(["lenses", "--format", "json"])
            .arg(fx.file("app/main.go"))
            .output()
            .unwrap();
        assert!(output.status.success());

        let lenses = json(&output.stdout);
        assert_eq!(lenses[0]["line"], 0);
        assert_eq!(lenses[0]["title"], "//app:build");
        assert_eq!(lenses[0]["command"], "heph.runTarget");
    }

    #[test]
    fn run_configs_for_source_file() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["run-configs", "--format", "plain"])
            .arg(fx.file("app/main.go"))
            .assert()
            .success()
            .stdout(predicate::str::contains("//app:build"));
    }

    #[test]
    fn tasks_are_listed() {
        let fx = Fixture::new();
        let output = fx.cmd().args(["tasks", "--format", "json"]).output().unwrap();
        assert!(output.status.success());

        let tasks = json(&output.stdout);
        assert_eq!(tasks[0]["definition"]["addr"], "//app:build");
    }

    #[test]
    fn fmt_prints_formatted_text() {
        let fx = Fixture::new();
        fx.cmd()
            .arg("fmt")
            .arg(fx.file("app/BUILD"))
            .assert()
            .success()
            .stdout("x = 1\n");
    }

    #[test]
    fn fmt_write_rewrites_file() {
        let fx = Fixture::new();
        let file = fx.file("app/BUILD");
        fx.cmd().args(["fmt", "--write"]).arg(&file).assert().success();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x = 1\n");
    }

    #[test]
    fn fmt_failure_leaves_file_alone() {
        let fx = Fixture::new();
        let file = fx.file("app/BUILD");
        std::fs::write(&file, "x=").unwrap();

        fx.cmd()
            .args(["fmt", "--write"])
            .arg(&file)
            .assert()
            .failure()
            .stderr(predicate::str::contains("syntax error"));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x=");
    }

    #[test]
    fn session_answers_line_requests() {
        let fx = Fixture::new();
        let build = fx.file("app/BUILD");
        let input = format!(
            "lenses {}\nstatus\nbogus\nquit\n",
            Path::new(&build).display()
        );

        fx.cmd()
            .arg("session")
            .write_stdin(input)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""title":"copy addr""#))
            .stdout(predicate::str::contains(r#""status":"idle""#))
            .stdout(predicate::str::contains("unknown request: bogus"));
    }
}
