//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LogFormat};
use crate::error::{LensError, LensResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set` and the session `set` request
pub const SETTABLE_KEYS: &[&str] = &[
    "general.log_format",
    "tool.bin",
    "tool.workspace",
    "build_files.watcher_enabled",
    "build_files.patterns",
    "build_files.copy_addr.codelens",
    "build_files.copy_addr.gen",
    "build_files.copy_addr.show_all",
    "file_run.codelens",
    "file_run.gen",
    "cache.capacity",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> LensResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> LensResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> LensResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok(&ctx, &format!("Configuration initialized at {}", path.display()));

    Ok(())
}

/// Update the file's own settings, leaving local overrides out of it
async fn set_value(manager: &ConfigManager, key: &str, value: &str) -> LensResult<()> {
    let mut config = manager.load().await?;
    apply_setting(&mut config, key, value)?;
    manager.save(&config).await?;

    ui::step_ok(&UiContext::detect(), &format!("Set {} = {}", key, value));
    Ok(())
}

/// Set one dotted key on `config`
pub fn apply_setting(config: &mut Config, key: &str, value: &str) -> LensResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => {
            config.general.log_format = match value {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(invalid(key, value, "text or json")),
            }
        }

        ["tool", "bin"] => config.tool.bin = value.to_string(),
        ["tool", "workspace"] if value.is_empty() => config.tool.workspace = None,
        ["tool", "workspace"] => config.tool.workspace = Some(PathBuf::from(value)),

        ["build_files", "watcher_enabled"] => {
            config.build_files.watcher_enabled = parse_bool(key, value)?
        }
        ["build_files", "patterns"] => {
            config.build_files.patterns = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        ["build_files", "copy_addr", "codelens"] => {
            config.build_files.copy_addr.codelens = parse_bool(key, value)?
        }
        ["build_files", "copy_addr", "gen"] => {
            config.build_files.copy_addr.gen = parse_bool(key, value)?
        }
        ["build_files", "copy_addr", "show_all"] => {
            config.build_files.copy_addr.show_all = parse_bool(key, value)?
        }

        ["file_run", "codelens"] => config.file_run.codelens = parse_bool(key, value)?,
        ["file_run", "gen"] => config.file_run.gen = parse_bool(key, value)?,

        ["cache", "capacity"] => {
            config.cache.capacity = value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid(key, value, "a positive number"))?
        }

        _ => {
            return Err(LensError::User(format!(
                "Unknown config key: {} (valid keys: {})",
                key,
                SETTABLE_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_bool(key: &str, value: &str) -> LensResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(key, value, "true or false")),
    }
}

fn invalid(key: &str, value: &str, expected: &str) -> LensError {
    LensError::User(format!(
        "Invalid value for {}: {} (expected {})",
        key, value, expected
    ))
}
