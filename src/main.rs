//! heph-lens - editor intelligence for heph workspaces
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use heph_lens::cli::{commands, Cli, Commands};
use heph_lens::config::{ConfigManager, LogFormat};
use heph_lens::error::{LensError, LensResult};
use heph_lens::tool::{BuildTool, HephCli};
use heph_lens::ui::{self, ConsoleNotifier, StatusIndicator, UiContext};
use heph_lens::{Context, Workspace};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error_with_hint(&e.to_string(), e.hint());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LensResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd =
            std::env::current_dir().map_err(|e| LensError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let mut config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, config.general.log_format);
    if let Some(ref path) = local_config_path {
        debug!("Using local config: {}", path.display());
    }

    if let Some(bin) = cli.bin {
        config.tool.bin = bin;
    }

    // Config commands don't need a build tool
    if let Commands::Config(args) = cli.command {
        return commands::config(args, &config_manager, &config).await;
    }

    let ui_ctx = UiContext::detect();
    let tool: Arc<dyn BuildTool> = Arc::new(HephCli::from_config(&config.tool));
    debug!("Using build tool {}", tool.tool_name());
    let ctx = Context::new(config, tool, Arc::new(ConsoleNotifier::new(ui_ctx)))?;
    let status = StatusIndicator::new(&ui_ctx, ctx.inflight());
    let workspace = Workspace::new(&ctx)?;

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Lenses(args) => commands::lenses(args, &workspace).await,
        Commands::RunConfigs(args) => commands::run_configs(args, &workspace).await,
        Commands::Targets(args) => commands::targets(args, &workspace).await,
        Commands::Tasks(args) => commands::tasks(args, &workspace).await,
        Commands::Fmt(args) => commands::fmt(args, &workspace).await,
        Commands::Root => commands::root(&workspace).await,
        Commands::Session => commands::session(&workspace, &status).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, format: LogFormat) {
    let filter = match verbose {
        0 => EnvFilter::new("heph_lens=warn"),
        1 => EnvFilter::new("heph_lens=info"),
        _ => EnvFilter::new("heph_lens=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.without_time().init(),
    }
}
