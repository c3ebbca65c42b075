//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// heph-lens - editor intelligence for heph workspaces
///
/// Code lenses, run configurations, tasks and formatting computed from the
/// heph build graph, with cached queries shared across requests.
#[derive(Parser, Debug)]
#[command(name = "heph-lens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "HEPH_LENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .heph-lens.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// heph binary to run (overrides tool.bin)
    #[arg(long, global = true, env = "HEPH_BIN")]
    pub bin: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show code lenses for a file
    Lenses(FileArgs),

    /// Show run and launch configurations for a file
    RunConfigs(FileArgs),

    /// List targets of the package containing a file
    Targets(FileArgs),

    /// List runnable tasks for every target
    Tasks(ListArgs),

    /// Format a build file
    Fmt(FmtArgs),

    /// Print the workspace root
    Root,

    /// Serve requests read line by line from stdin
    Session,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for commands operating on one file
#[derive(Parser, Debug)]
pub struct FileArgs {
    /// File to inspect
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for listing commands
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the fmt command
#[derive(Parser, Debug)]
pub struct FmtArgs {
    /// Build file to format
    pub file: PathBuf,

    /// Rewrite the file in place instead of printing
    #[arg(short, long)]
    pub write: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., build_files.copy_addr.gen)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
