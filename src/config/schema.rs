//! Configuration schema for heph-lens
//!
//! Global settings live at `~/.config/heph-lens/config.toml`; a project may
//! override any key in a `.heph-lens.toml` at or above the working directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// External build tool
    pub tool: ToolConfig,

    /// Build file watching and copy-address lenses
    pub build_files: BuildFilesConfig,

    /// Run and launch lenses for source files
    pub file_run: FileRunConfig,

    /// Query cache settings
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Binary name or path of the heph executable
    pub bin: String,

    /// Directory tool commands run in; the current directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            bin: crate::tool::DEFAULT_BIN.to_string(),
            workspace: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildFilesConfig {
    /// Invalidate cached graph data when a build file changes
    pub watcher_enabled: bool,

    /// Globs identifying build files
    pub patterns: Vec<String>,

    /// Copy-address lenses shown in build files
    pub copy_addr: CopyAddrConfig,
}

impl Default for BuildFilesConfig {
    fn default() -> Self {
        Self {
            watcher_enabled: true,
            patterns: vec!["**/BUILD".to_string(), "**/*.BUILD".to_string()],
            copy_addr: CopyAddrConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyAddrConfig {
    pub codelens: bool,

    /// Include targets generated from the package's sources in package queries
    pub gen: bool,

    /// Show private targets too
    pub show_all: bool,
}

impl Default for CopyAddrConfig {
    fn default() -> Self {
        Self {
            codelens: true,
            gen: false,
            show_all: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRunConfig {
    pub codelens: bool,

    /// Include generated targets in the run configuration query
    pub gen: bool,
}

impl Default for FileRunConfig {
    fn default() -> Self {
        Self {
            codelens: true,
            gen: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Packages kept by the scoped query cache
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: crate::cache::DEFAULT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.tool.bin, "heph");
        assert!(config.build_files.watcher_enabled);
        assert!(config.build_files.copy_addr.codelens);
        assert!(!config.build_files.copy_addr.gen);
        assert!(!config.file_run.gen);
        assert_eq!(config.cache.capacity, 20);
        assert_eq!(config.general.log_format, LogFormat::Text);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            log_format = "json"

            [build_files.copy_addr]
            show_all = true
            "#,
        )
        .unwrap();

        assert_eq!(config.general.log_format, LogFormat::Json);
        assert!(config.build_files.copy_addr.show_all);
        assert!(config.build_files.copy_addr.codelens);
        assert_eq!(config.build_files.patterns.len(), 2);
    }

    #[test]
    fn serializes_without_unset_workspace() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("bin = \"heph\""));
        assert!(!text.contains("workspace"));
    }
}
