//! Configuration management for heph-lens

pub mod schema;

pub use schema::{Config, LogFormat};

use crate::error::{LensError, LensResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// File name of the per-project override
pub const LOCAL_CONFIG_NAME: &str = ".heph-lens.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("heph-lens")
            .join("config.toml")
    }

    /// Nearest `.heph-lens.toml` at or above `start`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> LensResult<Config> {
        self.load_merged(None).await
    }

    /// Load the global file with `local` layered over it key by key
    pub async fn load_merged(&self, local: Option<&Path>) -> LensResult<Config> {
        let mut merged = if self.config_path.exists() {
            read_table(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            toml::Value::Table(Default::default())
        };

        if let Some(path) = local {
            debug!("Merging local config {}", path.display());
            merge_values(&mut merged, read_table(path).await?);
        }

        let origin = local.unwrap_or(&self.config_path);
        merged.try_into().map_err(|e: toml::de::Error| LensError::ConfigInvalid {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> LensResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            LensError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> LensResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LensError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_table(path: &Path) -> LensResult<toml::Value> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| LensError::io(format!("reading config from {}", path.display()), e))?;

    content
        .parse::<toml::Table>()
        .map(toml::Value::Table)
        .map_err(|e| LensError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Tables merge recursively; any other overlay value replaces the base
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
