use crate::models::HubConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the hub configuration inside the config directory
pub const CONFIG_FILE_NAME: &str = "Notify Hub.yaml";

/// Configuration manager for loading and saving the hub's YAML configuration.
///
/// Manages a single file, `Notify Hub.yaml`, holding logging and dispatch
/// settings. A missing file is not an error: defaults are used.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "NotifyHub Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the hub configuration file.
    ///
    /// # Returns
    /// The loaded HubConfig, or default if file doesn't exist
    pub fn load_config(&self) -> Result<HubConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Hub config file not found at {}, using defaults",
                self.config_path
            );
            return Ok(HubConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read hub config: {}", self.config_path))?;

        let config: HubConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse hub config: {}", self.config_path))?;

        tracing::info!("Loaded hub config from {}", self.config_path);
        Ok(config)
    }

    /// Save the hub configuration file.
    ///
    /// # Arguments
    /// * `config` - The HubConfig to save
    pub fn save_config(&self, config: &HubConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize hub config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write hub config: {}", self.config_path))?;

        tracing::info!("Saved hub config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
