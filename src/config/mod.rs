//! Configuration module for packaging runs.
//!
//! # Module Structure
//!
//! - `loader`: Reads and writes `packaging.toml`
//! - `validator`: Rejects configurations that would escape the project or
//!   produce an unusable bundler invocation
//!
//! # Configuration Flow
//!
//! 1. `ConfigManager::discover` looks for `packaging.toml` in the project dir
//! 2. Missing file means the built-in defaults (the fixed MP3 Player build)
//! 3. Validator checks the result before the orchestrator sees it

pub mod loader;
pub mod validator;

use crate::error::ConfigError;
use crate::models::PackagingConfig;
use std::path::{Path, PathBuf};

/// Name of the optional override file in the project directory.
pub const CONFIG_FILE_NAME: &str = "packaging.toml";

/// Owns the project directory together with its validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    project_dir: PathBuf,
    config: PackagingConfig,
}

impl ConfigManager {
    /// Create a manager for an already-built configuration.
    pub fn new(project_dir: PathBuf, config: PackagingConfig) -> Self {
        ConfigManager {
            project_dir,
            config,
        }
    }

    /// Load `packaging.toml` from `project_dir` if present, else use defaults.
    /// The result is validated either way.
    pub fn discover(project_dir: &Path) -> Result<Self, ConfigError> {
        let config = loader::load_or_default(project_dir)?;
        validator::validate_config(&config)?;
        Ok(ConfigManager::new(project_dir.to_path_buf(), config))
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn config(&self) -> &PackagingConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PackagingConfig {
        &mut self.config
    }

    /// Path of the override file for this project.
    pub fn config_path(&self) -> PathBuf {
        self.project_dir.join(CONFIG_FILE_NAME)
    }

    /// Whether the project carries a `packaging.toml`.
    pub fn has_overrides(&self) -> bool {
        self.config_path().is_file()
    }

    /// Write the current configuration to the project's override file.
    pub fn save(&self) -> Result<(), ConfigError> {
        loader::save_config_to_file(&self.config, &self.config_path())
    }

    /// Validate the current configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validator::validate_config(&self.config)
    }
}
