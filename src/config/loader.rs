//! Config file loader and serialization.

use crate::config::CONFIG_FILE_NAME;
use crate::error::ConfigError;
use crate::models::PackagingConfig;
use std::fs;
use std::path::Path;

/// Load config from a TOML file.
pub fn load_config_from_file(path: &Path) -> Result<PackagingConfig, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.display().to_string())
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config: PackagingConfig = toml::from_str(&content)?;
    log::debug!("Loaded packaging config from {}", path.display());
    Ok(config)
}

/// Load `packaging.toml` from `project_dir`, falling back to defaults when
/// the file does not exist. Unreadable or malformed files are errors.
pub fn load_or_default(project_dir: &Path) -> Result<PackagingConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE_NAME);
    match load_config_from_file(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => Ok(PackagingConfig::default()),
        Err(e) => Err(e),
    }
}

/// Save config to a TOML file.
pub fn save_config_to_file(config: &PackagingConfig, path: &Path) -> Result<(), ConfigError> {
    validate_config_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Validate config path (.toml extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "toml" => Ok(()),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml extension".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BundleMode, DataInclusion};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_validate_config_path_extension() {
        assert!(validate_config_path(Path::new("packaging.toml")).is_ok());
        assert!(validate_config_path(Path::new("packaging.json")).is_err());
        assert!(validate_config_path(Path::new("packaging")).is_err());
        assert!(validate_config_path(Path::new("")).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let result = load_config_from_file(&dir.path().join("packaging.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("packaging.toml");
        fs::write(&path, "app_name = \"Player\"\nmode = \"onefile\"\n").unwrap();

        let cfg = load_config_from_file(&path).unwrap();
        assert_eq!(cfg.app_name, "Player");
        assert_eq!(cfg.mode, BundleMode::OneFile);
        assert_eq!(cfg.venv_dir, PathBuf::from("venv"));
        assert_eq!(cfg.data.len(), 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("packaging.toml");
        fs::write(&path, "app_name = [").unwrap();
        assert!(matches!(
            load_config_from_file(&path),
            Err(ConfigError::InvalidToml(_))
        ));
        assert!(load_or_default(dir.path()).is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("nested").join("packaging.toml");

        let mut cfg = PackagingConfig::default();
        cfg.icon = Some(PathBuf::from("Image/mp3.png"));
        cfg.data.push(DataInclusion {
            source: PathBuf::from("themes"),
            dest: PathBuf::from("ui/themes"),
        });
        save_config_to_file(&cfg, &path).unwrap();

        assert_eq!(load_config_from_file(&path).unwrap(), cfg);
    }
}
