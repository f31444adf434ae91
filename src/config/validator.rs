//! Config validation.

use crate::error::ConfigError;
use crate::models::PackagingConfig;
use std::path::{Component, Path};

/// Validate the output name: non-empty, usable as a single path component.
pub fn validate_app_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Application name cannot be empty".to_string(),
        ));
    }

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::ValidationFailed(format!(
            "Application name must not contain path separators, got: {}",
            name
        )));
    }

    Ok(())
}

/// Validate that `path` stays inside the project directory.
///
/// Absolute paths and any `..` component are rejected: cleanup deletes these
/// paths recursively.
pub fn validate_project_relative(label: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(format!(
            "{} cannot be empty",
            label
        )));
    }

    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must not leave the project directory: {}",
                    label,
                    path.display()
                )))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be relative to the project directory: {}",
                    label,
                    path.display()
                )))
            }
        }
    }

    // "." alone would make cleanup wipe the project
    if !path.components().any(|c| matches!(c, Component::Normal(_))) {
        return Err(ConfigError::ValidationFailed(format!(
            "{} must name an entry inside the project directory: {}",
            label,
            path.display()
        )));
    }

    Ok(())
}

/// Validate the cache file path (project-relative, `.json`).
pub fn validate_cache_file(path: &Path) -> Result<(), ConfigError> {
    validate_project_relative("Cache file", path)?;

    match path.extension() {
        Some(ext) if ext == "json" => Ok(()),
        _ => Err(ConfigError::ValidationFailed(format!(
            "Cache file must have .json extension: {}",
            path.display()
        ))),
    }
}

/// Run every check against a packaging configuration.
pub fn validate_config(config: &PackagingConfig) -> Result<(), ConfigError> {
    validate_app_name(&config.app_name)?;
    validate_project_relative("Virtual environment directory", &config.venv_dir)?;
    validate_project_relative("Entry point", &config.entry_point)?;
    validate_cache_file(&config.cache_file)?;
    validate_project_relative("Log directory", &config.log_dir)?;

    if config.bundler.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Bundler program cannot be empty".to_string(),
        ));
    }

    for dir in &config.clean_dirs {
        validate_project_relative("Clean directory", dir)?;
    }

    for inclusion in &config.data {
        validate_project_relative("Data source", &inclusion.source)?;
        validate_project_relative("Data destination", &inclusion.dest)?;
    }

    if let Some(icon) = &config.icon {
        validate_project_relative("Icon", icon)?;
    }

    Ok(())
}
