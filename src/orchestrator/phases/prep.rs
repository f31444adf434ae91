//! Preparation - runtime environment precondition and activation.
//!
//! Nothing in this phase mutates the project: a missing environment must
//! leave every existing artifact in place.

use crate::error::BuildError;
use crate::models::PackagingConfig;
use crate::system::paths::PathRegistry;
use crate::system::venv::{ActivatedEnvironment, RuntimeEnvironment};

/// Verify the environment exists, warn about missing bundler inputs, activate.
///
/// # Returns
/// * `Ok(ActivatedEnvironment)` - guard that deactivates when dropped
/// * `Err(BuildError::Environment)` if the environment is missing
pub fn prepare_build_environment(
    paths: &PathRegistry,
    config: &PackagingConfig,
) -> Result<ActivatedEnvironment, BuildError> {
    log::debug!("Preparing build environment at: {}", paths.project_root().display());

    let env = RuntimeEnvironment::locate(paths)?;

    for warning in preflight_warnings(paths, config) {
        log::warn!("{}", warning);
    }

    Ok(env.activate()?)
}

/// Non-fatal checks on bundler inputs. The bundler reports these itself, the
/// warnings only surface them before a long run.
pub fn preflight_warnings(paths: &PathRegistry, config: &PackagingConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    let entry = paths.resolve_relative(&config.entry_point);
    if !entry.is_file() {
        warnings.push(format!(
            "Entry point {} not found; the bundler will fail",
            config.entry_point.display()
        ));
    }

    for inclusion in &config.data {
        let source = paths.resolve_relative(&inclusion.source);
        // The cache directory is created during provisioning
        let provisioned = paths.cache_file().starts_with(&source);
        if !source.exists() && !provisioned {
            warnings.push(format!(
                "Data directory {} not found; it cannot be copied into the bundle",
                inclusion.source.display()
            ));
        }
    }

    if let Some(icon) = &config.icon {
        if !paths.resolve_relative(icon).is_file() {
            warnings.push(format!("Icon {} not found", icon.display()));
        }
    }

    warnings
}
