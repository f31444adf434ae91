/// Centralized Path Registry: every location a packaging run touches
///
/// All paths are resolved against one canonical project root, so phases never
/// depend on the process working directory once the registry exists.

use crate::models::PackagingConfig;
use std::path::{Path, PathBuf};

/// Name of the directory holding environment executables.
#[cfg(windows)]
pub const ENV_BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
pub const ENV_BIN_DIR: &str = "bin";

/// Registry of project-absolute paths for one packaging configuration.
#[derive(Clone, Debug)]
pub struct PathRegistry {
    /// Canonical project root
    project_root: PathBuf,

    venv_dir: PathBuf,
    cache_file: PathBuf,
    spec_file: PathBuf,
    dist_dir: PathBuf,
    output_dir: PathBuf,
    clean_dirs: Vec<PathBuf>,
    log_dir: PathBuf,
}

impl PathRegistry {
    /// Create a registry rooted at `project_dir`.
    ///
    /// # Returns
    /// `Err(String)` if the project directory cannot be canonicalized
    pub fn new(project_dir: &Path, config: &PackagingConfig) -> Result<Self, String> {
        let project_root = project_dir
            .canonicalize()
            .map_err(|e| format!("Failed to canonicalize project directory {}: {}", project_dir.display(), e))?;

        let dist_dir = project_root.join("dist");
        Ok(PathRegistry {
            venv_dir: project_root.join(&config.venv_dir),
            cache_file: project_root.join(&config.cache_file),
            spec_file: project_root.join(config.spec_file_name()),
            output_dir: dist_dir.join(&config.app_name),
            dist_dir,
            clean_dirs: config
                .clean_dirs
                .iter()
                .map(|dir| project_root.join(dir))
                .collect(),
            log_dir: project_root.join(&config.log_dir),
            project_root,
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn venv_dir(&self) -> &Path {
        &self.venv_dir
    }

    /// Directory whose executables the activated environment puts first on PATH
    pub fn venv_bin_dir(&self) -> PathBuf {
        self.venv_dir.join(ENV_BIN_DIR)
    }

    /// Activation script whose presence marks a usable environment
    pub fn activation_script(&self) -> PathBuf {
        self.venv_bin_dir().join("activate")
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Spec file the bundler leaves next to the entry point
    pub fn spec_file(&self) -> &Path {
        &self.spec_file
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    /// Bundle produced by a successful run (`dist/<app_name>`)
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stale artifacts removed before bundling, in removal order
    pub fn stale_artifacts(&self) -> Vec<PathBuf> {
        let mut artifacts = self.clean_dirs.clone();
        artifacts.push(self.spec_file.clone());
        artifacts
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Resolve a relative path against the project root
    pub fn resolve_relative(&self, relative_path: &Path) -> PathBuf {
        self.project_root.join(relative_path)
    }

    /// Render `path` relative to the project root for console output
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}
