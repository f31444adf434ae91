//! Runtime environment activation as a scoped guard.
//!
//! Shell activation prepends the environment's bin dir to PATH, exports
//! `VIRTUAL_ENV` and unsets `PYTHONHOME` for the rest of the session. Here the
//! same overlay is carried by [`ActivatedEnvironment`] and applied only to child
//! commands; the orchestrator's own process environment is never touched.
//! Dropping the guard deactivates, so teardown also happens on failure paths.

use crate::error::EnvironmentError;
use crate::system::paths::PathRegistry;
use crate::system::prepend_path;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable changes applied to every command run inside the environment.
/// `None` means the variable is removed.
pub type EnvOverlay = Vec<(OsString, Option<OsString>)>;

/// A located, not yet activated, runtime environment.
#[derive(Debug, Clone)]
pub struct RuntimeEnvironment {
    root: PathBuf,
    bin_dir: PathBuf,
}

impl RuntimeEnvironment {
    /// Locate the environment for a project.
    ///
    /// Fails with [`EnvironmentError::NotFound`] when the activation script is
    /// missing. Performs no filesystem mutation.
    pub fn locate(paths: &PathRegistry) -> Result<Self, EnvironmentError> {
        let script = paths.activation_script();
        if !script.is_file() {
            log::debug!("Activation script missing: {}", script.display());
            return Err(EnvironmentError::NotFound {
                path: paths.venv_dir().to_path_buf(),
            });
        }

        let bin_dir = paths.venv_bin_dir();
        if !bin_dir.is_dir() {
            return Err(EnvironmentError::InvalidLayout(format!(
                "{} is not a directory",
                bin_dir.display()
            )));
        }

        Ok(RuntimeEnvironment {
            root: paths.venv_dir().to_path_buf(),
            bin_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// Compute the activation overlay and hand out the scoped guard.
    pub fn activate(self) -> Result<ActivatedEnvironment, EnvironmentError> {
        let path = prepend_path(&self.bin_dir, std::env::var_os("PATH"))
            .map_err(EnvironmentError::InvalidLayout)?;

        let overlay: EnvOverlay = vec![
            (OsString::from("VIRTUAL_ENV"), Some(self.root.clone().into_os_string())),
            (OsString::from("PATH"), Some(path)),
            (OsString::from("PYTHONHOME"), None),
        ];

        log::info!("Activated virtual environment: {}", self.root.display());
        Ok(ActivatedEnvironment {
            env: self,
            overlay,
            active: true,
        })
    }
}

/// Guard for an activated environment. Deactivates on drop.
#[derive(Debug)]
pub struct ActivatedEnvironment {
    env: RuntimeEnvironment,
    overlay: EnvOverlay,
    active: bool,
}

impl ActivatedEnvironment {
    pub fn root(&self) -> &Path {
        self.env.root()
    }

    pub fn overlay(&self) -> &EnvOverlay {
        &self.overlay
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Apply the activation overlay to a child command.
    pub fn apply(&self, command: &mut tokio::process::Command) {
        for (key, value) in &self.overlay {
            match value {
                Some(value) => {
                    command.env(key, value);
                }
                None => {
                    command.env_remove(key);
                }
            }
        }
    }

    /// Resolve an executable the way activated PATH lookup would: the
    /// environment's bin dir wins, otherwise the bare name is returned for the
    /// child's PATH search.
    pub fn resolve_program(&self, name: &str) -> PathBuf {
        let direct = self.env.bin_dir.join(name);
        if direct.is_file() {
            return direct;
        }

        #[cfg(windows)]
        {
            let exe = self.env.bin_dir.join(format!("{}.exe", name));
            if exe.is_file() {
                return exe;
            }
        }

        PathBuf::from(name)
    }

    /// Deactivate now instead of at scope end.
    pub fn deactivate(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.active {
            self.active = false;
            log::info!("Deactivated virtual environment: {}", self.env.root.display());
        }
    }
}

impl Drop for ActivatedEnvironment {
    fn drop(&mut self) {
        self.release();
    }
}
