//! Unified error type hierarchy for the bundler
//!
//! Provides structured error handling with EnvironmentError, ConfigError and
//! BuildError, plus the mapping from a failed run to a process exit status.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Runtime environment (virtual environment) errors.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Virtual environment not found at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Virtual environment layout is invalid: {0}")]
    InvalidLayout(String),
}

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Build process execution errors.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to remove {}: {source}", .path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to provision {}: {source}", .path.display())]
    ProvisionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to spawn bundler '{program}': {source}")]
    BundlerSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Bundler failed with {}", exit_description(.code))]
    BundlerFailed { code: Option<i32> },

    #[error("Bundle cancelled by user")]
    BundleCancelled,

    #[error("Bundler reported success but {} was not produced", .0.display())]
    OutputMissing(PathBuf),

    #[error("Invalid phase transition: {0}")]
    InvalidTransition(String),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

impl BuildError {
    /// Process exit status for this failure.
    ///
    /// The bundler's own exit code is propagated unchanged; everything else
    /// collapses to 1, except a Ctrl-C interruption which uses the shell
    /// convention of 128 + SIGINT.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildError::BundlerFailed { code: Some(code) } => {
                u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1)
            }
            BuildError::BundleCancelled => 130,
            _ => 1,
        }
    }

    /// Get a user-facing error message suitable for console display
    pub fn user_message(&self) -> String {
        match self {
            BuildError::Environment(EnvironmentError::NotFound { path }) => format!(
                "Error: Virtual environment not found at {}. Create it first (python3 -m venv {}) and install the bundler.",
                path.display(),
                path.display()
            ),
            BuildError::Environment(e) => format!("Error: {}", e),
            BuildError::Config(e) => format!("Configuration error: {}", e),
            BuildError::BundlerFailed { .. } => {
                format!("Error: {}. See the log above for details.", self)
            }
            other => format!("Error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_error_display() {
        let err = EnvironmentError::NotFound {
            path: PathBuf::from("venv"),
        };
        assert_eq!(err.to_string(), "Virtual environment not found at venv");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::FileNotFound("/tmp/packaging.toml".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /tmp/packaging.toml"
        );
    }

    #[test]
    fn test_bundler_exit_code_propagates() {
        assert_eq!(BuildError::BundlerFailed { code: Some(2) }.exit_code(), 2);
        assert_eq!(BuildError::BundlerFailed { code: None }.exit_code(), 1);
        // Out-of-range codes cannot be represented by ExitCode
        assert_eq!(BuildError::BundlerFailed { code: Some(-1) }.exit_code(), 1);
        assert_eq!(BuildError::BundlerFailed { code: Some(256) }.exit_code(), 1);
    }

    #[test]
    fn test_missing_environment_exits_with_one() {
        let err: BuildError = EnvironmentError::NotFound {
            path: PathBuf::from("venv"),
        }
        .into();
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_message().contains("Virtual environment not found"));
    }

    #[test]
    fn test_cancelled_exit_code() {
        assert_eq!(BuildError::BundleCancelled.exit_code(), 130);
    }

    #[test]
    fn test_bundler_failure_message() {
        let err = BuildError::BundlerFailed { code: Some(1) };
        assert_eq!(err.to_string(), "Bundler failed with exit code 1");
        let err = BuildError::BundlerFailed { code: None };
        assert_eq!(err.to_string(), "Bundler failed with termination by signal");
    }
}
