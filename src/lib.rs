//! MP3 Player bundler
//!
//! Packages the MP3 Player desktop application into a standalone one-directory
//! bundle: checks and activates the project's virtual environment, removes stale
//! build outputs, provisions the library cache file, runs PyInstaller and
//! verifies the produced bundle.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy and exit codes
//! - **models**: Packaging configuration and bundler invocation types
//! - **config**: `packaging.toml` loading and validation
//! - **system**: Path registry, environment activation, filesystem and console helpers
//! - **log_collector**: `log` backend persisting run logs to disk
//! - **orchestrator**: Phase state machine, bundler execution, the packaging run

pub mod config;
pub mod error;
pub mod log_collector;
pub mod models;
pub mod orchestrator;
pub mod system;

// Re-export the log crate for macro usage
pub use log;

pub use config::ConfigManager;
pub use error::{BuildError, ConfigError, EnvironmentError};
pub use log_collector::{LogCollector, LogLine};
pub use models::{BuildReport, BundleMode, BundleSpec, DataInclusion, PackagingConfig};
pub use orchestrator::{BuildOrchestrator, BuildPhaseState, OrchestrationState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
