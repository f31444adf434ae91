//! Build Orchestration: linear packaging pipeline
//! (Preparation -> Cleanup -> Provisioning -> Bundling -> Verification).

pub mod executor;
pub mod phases;
pub mod state;

pub use executor::{run_bundler, BundlerLevel, BundlerOutput, OutputStream};
pub use phases::{clean_stale_artifacts, ensure_cache_file, prepare_build_environment, verify_output};
pub use state::{BuildPhaseState, OrchestrationState};

use crate::config::ConfigManager;
use crate::error::BuildError;
use crate::log_parsed;
use crate::models::{BuildReport, BundleMode, BundleSpec, PackagingConfig};
use crate::system::paths::PathRegistry;
use std::path::Path;
use tokio::sync::watch;

/// Runs one packaging pass over a project directory.
pub struct BuildOrchestrator {
    config: PackagingConfig,
    paths: PathRegistry,
    state: OrchestrationState,

    /// Receives `true` when the run should stop
    cancel_rx: watch::Receiver<bool>,
}

impl BuildOrchestrator {
    /// Create an orchestrator for `project_dir` with an already-validated config.
    pub fn new(
        project_dir: &Path,
        config: PackagingConfig,
        cancel_rx: watch::Receiver<bool>,
    ) -> Result<Self, BuildError> {
        let paths = PathRegistry::new(project_dir, &config)
            .map_err(|e| BuildError::Environment(crate::error::EnvironmentError::InvalidLayout(e)))?;

        Ok(BuildOrchestrator {
            config,
            paths,
            state: OrchestrationState::new(),
            cancel_rx,
        })
    }

    /// Create an orchestrator from a discovered project configuration.
    pub fn from_manager(
        manager: &ConfigManager,
        cancel_rx: watch::Receiver<bool>,
    ) -> Result<Self, BuildError> {
        Self::new(manager.project_dir(), manager.config().clone(), cancel_rx)
    }

    /// Orchestrator that cannot be cancelled.
    pub fn uncancellable(project_dir: &Path, config: PackagingConfig) -> Result<Self, BuildError> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        Self::new(project_dir, config, cancel_rx)
    }

    pub fn paths(&self) -> &PathRegistry {
        &self.paths
    }

    pub fn state(&self) -> &OrchestrationState {
        &self.state
    }

    pub fn current_phase(&self) -> BuildPhaseState {
        self.state.phase
    }

    /// Execute the full pipeline. The first failing phase aborts the run.
    pub async fn run(&mut self) -> Result<BuildReport, BuildError> {
        let result = self.run_phases().await;

        if let Err(e) = &result {
            self.state.record_error(e.to_string());
            log::error!(
                "Packaging failed during {}: {}",
                self.state.failed_phase.unwrap_or(BuildPhaseState::Preparation),
                e
            );
        }

        result
    }

    async fn run_phases(&mut self) -> Result<BuildReport, BuildError> {
        log_parsed!(
            "Packaging {} from {}",
            self.config.app_name,
            self.paths.project_root().display()
        );

        // Nothing may be mutated before the environment is confirmed
        let env = prepare_build_environment(&self.paths, &self.config)?;

        self.advance(BuildPhaseState::Cleanup)?;
        log_parsed!("Cleaning previous build artifacts");
        self.state.removed = clean_stale_artifacts(&self.paths)?;

        self.advance(BuildPhaseState::Provisioning)?;
        self.state.cache_created = ensure_cache_file(self.paths.cache_file())?;

        self.advance(BuildPhaseState::Bundling)?;
        let program = env.resolve_program(&self.config.bundler);
        let spec = BundleSpec::from_config(&self.config, program);
        log_parsed!("Bundling {} with {}", spec.entry_point.display(), spec.program.display());
        run_bundler(
            &spec,
            self.paths.project_root(),
            &env,
            |output| output.log(),
            self.cancel_rx.clone(),
        )
        .await?;

        self.advance(BuildPhaseState::Verification)?;
        let output_dir = verify_output(&self.paths, self.config.mode)?;

        env.deactivate();
        self.advance(BuildPhaseState::Completed)?;
        log_parsed!("Packaging complete in {:.1}s", self.state.elapsed().as_secs_f64());

        Ok(BuildReport {
            output_dir,
            cache_file: self.paths.cache_file().to_path_buf(),
            cache_created: self.state.cache_created,
            removed: self.state.removed.clone(),
            elapsed: self.state.elapsed(),
        })
    }

    /// Move to the next phase, honouring a pending cancellation first.
    fn advance(&mut self, next: BuildPhaseState) -> Result<(), BuildError> {
        if *self.cancel_rx.borrow() {
            return Err(BuildError::BundleCancelled);
        }
        self.state
            .transition_to(next)
            .map_err(BuildError::InvalidTransition)
    }

    /// Console lines announcing a successful run.
    pub fn summary(&self, report: &BuildReport) -> Vec<String> {
        let mut output = self.paths.display_relative(&report.output_dir);
        if self.config.mode == BundleMode::OneDir {
            output.push(std::path::MAIN_SEPARATOR);
        }

        vec![
            "Build complete!".to_string(),
            format!("Output: {}", output),
            format!(
                "Cache file: {}",
                self.paths.display_relative(&report.cache_file)
            ),
        ]
    }
}
