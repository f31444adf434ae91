//! Packaging State Management and Phase Tracking
//!
//! - `BuildPhaseState`: discrete phases of a packaging run
//! - `OrchestrationState`: current phase, timing, bookkeeping for the report
//!
//! Transitions are strictly linear; any phase may fail, nothing restarts.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Discrete states in the packaging lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhaseState {
    /// Environment precondition check and activation
    Preparation,

    /// Removal of stale build outputs and spec file
    Cleanup,

    /// Cache file provisioning
    Provisioning,

    /// External bundler running
    Bundling,

    /// Produced bundle checked on disk
    Verification,

    /// Run finished successfully
    Completed,

    /// Run aborted at some phase
    Failed,
}

impl BuildPhaseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPhaseState::Preparation => "preparation",
            BuildPhaseState::Cleanup => "cleanup",
            BuildPhaseState::Provisioning => "provisioning",
            BuildPhaseState::Bundling => "bundling",
            BuildPhaseState::Verification => "verification",
            BuildPhaseState::Completed => "completed",
            BuildPhaseState::Failed => "failed",
        }
    }

    /// Get all valid phase transitions FROM this phase.
    pub fn valid_next_phases(&self) -> Vec<BuildPhaseState> {
        match self {
            BuildPhaseState::Preparation => vec![BuildPhaseState::Cleanup, BuildPhaseState::Failed],
            BuildPhaseState::Cleanup => vec![BuildPhaseState::Provisioning, BuildPhaseState::Failed],
            BuildPhaseState::Provisioning => vec![BuildPhaseState::Bundling, BuildPhaseState::Failed],
            BuildPhaseState::Bundling => vec![BuildPhaseState::Verification, BuildPhaseState::Failed],
            BuildPhaseState::Verification => vec![BuildPhaseState::Completed, BuildPhaseState::Failed],
            BuildPhaseState::Completed | BuildPhaseState::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, next: BuildPhaseState) -> bool {
        self.valid_next_phases().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildPhaseState::Completed | BuildPhaseState::Failed)
    }
}

impl std::fmt::Display for BuildPhaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a packaging run in progress.
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    pub phase: BuildPhaseState,

    /// Phase that was active when the run failed
    pub failed_phase: Option<BuildPhaseState>,

    pub start_time: Instant,

    /// Stale artifacts that existed and were removed
    pub removed: Vec<PathBuf>,

    /// Whether provisioning created the cache file
    pub cache_created: bool,

    pub error: Option<String>,
}

impl OrchestrationState {
    pub fn new() -> Self {
        OrchestrationState {
            phase: BuildPhaseState::Preparation,
            failed_phase: None,
            start_time: Instant::now(),
            removed: Vec::new(),
            cache_created: false,
            error: None,
        }
    }

    /// Attempt to transition to the next phase.
    pub fn transition_to(&mut self, next_phase: BuildPhaseState) -> Result<(), String> {
        if !self.phase.can_transition_to(next_phase) {
            return Err(format!(
                "{} -> {}",
                self.phase.as_str(),
                next_phase.as_str()
            ));
        }
        log::debug!("Phase {} -> {}", self.phase, next_phase);
        self.phase = next_phase;
        Ok(())
    }

    /// Record an error and mark the run as failed.
    pub fn record_error(&mut self, error: String) {
        if !self.phase.is_terminal() {
            self.failed_phase = Some(self.phase);
        }
        self.error = Some(error);
        self.phase = BuildPhaseState::Failed;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for OrchestrationState {
    fn default() -> Self {
        Self::new()
    }
}
