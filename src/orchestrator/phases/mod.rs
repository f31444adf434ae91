//! Orchestrator phases: the linear packaging pipeline.
//!
//! - **Preparation** (`prep`) - environment precondition check, asset preflight, activation
//! - **Cleanup** (`cleanup`) - stale output removal
//! - **Provisioning** (`provision`) - cache file placeholder
//! - **Verification** (`verify`) - produced bundle check
//!
//! Bundling itself lives in `orchestrator::executor`.

pub mod cleanup;
pub mod prep;
pub mod provision;
pub mod verify;

pub use cleanup::clean_stale_artifacts;
pub use prep::prepare_build_environment;
pub use provision::ensure_cache_file;
pub use verify::verify_output;
