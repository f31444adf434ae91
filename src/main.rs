use std::process::ExitCode;

use mp3_bundler::system::console::{self, Tone};
use mp3_bundler::system::paths::PathRegistry;
use mp3_bundler::system::venv::RuntimeEnvironment;
use mp3_bundler::{BuildError, BuildOrchestrator, ConfigManager, EnvironmentError, LogCollector};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let project_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            console::error(&format!("Error: cannot determine project directory: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let manager = match ConfigManager::discover(&project_dir) {
        Ok(manager) => manager,
        Err(e) => {
            console::error(&BuildError::from(e).user_message());
            return ExitCode::FAILURE;
        }
    };
    let config = manager.config();

    console::status(&format!("Building {}...", config.app_name), Tone::Info);

    // Environment precondition before anything is written, log files included
    let precondition = PathRegistry::new(&project_dir, config)
        .map_err(EnvironmentError::InvalidLayout)
        .and_then(|paths| RuntimeEnvironment::locate(&paths));
    if let Err(e) = precondition {
        let e = BuildError::from(e);
        console::error(&e.user_message());
        return ExitCode::from(e.exit_code());
    }

    // =========================================================================
    // LOGGING
    // =========================================================================
    // A run without a writable log directory still proceeds, console only
    let collector = match LogCollector::new(&project_dir.join(&config.log_dir), config.echo) {
        Ok(collector) => {
            if let Err(e) = collector.install() {
                eprintln!("[Main] WARNING: Failed to install logger: {}", e);
            }
            Some(collector)
        }
        Err(e) => {
            eprintln!("[Main] WARNING: File logging disabled: {}", e);
            None
        }
    };

    if manager.has_overrides() {
        log::info!("Using packaging overrides from {}", manager.config_path().display());
    }

    // Ctrl-C stops the bundler instead of killing us mid-phase
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = match BuildOrchestrator::from_manager(&manager, cancel_rx) {
        Ok(mut orchestrator) => orchestrator
            .run()
            .await
            .map(|report| orchestrator.summary(&report)),
        Err(e) => Err(e),
    };

    if let Some(collector) = &collector {
        if let Err(e) = collector.wait_for_empty().await {
            eprintln!("[Main] WARNING: Failed to flush logs: {}", e);
        }
    }

    match outcome {
        Ok(lines) => {
            for line in &lines {
                console::status(line, Tone::Success);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            console::error(&e.user_message());
            ExitCode::from(e.exit_code())
        }
    }
}
