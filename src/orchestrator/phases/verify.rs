//! Verification - confirm the bundler actually produced the bundle.

use crate::error::BuildError;
use crate::models::BundleMode;
use crate::system::paths::PathRegistry;
use std::path::PathBuf;

/// Check the bundle exists where the bundler was told to put it.
///
/// One-dir mode expects `dist/<name>/`; one-file mode expects `dist/<name>`
/// (`dist/<name>.exe` on Windows).
pub fn verify_output(paths: &PathRegistry, mode: BundleMode) -> Result<PathBuf, BuildError> {
    let output = paths.output_dir().to_path_buf();

    let found = match mode {
        BundleMode::OneDir => output.is_dir().then(|| output.clone()),
        BundleMode::OneFile => {
            let mut exe = output.clone().into_os_string();
            exe.push(".exe");
            let exe = PathBuf::from(exe);
            if output.is_file() {
                Some(output.clone())
            } else if exe.is_file() {
                Some(exe)
            } else {
                None
            }
        }
    };

    match found {
        Some(path) => {
            log::info!("Verified bundle at {}", paths.display_relative(&path));
            Ok(path)
        }
        None => Err(BuildError::OutputMissing(output)),
    }
}
