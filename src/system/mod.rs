/// System module: filesystem helpers, environment activation, console output

pub mod console;
pub mod paths;
pub mod venv;

use std::ffi::OsString;
use std::io;
use std::path::Path;

/// Best-effort removal of a file or directory tree.
///
/// Returns `Ok(true)` if something was removed, `Ok(false)` if nothing existed.
/// Not-found is tolerated at every step (including a race where the entry
/// disappears between the check and the delete); every other error propagates.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };

    // A symlink to a directory is removed as a link, never followed
    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Build a PATH value with `dir` placed before the entries of `current`.
///
/// Empty entries of `current` are dropped, as are existing copies of `dir`
/// so repeated activation does not grow the variable.
pub fn prepend_path(dir: &Path, current: Option<OsString>) -> Result<OsString, String> {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(current) = current {
        entries.extend(
            std::env::split_paths(&current)
                .filter(|p| !p.as_os_str().is_empty() && p != dir),
        );
    }

    std::env::join_paths(entries)
        .map_err(|e| format!("Cannot build PATH with {}: {}", dir.display(), e))
}

/// Logging macros for milestone records (routed to the parsed log)
#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        log::info!(target: "parsed", "{}", msg);
    }}
}
