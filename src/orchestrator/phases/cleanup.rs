//! Cleanup - remove stale build outputs before bundling.

use crate::error::BuildError;
use crate::system::paths::PathRegistry;
use crate::system::remove_if_exists;
use std::path::PathBuf;

/// Remove build dirs, dist dirs and the stale spec file.
///
/// Missing artifacts are skipped. The first removal error aborts; artifacts
/// already removed stay removed.
///
/// # Returns
/// The artifacts that existed and were removed, in removal order.
pub fn clean_stale_artifacts(paths: &PathRegistry) -> Result<Vec<PathBuf>, BuildError> {
    let mut removed = Vec::new();

    for artifact in paths.stale_artifacts() {
        let existed = remove_if_exists(&artifact).map_err(|source| BuildError::CleanupFailed {
            path: artifact.clone(),
            source,
        })?;

        if existed {
            log::info!("Removed {}", paths.display_relative(&artifact));
            removed.push(artifact);
        } else {
            log::debug!("Nothing to remove at {}", artifact.display());
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PackagingConfig;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_removes_existing_artifacts() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp.path().join("build").join("MP3Player")).unwrap();
        fs::create_dir_all(temp.path().join("dist").join("MP3Player")).unwrap();
        fs::write(temp.path().join("MP3Player.spec"), "# -*- mode: python -*-").unwrap();
        let paths = PathRegistry::new(temp.path(), &PackagingConfig::default()).unwrap();

        let removed = clean_stale_artifacts(&paths).unwrap();

        assert_eq!(removed.len(), 3);
        assert!(!temp.path().join("build").exists());
        assert!(!temp.path().join("dist").exists());
        assert!(!temp.path().join("MP3Player.spec").exists());
    }

    #[test]
    fn test_tolerates_absence() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let paths = PathRegistry::new(temp.path(), &PackagingConfig::default()).unwrap();

        assert!(clean_stale_artifacts(&paths).unwrap().is_empty());
        // Second pass over an already-clean tree
        assert!(clean_stale_artifacts(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_leaves_unrelated_files() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp.path().join("app.py"), "").unwrap();
        fs::write(temp.path().join("Other.spec"), "").unwrap();
        let paths = PathRegistry::new(temp.path(), &PackagingConfig::default()).unwrap();

        clean_stale_artifacts(&paths).unwrap();

        assert!(temp.path().join("app.py").exists());
        assert!(temp.path().join("Other.spec").exists());
    }
}
