//! Provisioning - make sure the library cache file exists.

use crate::error::BuildError;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Placeholder written to a newly created cache file.
pub const EMPTY_CACHE: &[u8] = b"{}";

/// Ensure `cache_file` exists, creating it with `{}` if it does not.
///
/// An existing file is never rewritten. Creation uses `create_new`, so a file
/// that appears between the check and the write is also left alone.
///
/// # Returns
/// `Ok(true)` if the file was created by this call.
pub fn ensure_cache_file(cache_file: &Path) -> Result<bool, BuildError> {
    let provision_err = |source: io::Error| BuildError::ProvisionFailed {
        path: cache_file.to_path_buf(),
        source,
    };

    if cache_file.is_file() {
        if let Some(warning) = inspect_existing(cache_file) {
            log::warn!("{}", warning);
        }
        log::info!("Cache file present, leaving untouched: {}", cache_file.display());
        return Ok(false);
    }

    if let Some(parent) = cache_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(provision_err)?;
        }
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(cache_file) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && cache_file.is_file() => {
            log::info!("Cache file appeared concurrently, leaving untouched: {}", cache_file.display());
            return Ok(false);
        }
        Err(e) => return Err(provision_err(e)),
    };

    file.write_all(EMPTY_CACHE).map_err(provision_err)?;
    file.sync_all().map_err(provision_err)?;

    log::info!("Created empty cache file: {}", cache_file.display());
    Ok(true)
}

/// The app parses the cache as a JSON object; report when it will not.
fn inspect_existing(cache_file: &Path) -> Option<String> {
    let bytes = match std::fs::read(cache_file) {
        Ok(bytes) => bytes,
        Err(e) => return Some(format!("Cannot read cache file {}: {}", cache_file.display(), e)),
    };

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) if value.is_object() => None,
        Ok(_) => Some(format!(
            "Cache file {} is not a JSON object; the bundled app may ignore it",
            cache_file.display()
        )),
        Err(e) => Some(format!(
            "Cache file {} is not valid JSON ({}); bundling it unchanged",
            cache_file.display(),
            e
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_file_and_parent() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let cache = temp.path().join("data").join("library.json");

        assert!(ensure_cache_file(&cache).unwrap());
        assert_eq!(fs::read(&cache).unwrap(), b"{}");
    }

    #[test]
    fn test_existing_file_untouched() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let cache = temp.path().join("data").join("library.json");
        fs::create_dir_all(cache.parent().unwrap()).unwrap();
        let content = br#"{"Artist": {"Album": ["song.mp3"]}}"#;
        fs::write(&cache, content).unwrap();

        assert!(!ensure_cache_file(&cache).unwrap());
        assert_eq!(fs::read(&cache).unwrap(), content);
    }

    #[test]
    fn test_idempotent() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let cache = temp.path().join("data").join("library.json");

        assert!(ensure_cache_file(&cache).unwrap());
        assert!(!ensure_cache_file(&cache).unwrap());
        assert_eq!(fs::read(&cache).unwrap(), b"{}");
    }

    #[test]
    fn test_invalid_json_left_alone() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let cache = temp.path().join("library.json");
        fs::write(&cache, "not json").unwrap();

        assert!(!ensure_cache_file(&cache).unwrap());
        assert_eq!(fs::read_to_string(&cache).unwrap(), "not json");
        assert!(inspect_existing(&cache).unwrap().contains("not valid JSON"));
    }

    #[test]
    fn test_non_object_json_warns() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let cache = temp.path().join("library.json");
        fs::write(&cache, "[1, 2]").unwrap();
        assert!(inspect_existing(&cache).unwrap().contains("not a JSON object"));
        fs::write(&cache, "{}").unwrap();
        assert!(inspect_existing(&cache).is_none());
    }

    #[test]
    fn test_directory_in_the_way_fails() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let cache = temp.path().join("data").join("library.json");
        fs::create_dir_all(&cache).unwrap();

        assert!(matches!(
            ensure_cache_file(&cache),
            Err(BuildError::ProvisionFailed { .. })
        ));
    }
}
