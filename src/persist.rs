//! Snapshot files on disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::registry::Registry;

/// Restore `registry` from `path` if the file exists.
///
/// Returns whether a snapshot was loaded.
pub fn load_snapshot(registry: &Registry, path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    let data = fs::read(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    registry
        .restore(&data)
        .with_context(|| format!("Failed to restore snapshot {}", path.display()))?;

    info!(path = %path.display(), groups = registry.len(), "Loaded snapshot");
    Ok(true)
}

/// Write the registry to `path`, replacing the file atomically.
pub fn save_snapshot(registry: &Registry, path: &Path) -> Result<()> {
    let data = registry.serialize().context("Failed to serialize registry")?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &data)
        .with_context(|| format!("Failed to write snapshot {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

    info!(path = %path.display(), bytes = data.len(), "Saved snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::new();
        assert!(!load_snapshot(&registry, &dir.path().join("absent.json")).unwrap());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chash.json");

        let registry = Registry::new();
        registry.create_group("db", 30).unwrap();
        registry.insert("db", "192.168.1.100:3306", "mysql0-info").unwrap();
        save_snapshot(&registry, &path).unwrap();

        let loaded = Registry::new();
        assert!(load_snapshot(&loaded, &path).unwrap());
        let ring = loaded.get_group("db").unwrap();
        assert_eq!(ring.positions(), 30);
        assert_eq!(ring.match_key("user-id-1").unwrap().key, "192.168.1.100:3306");
    }

    #[test]
    fn test_corrupt_file_reports_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"--werbenhu--").unwrap();

        let registry = Registry::new();
        let err = load_snapshot(&registry, file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to restore snapshot"));
        assert!(registry.is_empty());
    }
}
