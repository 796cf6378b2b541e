use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::metadata;

/// A single backup directory under a MobileSync backup root.
///
/// The directory name is the device identifier the backup was written
/// under; the human-readable fields come from the metadata probes and fall
/// back to defaults when the plists are absent or unreadable.
#[derive(Debug, Clone)]
pub struct Backup {
    pub path: PathBuf,
    pub name: String,
    pub device_name: String,
    pub is_encrypted: bool,
    pub last_modified: SystemTime,
}

impl Backup {
    /// Build a candidate from a backup directory, probing its metadata.
    pub fn from_directory<P: AsRef<Path>>(path: P) -> Result<Backup> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let last_modified = std::fs::metadata(path)?.modified()?;

        Ok(Backup {
            path: path.to_path_buf(),
            name,
            device_name: metadata::read_device_name(path),
            is_encrypted: metadata::read_is_encrypted(path),
            last_modified,
        })
    }
}

/// List every backup under `root`, newest first.
///
/// A missing root and a root with no backup directories are both
/// environment preconditions the caller is expected to report and exit on.
pub fn list_backups<P: AsRef<Path>>(root: P) -> Result<Vec<Backup>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(Error::NotFound(format!(
            "Backup directory not found: {}",
            root.display()
        )));
    }

    let mut backups = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            backups.push(Backup::from_directory(entry.path())?);
        }
    }

    if backups.is_empty() {
        return Err(Error::NotFound(format!(
            "No backups found in {}",
            root.display()
        )));
    }

    sort_newest_first(&mut backups);
    Ok(backups)
}

/// Stable sort by modification time, newest first; candidates with equal
/// timestamps keep their enumeration order.
pub fn sort_newest_first(backups: &mut [Backup]) {
    backups.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
}
