//! Backup and rollback of overwritten files
//!
//! Before a write replaces an existing file, the old bytes are copied to a
//! sibling `{file}.backup-{timestamp}` and recorded here. Rollback restores
//! the most recent record and consumes it. The record stack is bounded; the
//! oldest record's artifact is deleted when it falls off.
//!
//! The stack lives in memory only and is shared between every component that
//! writes or rolls back via [`SharedBackups`].

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AgentError;

/// Maximum number of backups retained
pub const BACKUP_CAPACITY: usize = 10;

/// Handle to the process-wide backup stack
pub type SharedBackups = Arc<Mutex<BackupManager>>;

/// A recorded backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    /// ISO-8601 creation time
    pub timestamp: String,
}

/// Bounded, most-recent-last stack of backup records
#[derive(Debug)]
pub struct BackupManager {
    entries: VecDeque<BackupEntry>,
    capacity: usize,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::with_capacity(BACKUP_CAPACITY)
    }
}

impl BackupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// A fresh stack wrapped for sharing
    pub fn shared() -> SharedBackups {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Record a backup. Past capacity the oldest record is evicted, its
    /// artifact deleted, and the evicted record returned.
    pub fn push(
        &mut self,
        original_path: PathBuf,
        backup_path: PathBuf,
        timestamp: String,
    ) -> Option<BackupEntry> {
        self.entries.push_back(BackupEntry {
            original_path,
            backup_path,
            timestamp,
        });

        if self.entries.len() <= self.capacity {
            return None;
        }

        let evicted = self.entries.pop_front()?;
        if evicted.backup_path.exists() {
            if let Err(e) = fs::remove_file(&evicted.backup_path) {
                warn!(path = %evicted.backup_path.display(), error = %e, "Failed to delete evicted backup");
            }
        }
        debug!(path = %evicted.backup_path.display(), "Evicted oldest backup");
        Some(evicted)
    }

    pub fn most_recent(&self) -> Option<&BackupEntry> {
        self.entries.back()
    }

    /// Drop the record for `backup_path`. Returns whether one was found.
    pub fn remove(&mut self, backup_path: &Path) -> bool {
        match self.entries.iter().position(|e| e.backup_path == backup_path) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Records, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &BackupEntry> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Copy `path` to a timestamped sibling and record it.
///
/// Returns `None` when there is nothing to back up.
pub fn snapshot(backups: &SharedBackups, path: &Path) -> Result<Option<PathBuf>, AgentError> {
    if !path.is_file() {
        return Ok(None);
    }

    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let backup_path = unique_backup_path(path, &timestamp);

    fs::copy(path, &backup_path).map_err(|source| AgentError::WriteFailed {
        path: backup_path.clone(),
        source,
    })?;

    info!(original = %path.display(), backup = %backup_path.display(), "Created backup");
    backups
        .lock()
        .push(path.to_path_buf(), backup_path.clone(), timestamp);

    Ok(Some(backup_path))
}

/// Restore the most recent backup over its original and consume it
pub fn restore_latest(backups: &SharedBackups) -> Result<BackupEntry, AgentError> {
    let mut manager = backups.lock();
    let entry = manager.most_recent().cloned().ok_or(AgentError::BackupMissing)?;

    if !entry.backup_path.exists() {
        return Err(AgentError::BackupArtifactMissing(entry.backup_path));
    }

    let bytes = fs::read(&entry.backup_path).map_err(|source| AgentError::RestoreFailed {
        path: entry.original_path.clone(),
        source,
    })?;
    fs::write(&entry.original_path, bytes).map_err(|source| AgentError::RestoreFailed {
        path: entry.original_path.clone(),
        source,
    })?;

    if let Err(e) = fs::remove_file(&entry.backup_path) {
        warn!(path = %entry.backup_path.display(), error = %e, "Failed to delete restored backup");
    }
    manager.remove(&entry.backup_path);

    info!(original = %entry.original_path.display(), from = %entry.timestamp, "Rolled back");
    Ok(entry)
}

/// `{path}.backup-{timestamp}` with `:` and `.` made filename-safe, plus a
/// counter if that name is already taken.
fn unique_backup_path(path: &Path, timestamp: &str) -> PathBuf {
    let stamp = timestamp.replace([':', '.'], "-");
    let base = format!("{}.backup-{}", path.display(), stamp);

    let mut candidate = PathBuf::from(&base);
    let mut counter = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{}-{}", base, counter));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_names_backup_beside_original() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "v1").unwrap();

        let backups = BackupManager::shared();
        let backup = snapshot(&backups, &file).unwrap().unwrap();

        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("notes.txt.backup-"));
        assert!(!name.contains(':'));
        assert_eq!(backup.parent(), file.parent());
        assert_eq!(fs::read_to_string(&backup).unwrap(), "v1");
        assert_eq!(backups.lock().len(), 1);
    }

    #[test]
    fn test_snapshot_of_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let backups = BackupManager::shared();
        let result = snapshot(&backups, &dir.path().join("nope.txt")).unwrap();
        assert!(result.is_none());
        assert!(backups.lock().is_empty());
    }

    #[test]
    fn test_rapid_snapshots_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "one").unwrap();

        let backups = BackupManager::shared();
        let first = snapshot(&backups, &file).unwrap().unwrap();
        fs::write(&file, "two").unwrap();
        let second = snapshot(&backups, &file).unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "one");
        assert_eq!(fs::read_to_string(&second).unwrap(), "two");
    }

    #[test]
    fn test_eviction_deletes_oldest_artifact() {
        let dir = TempDir::new().unwrap();
        let mut manager = BackupManager::new();
        let mut artifacts = Vec::new();

        for i in 0..=BACKUP_CAPACITY {
            let artifact = dir.path().join(format!("f.txt.backup-{}", i));
            fs::write(&artifact, format!("{}", i)).unwrap();
            artifacts.push(artifact.clone());
            let evicted = manager.push(dir.path().join("f.txt"), artifact, format!("t{}", i));
            if i < BACKUP_CAPACITY {
                assert!(evicted.is_none());
            } else {
                assert_eq!(evicted.unwrap().backup_path, artifacts[0]);
            }
        }

        assert_eq!(manager.len(), BACKUP_CAPACITY);
        assert!(!artifacts[0].exists());
        assert!(artifacts[1].exists());
        assert_eq!(manager.entries().next().unwrap().timestamp, "t1");
        assert_eq!(manager.most_recent().unwrap().timestamp, format!("t{}", BACKUP_CAPACITY));
    }

    #[test]
    fn test_restore_without_backups() {
        let backups = BackupManager::shared();
        assert!(matches!(restore_latest(&backups), Err(AgentError::BackupMissing)));
    }

    #[test]
    fn test_restore_is_byte_exact_and_consumes_entry() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.bin");
        let original: Vec<u8> = vec![0, 159, 146, 150, b'\n', 255];
        fs::write(&file, &original).unwrap();

        let backups = BackupManager::shared();
        let backup = snapshot(&backups, &file).unwrap().unwrap();
        fs::write(&file, b"replaced").unwrap();

        let entry = restore_latest(&backups).unwrap();
        assert_eq!(entry.original_path, file);
        assert_eq!(fs::read(&file).unwrap(), original);
        assert!(!backup.exists());
        assert!(backups.lock().is_empty());
    }

    #[test]
    fn test_restore_with_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("x.txt");
        fs::write(&file, "x").unwrap();

        let backups = BackupManager::shared();
        let backup = snapshot(&backups, &file).unwrap().unwrap();
        fs::remove_file(&backup).unwrap();

        let err = restore_latest(&backups).unwrap_err();
        assert!(matches!(err, AgentError::BackupArtifactMissing(p) if p == backup));
        assert_eq!(backups.lock().len(), 1);
    }

    #[test]
    fn test_remove_unknown_path() {
        let mut manager = BackupManager::new();
        assert!(!manager.remove(Path::new("/nowhere")));
    }
}
