//! Backup snapshots for managed files
//!
//! Every overwrite or delete is preceded by a snapshot; a failed snapshot
//! aborts the enclosing mutation so rollback is always possible. Snapshots
//! are timestamped siblings of the original and are never pruned.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// Suffix appended after the timestamp on snapshot files.
pub const BACKUP_SUFFIX: &str = "bak";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup failure for {path}: {source}")]
    BackupFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("backup no longer present: {path}")]
    SnapshotMissing { path: String },
}

/// An owned snapshot, returned so callers and tests can assert on it
/// directly instead of re-reading the filesystem.
#[derive(Debug, Clone)]
pub struct Backup {
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub content: Vec<u8>,
}

impl Backup {
    /// Snapshot file name, for result messages.
    pub fn file_name(&self) -> String {
        self.backup_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackupManager;

impl BackupManager {
    pub fn new() -> Self {
        Self
    }

    /// Snapshot the file at `path` (already resolved through the path
    /// guard). A missing target is a successful no-op: pure creation needs
    /// no backup.
    pub async fn snapshot(&self, path: &Path) -> Result<Option<Backup>, BackupError> {
        if !path.exists() {
            return Ok(None);
        }

        let timestamp = Utc::now();
        let content = tokio::fs::read(path)
            .await
            .map_err(|source| BackupError::BackupFailure {
                path: path.display().to_string(),
                source,
            })?;

        let backup_path = next_backup_path(path, &timestamp);
        tokio::fs::write(&backup_path, &content)
            .await
            .map_err(|source| BackupError::BackupFailure {
                path: backup_path.display().to_string(),
                source,
            })?;

        debug!(original = %path.display(), backup = %backup_path.display(), "snapshot taken");
        Ok(Some(Backup {
            original_path: path.to_path_buf(),
            backup_path,
            timestamp,
            content,
        }))
    }

    /// Overwrite the live file with the snapshot content. The live file is
    /// itself snapshotted first: backups are never silently lost.
    pub async fn restore(&self, backup: &Backup) -> Result<Option<Backup>, BackupError> {
        if !backup.backup_path.exists() {
            return Err(BackupError::SnapshotMissing {
                path: backup.backup_path.display().to_string(),
            });
        }

        let pre_restore = self.snapshot(&backup.original_path).await?;
        tokio::fs::write(&backup.original_path, &backup.content)
            .await
            .map_err(|source| BackupError::BackupFailure {
                path: backup.original_path.display().to_string(),
                source,
            })?;
        Ok(pre_restore)
    }

    /// Snapshot files taken for `path`, newest first. The timestamp infix
    /// sorts lexicographically, so the file name ordering is the time
    /// ordering.
    pub async fn list_backups(&self, path: &Path) -> Result<Vec<PathBuf>, BackupError> {
        let Some(parent) = path.parent() else {
            return Ok(Vec::new());
        };
        let Some(stem) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut entries =
            tokio::fs::read_dir(parent)
                .await
                .map_err(|source| BackupError::BackupFailure {
                    path: parent.display().to_string(),
                    source,
                })?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| BackupError::BackupFailure {
                path: parent.display().to_string(),
                source,
            })?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let suffix = format!(".{BACKUP_SUFFIX}");
            if name.starts_with(&format!("{stem}."))
                && (name.ends_with(&suffix) || name.contains(&format!("{suffix}.")))
            {
                found.push((name, entry.path()));
            }
        }

        found.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }
}

/// `<file>.<YYYYMMDD_HHMMSS>.bak`, with a numeric disambiguator when two
/// snapshots of one file land in the same second.
fn next_backup_path(original: &Path, timestamp: &DateTime<Utc>) -> PathBuf {
    let stamp = timestamp.format("%Y%m%d_%H%M%S");
    let base = format!("{}.{stamp}.{BACKUP_SUFFIX}", original.display());
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{base}.{n}"));
        n += 1;
    }
    candidate
}
