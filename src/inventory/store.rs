//! Structured inventory operations with backup-before-write

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::backup::{Backup, BackupManager};
use crate::config::{WorkspaceConfig, INVENTORY_FILE};
use crate::guard::PathGuard;
use crate::runner::{EngineCommand, EngineInvoker};

use super::{GroupEntry, InventoryDocument, InventoryError};

/// Outcome of a whole-file inventory replace.
#[derive(Debug)]
pub struct InventoryWriteReport {
    pub backup: Option<Backup>,
    /// Engine validation diagnostics; `None` means the inventory validated.
    pub validation_warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InventorySummary {
    pub total_hosts: usize,
    pub hosts: Vec<String>,
    pub groups: Vec<GroupEntry>,
}

pub struct InventoryStore {
    config: Arc<WorkspaceConfig>,
    guard: Arc<PathGuard>,
    backups: Arc<BackupManager>,
    engine: Arc<dyn EngineInvoker>,
}

impl InventoryStore {
    pub fn new(
        config: Arc<WorkspaceConfig>,
        guard: Arc<PathGuard>,
        backups: Arc<BackupManager>,
        engine: Arc<dyn EngineInvoker>,
    ) -> Self {
        Self {
            config,
            guard,
            backups,
            engine,
        }
    }

    /// Raw inventory content.
    pub async fn read(&self) -> Result<String, InventoryError> {
        let path = self.guard.resolve(INVENTORY_FILE)?;
        if !path.exists() {
            return Err(InventoryError::NotFound);
        }
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    /// Parsed document; an absent file parses as empty.
    pub async fn load(&self) -> Result<InventoryDocument, InventoryError> {
        let path = self.guard.resolve(INVENTORY_FILE)?;
        if !path.exists() {
            return Ok(InventoryDocument::empty());
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(InventoryDocument::parse(&content))
    }

    /// Replace the whole file (backed up first), then ask the engine to
    /// validate the result. Validation problems are a warning, not a
    /// rollback: the backup is there if the caller wants one.
    pub async fn write(&self, content: &str) -> Result<InventoryWriteReport, InventoryError> {
        let path = self.guard.resolve(INVENTORY_FILE)?;
        let backup = self.backups.snapshot(&path).await?;
        self.persist(&path, content).await?;
        info!(hosts = %path.display(), "inventory replaced");

        let validation_warning = match self
            .engine
            .invoke(&EngineCommand::inventory_list(&self.config))
            .await
        {
            Ok(result) if result.success() => None,
            Ok(result) => Some(result.render()),
            // Engine not installed: file-level operation still succeeded.
            Err(err) => Some(format!("validation unavailable: {err}")),
        };

        Ok(InventoryWriteReport {
            backup,
            validation_warning,
        })
    }

    /// Append a host line to a group section, creating the section when
    /// absent. A host name that exists anywhere in the file is rejected.
    pub async fn add_host(
        &self,
        group: &str,
        host: &str,
        address: &str,
        extra_vars: Option<&str>,
    ) -> Result<Option<Backup>, InventoryError> {
        let mut document = self.load().await?;
        if document.contains_host(host) {
            return Err(InventoryError::DuplicateHost {
                host: host.to_string(),
            });
        }

        let mut host_line = format!("{host} ansible_host={address}");
        if let Some(extra) = extra_vars {
            if !extra.trim().is_empty() {
                host_line.push(' ');
                host_line.push_str(extra.trim());
            }
        }
        document.add_host(group, &host_line);

        let path = self.guard.resolve(INVENTORY_FILE)?;
        let backup = self.backups.snapshot(&path).await?;
        self.persist(&path, &document.render()).await?;
        info!(host, group, "host added to inventory");
        Ok(backup)
    }

    /// Delete the host's line from every section it appears in.
    pub async fn remove_host(&self, host: &str) -> Result<Option<Backup>, InventoryError> {
        let path = self.guard.resolve(INVENTORY_FILE)?;
        if !path.exists() {
            return Err(InventoryError::NotFound);
        }

        let mut document = self.load().await?;
        if document.remove_host(host) == 0 {
            return Err(InventoryError::HostNotFound {
                host: host.to_string(),
            });
        }

        let backup = self.backups.snapshot(&path).await?;
        self.persist(&path, &document.render()).await?;
        info!(host, "host removed from inventory");
        Ok(backup)
    }

    /// Groups and their member hosts.
    pub async fn list(&self) -> Result<InventorySummary, InventoryError> {
        let document = self.load().await?;
        let hosts = document.host_names();
        Ok(InventorySummary {
            total_hosts: hosts.len(),
            hosts,
            groups: document.groups(),
        })
    }

    async fn persist(&self, path: &std::path::Path, content: &str) -> Result<(), InventoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
