//! Variable file CRUD and the effective-variables merge

use std::sync::Arc;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tracing::info;

use crate::backup::{Backup, BackupManager};
use crate::config::WorkspaceConfig;
use crate::guard::PathGuard;
use crate::inventory::InventoryStore;

use super::{VarScope, VarsError};

#[derive(Debug, Serialize)]
pub struct VarsListing {
    pub group_vars: Vec<String>,
    pub host_vars: Vec<String>,
}

pub struct VariableStore {
    config: Arc<WorkspaceConfig>,
    guard: Arc<PathGuard>,
    backups: Arc<BackupManager>,
    inventory: Arc<InventoryStore>,
}

impl VariableStore {
    pub fn new(
        config: Arc<WorkspaceConfig>,
        guard: Arc<PathGuard>,
        backups: Arc<BackupManager>,
        inventory: Arc<InventoryStore>,
    ) -> Self {
        Self {
            config,
            guard,
            backups,
            inventory,
        }
    }

    /// Raw YAML for `(scope, name)`, trying `.yml` then `.yaml`.
    pub async fn read(&self, scope: VarScope, name: &str) -> Result<String, VarsError> {
        for ext in ["yml", "yaml"] {
            let relative = self.relative_path(scope, name, ext);
            let path = self.guard.resolve(&relative)?;
            if path.exists() {
                return Ok(tokio::fs::read_to_string(&path).await?);
            }
        }
        Err(VarsError::NotFound {
            scope,
            name: name.to_string(),
        })
    }

    /// Replace the variable file (backed up first). The content must parse
    /// as a YAML document before anything touches the disk.
    pub async fn write(
        &self,
        scope: VarScope,
        name: &str,
        content: &str,
    ) -> Result<Option<Backup>, VarsError> {
        serde_yaml::from_str::<Value>(content).map_err(|err| VarsError::Parse {
            scope,
            reason: err.to_string(),
        })?;

        let relative = self.relative_path(scope, name, "yml");
        let path = self.guard.resolve(&relative)?;
        let backup = self.backups.snapshot(&path).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        info!(%scope, name, "variable file written");
        Ok(backup)
    }

    /// All variable files by scope.
    pub async fn list(&self) -> Result<VarsListing, VarsError> {
        Ok(VarsListing {
            group_vars: scan_names(&self.config.group_vars_dir()).await?,
            host_vars: scan_names(&self.config.host_vars_dir()).await?,
        })
    }

    /// Merge the three variable sources for one host, most specific last:
    /// inline inventory vars, then each group file in inventory-declared
    /// order, then the host file. Read-only; nothing is persisted.
    pub async fn effective(&self, host: &str) -> Result<Mapping, VarsError> {
        let document = self.inventory.load().await?;
        let mut merged = Mapping::new();

        for (key, value) in document.inline_vars(host) {
            merged.insert(Value::String(key), Value::String(value));
        }

        for group in document.host_groups(host) {
            if let Some(vars) = self.load_mapping(VarScope::Group, &group).await? {
                for (key, value) in vars {
                    merged.insert(key, value);
                }
            }
        }

        if let Some(vars) = self.load_mapping(VarScope::Host, host).await? {
            for (key, value) in vars {
                merged.insert(key, value);
            }
        }

        Ok(merged)
    }

    async fn load_mapping(
        &self,
        scope: VarScope,
        name: &str,
    ) -> Result<Option<Mapping>, VarsError> {
        let content = match self.read(scope, name).await {
            Ok(content) => content,
            Err(VarsError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        let value: Value = serde_yaml::from_str(&content).map_err(|err| VarsError::Parse {
            scope,
            reason: err.to_string(),
        })?;
        match value {
            Value::Mapping(mapping) => Ok(Some(mapping)),
            Value::Null => Ok(None),
            _ => Err(VarsError::Parse {
                scope,
                reason: format!("expected a mapping in '{name}'"),
            }),
        }
    }

    fn relative_path(&self, scope: VarScope, name: &str, ext: &str) -> String {
        match scope {
            VarScope::Group => format!("group_vars/{name}.{ext}"),
            VarScope::Host => format!("host_vars/{name}.{ext}"),
        }
    }
}

async fn scan_names(dir: &std::path::Path) -> Result<Vec<String>, VarsError> {
    let mut names = Vec::new();
    if !dir.exists() {
        return Ok(names);
    }
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(stem) = name.strip_suffix(".yml").or_else(|| name.strip_suffix(".yaml")) {
            if !name.contains(".bak") {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
