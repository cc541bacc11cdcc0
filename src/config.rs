//! Workspace configuration and on-disk layout
//!
//! Every component receives an immutable [`WorkspaceConfig`] at construction;
//! there is no ambient global state. The root directory is selected by the
//! `ANSIBLE_DIR` environment variable and falls back to `~/ansible`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable selecting the workspace root directory.
pub const WORKSPACE_ENV: &str = "ANSIBLE_DIR";

/// Relative path of the inventory file inside the workspace.
pub const INVENTORY_FILE: &str = "inventory/hosts.ini";

/// Relative path of the engine configuration file inside the workspace.
pub const ENGINE_CONFIG_FILE: &str = "ansible.cfg";

/// Subdirectories bootstrapped under the workspace root.
const LAYOUT_DIRS: &[&str] = &[
    "inventory",
    "playbooks",
    "group_vars",
    "host_vars",
    "roles",
    "templates",
    "files",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("workspace root unavailable: {path}")]
    RootUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no home directory available to derive the default workspace root")]
    NoHomeDirectory,
}

/// Immutable configuration shared by every component.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    root: PathBuf,
    pub playbook_bin: String,
    pub adhoc_bin: String,
    pub inventory_bin: String,
    pub run_timeout: Duration,
    pub check_timeout: Duration,
    pub device_timeout: Duration,
}

impl WorkspaceConfig {
    /// Build a configuration from the environment, creating the workspace
    /// layout if it does not exist yet.
    pub fn from_env() -> Result<Self, ConfigError> {
        let root = match std::env::var(WORKSPACE_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or(ConfigError::NoHomeDirectory)?
                .join("ansible"),
        };
        Self::with_root(root)
    }

    /// Build a configuration rooted at an explicit directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| ConfigError::RootUnavailable {
            path: root.display().to_string(),
            source,
        })?;
        let root = root
            .canonicalize()
            .map_err(|source| ConfigError::RootUnavailable {
                path: root.display().to_string(),
                source,
            })?;

        for dir in LAYOUT_DIRS {
            let path = root.join(dir);
            if let Err(err) = std::fs::create_dir_all(&path) {
                // Deferred: a read-only root still serves read operations.
                warn!(dir = %path.display(), error = %err, "could not create layout directory");
            }
        }
        debug!(root = %root.display(), "workspace configured");

        Ok(Self {
            root,
            playbook_bin: "ansible-playbook".to_string(),
            adhoc_bin: "ansible".to_string(),
            inventory_bin: "ansible-inventory".to_string(),
            run_timeout: Duration::from_secs(300),
            check_timeout: Duration::from_secs(60),
            device_timeout: Duration::from_secs(180),
        })
    }

    /// Canonical workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.root.join(INVENTORY_FILE)
    }

    pub fn engine_config_path(&self) -> PathBuf {
        self.root.join(ENGINE_CONFIG_FILE)
    }

    pub fn playbooks_dir(&self) -> PathBuf {
        self.root.join("playbooks")
    }

    pub fn group_vars_dir(&self) -> PathBuf {
        self.root.join("group_vars")
    }

    pub fn host_vars_dir(&self) -> PathBuf {
        self.root.join("host_vars")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    /// Engine binaries that cannot be found on `PATH`. Purely advisory:
    /// file-level operations work without the engine installed.
    pub fn missing_engine_binaries(&self) -> Vec<String> {
        [&self.playbook_bin, &self.adhoc_bin, &self.inventory_bin]
            .into_iter()
            .filter(|bin| which::which(bin).is_err())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn with_root_bootstraps_layout() {
        let temp = TempDir::new().unwrap();
        let config = WorkspaceConfig::with_root(temp.path().join("ws")).unwrap();

        assert!(config.root().join("inventory").is_dir());
        assert!(config.root().join("playbooks").is_dir());
        assert!(config.root().join("group_vars").is_dir());
        assert!(config.root().join("host_vars").is_dir());
        assert!(config.inventory_path().ends_with("inventory/hosts.ini"));
    }

    #[test]
    fn root_is_canonical() {
        let temp = TempDir::new().unwrap();
        let config = WorkspaceConfig::with_root(temp.path()).unwrap();
        assert_eq!(config.root(), temp.path().canonicalize().unwrap());
    }
}
