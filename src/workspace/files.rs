//! Workspace file operations inside the guarded root

use std::sync::Arc;

use tracing::info;
use walkdir::WalkDir;

use crate::backup::{Backup, BackupManager};
use crate::config::{WorkspaceConfig, ENGINE_CONFIG_FILE};
use crate::guard::PathGuard;

use super::WorkspaceError;

/// What a guarded read found at the path.
#[derive(Debug)]
pub enum ReadTarget {
    File(String),
    Directory(Vec<String>),
}

#[derive(Debug)]
pub struct FileWriteReport {
    pub relative_path: String,
    pub backup: Option<Backup>,
}

pub struct WorkspaceFiles {
    config: Arc<WorkspaceConfig>,
    guard: Arc<PathGuard>,
    backups: Arc<BackupManager>,
}

impl WorkspaceFiles {
    pub fn new(
        config: Arc<WorkspaceConfig>,
        guard: Arc<PathGuard>,
        backups: Arc<BackupManager>,
    ) -> Self {
        Self {
            config,
            guard,
            backups,
        }
    }

    /// Recursive tree rendering of the workspace. Dotfiles and backup
    /// snapshots are skipped; directories sort before their contents.
    pub fn structure(&self) -> String {
        let root = self.config.root();
        let mut lines = vec![format!("Workspace: {}", root.display())];

        let walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !name.starts_with('.') && !name.contains(".bak")
            });

        for entry in walker.flatten() {
            let depth = entry.depth();
            let indent = "  ".repeat(depth);
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() {
                lines.push(format!("{indent}{name}/"));
            } else {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                lines.push(format!("{indent}{name} ({size} bytes)"));
            }
        }
        lines.join("\n")
    }

    /// Read any file under the root. A directory lists its entries instead.
    pub async fn read(&self, relative: &str) -> Result<ReadTarget, WorkspaceError> {
        let path = self.guard.resolve(relative)?;
        if !path.exists() {
            return Err(WorkspaceError::NotFound {
                path: relative.to_string(),
            });
        }
        if path.is_dir() {
            let mut names = Vec::new();
            let mut entries = tokio::fs::read_dir(&path).await?;
            while let Some(entry) = entries.next_entry().await? {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            return Ok(ReadTarget::Directory(names));
        }
        Ok(ReadTarget::File(tokio::fs::read_to_string(&path).await?))
    }

    /// Write a file under the root, creating parent directories, snapshot
    /// taken first when the file already exists.
    pub async fn write(
        &self,
        relative: &str,
        content: &str,
    ) -> Result<FileWriteReport, WorkspaceError> {
        let path = self.guard.resolve(relative)?;
        let backup = self.backups.snapshot(&path).await?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        info!(path = relative, "workspace file written");
        Ok(FileWriteReport {
            relative_path: relative.to_string(),
            backup,
        })
    }

    /// Engine configuration (`ansible.cfg`) content.
    pub async fn read_engine_config(&self) -> Result<String, WorkspaceError> {
        match self.read(ENGINE_CONFIG_FILE).await? {
            ReadTarget::File(content) => Ok(content),
            ReadTarget::Directory(_) => Err(WorkspaceError::NotFound {
                path: ENGINE_CONFIG_FILE.to_string(),
            }),
        }
    }

    pub async fn write_engine_config(
        &self,
        content: &str,
    ) -> Result<FileWriteReport, WorkspaceError> {
        self.write(ENGINE_CONFIG_FILE, content).await
    }

    /// Jinja2 templates under `templates/`.
    pub async fn list_templates(&self) -> Result<Vec<String>, WorkspaceError> {
        let dir = self.config.templates_dir();
        let mut names = Vec::new();
        if dir.exists() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if is_template_name(&name) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn read_template(&self, name: &str) -> Result<String, WorkspaceError> {
        let name = template_name(name);
        let path = self.guard.resolve(&format!("templates/{name}"))?;
        if !path.exists() {
            return Err(WorkspaceError::NotFound {
                path: format!("templates/{name}"),
            });
        }
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    /// Create a template; refuses to overwrite an existing one.
    pub async fn create_template(&self, name: &str, content: &str) -> Result<String, WorkspaceError> {
        let name = template_name(name);
        let path = self.guard.resolve(&format!("templates/{name}"))?;
        if path.exists() {
            return Err(WorkspaceError::TemplateExists { name });
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        info!(template = %name, "template created");
        Ok(name)
    }
}

fn template_name(name: &str) -> String {
    if name.ends_with(".j2") || name.ends_with(".jinja2") {
        name.to_string()
    } else {
        format!("{name}.j2")
    }
}

fn is_template_name(name: &str) -> bool {
    (name.ends_with(".j2") || name.ends_with(".jinja2")) && !name.contains(".bak")
}
