//! Playbook store built on the guarded filesystem and the engine runner

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::backup::{Backup, BackupManager};
use crate::config::WorkspaceConfig;
use crate::guard::PathGuard;
use crate::runner::{EngineCommand, EngineInvoker, ExecutionResult, RunOptions};

use super::PlaybookError;

#[derive(Debug, Serialize)]
pub struct PlaybookInfo {
    pub name: String,
    pub description: Option<String>,
}

/// Syntax-check outcome, reported alongside create/update results.
#[derive(Debug)]
pub struct SyntaxReport {
    pub passed: bool,
    pub diagnostics: String,
}

#[derive(Debug)]
pub struct PlaybookWriteReport {
    pub name: String,
    pub backup: Option<Backup>,
    /// `None` when the engine is unavailable to check syntax.
    pub syntax: Option<SyntaxReport>,
}

pub struct PlaybookStore {
    config: Arc<WorkspaceConfig>,
    guard: Arc<PathGuard>,
    backups: Arc<BackupManager>,
    engine: Arc<dyn EngineInvoker>,
}

impl PlaybookStore {
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

    /// Playbooks with their first-line `#` descriptions.
    pub async fn list(&self) -> Result<Vec<PlaybookInfo>, PlaybookError> {
        let dir = self.config.playbooks_dir();
        let mut found = Vec::new();
        if dir.exists() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !is_playbook_name(&name) {
                    continue;
                }
                let description = first_comment_line(&entry.path()).await;
                found.push(PlaybookInfo { name, description });
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    /// Create a new playbook; refuses to overwrite. An optional description
    /// becomes a leading comment line. Syntax is checked after the write.
    pub async fn create(
        &self,
        name: &str,
        content: &str,
        description: Option<&str>,
    ) -> Result<PlaybookWriteReport, PlaybookError> {
        let name = canonical_name(name);
        let path = self.guard.resolve(&format!("playbooks/{name}"))?;
        if path.exists() {
            return Err(PlaybookError::AlreadyExists { name });
        }

        let mut body = String::new();
        if let Some(description) = description {
            if !description.trim().is_empty() {
                body.push_str(&format!("# {}\n", description.trim()));
            }
        }
        body.push_str(content);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;
        info!(playbook = %name, "playbook created");

        let syntax = self.syntax_check(&path).await;
        Ok(PlaybookWriteReport {
            name,
            backup: None,
            syntax,
        })
    }

    pub async fn read(&self, name: &str) -> Result<String, PlaybookError> {
        let path = self.locate(name).await?;
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    /// Replace a playbook's content, backing the old content up first.
    pub async fn update(
        &self,
        name: &str,
        content: &str,
    ) -> Result<PlaybookWriteReport, PlaybookError> {
        let name = canonical_name(name);
        let path = self.locate(&name).await?;
        let backup = self.backups.snapshot(&path).await?;
        tokio::fs::write(&path, content).await?;
        info!(playbook = %name, "playbook updated");

        let syntax = self.syntax_check(&path).await;
        Ok(PlaybookWriteReport {
            name,
            backup,
            syntax,
        })
    }

    /// Delete a playbook; the backup taken first is returned to the caller.
    pub async fn delete(&self, name: &str) -> Result<Backup, PlaybookError> {
        let name = canonical_name(name);
        let path = self.locate(&name).await?;
        let backup = self
            .backups
            .snapshot(&path)
            .await?
            .ok_or(PlaybookError::NotFound { name: name.clone() })?;
        tokio::fs::remove_file(&path).await?;
        info!(playbook = %name, "playbook deleted");
        Ok(backup)
    }

    /// Engine syntax validation as a structured result.
    pub async fn validate(&self, name: &str) -> Result<SyntaxReport, PlaybookError> {
        let path = self.locate(name).await?;
        let command = EngineCommand::playbook_syntax_check(&self.config, &path);
        let result = self.engine.invoke(&command).await?;
        Ok(SyntaxReport {
            passed: result.success(),
            diagnostics: command.render(&result),
        })
    }

    /// Normal-mode run.
    pub async fn run(
        &self,
        name: &str,
        opts: &RunOptions,
    ) -> Result<(ExecutionResult, String), PlaybookError> {
        let path = self.locate(name).await?;
        let command = EngineCommand::playbook_run(&self.config, &path, opts);
        let result = self.engine.invoke(&command).await?;
        let rendering = command.render(&result);
        Ok((result, rendering))
    }

    /// Check-mode (dry-run) execution.
    pub async fn check(
        &self,
        name: &str,
        limit: Option<&str>,
    ) -> Result<(ExecutionResult, String), PlaybookError> {
        let path = self.locate(name).await?;
        let command = EngineCommand::playbook_check(&self.config, &path, limit);
        let result = self.engine.invoke(&command).await?;
        let rendering = command.render(&result);
        Ok((result, rendering))
    }

    /// Resolve a playbook name to its file, checking `playbooks/` first and
    /// falling back to a root-level file of the same name.
    async fn locate(&self, name: &str) -> Result<PathBuf, PlaybookError> {
        let name = canonical_name(name);
        let preferred = self.guard.resolve(&format!("playbooks/{name}"))?;
        if preferred.exists() {
            return Ok(preferred);
        }
        let legacy = self.guard.resolve(&name)?;
        if legacy.exists() {
            return Ok(legacy);
        }
        Err(PlaybookError::NotFound { name })
    }

    async fn syntax_check(&self, path: &std::path::Path) -> Option<SyntaxReport> {
        let command = EngineCommand::playbook_syntax_check(&self.config, path);
        match self.engine.invoke(&command).await {
            Ok(result) => Some(SyntaxReport {
                passed: result.success(),
                diagnostics: command.render(&result),
            }),
            Err(_) => None,
        }
    }
}

/// Ensure a `.yml`/`.yaml` extension.
fn canonical_name(name: &str) -> String {
    if name.ends_with(".yml") || name.ends_with(".yaml") {
        name.to_string()
    } else {
        format!("{name}.yml")
    }
}

fn is_playbook_name(name: &str) -> bool {
    (name.ends_with(".yml") || name.ends_with(".yaml")) && !name.contains(".bak")
}

async fn first_comment_line(path: &std::path::Path) -> Option<String> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    let first = content.lines().next()?;
    first
        .strip_prefix('#')
        .map(|rest| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
}
