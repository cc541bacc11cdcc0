//! Guarded raw file access, workspace structure, engine config, templates

pub mod files;

pub use files::*;

use thiserror::Error;

use crate::backup::BackupError;
use crate::guard::GuardError;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("template '{name}' already exists")]
    TemplateExists { name: String },

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
