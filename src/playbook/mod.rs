//! Playbook lifecycle: CRUD, validation, execution

pub mod store;

pub use store::*;

use thiserror::Error;

use crate::backup::BackupError;
use crate::guard::GuardError;
use crate::runner::RunnerError;

#[derive(Debug, Error)]
pub enum PlaybookError {
    #[error("playbook not found: {name}")]
    NotFound { name: String },

    #[error("playbook '{name}' already exists; edit it instead")]
    AlreadyExists { name: String },

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
