use thiserror::Error;

use crate::backup::BackupError;
use crate::guard::GuardError;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("host '{host}' already exists in the inventory")]
    DuplicateHost { host: String },

    #[error("host '{host}' not found in the inventory")]
    HostNotFound { host: String },

    #[error("inventory file not found; write an inventory first")]
    NotFound,

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
