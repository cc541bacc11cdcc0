//! Group-scoped and host-scoped variable files

pub mod store;

pub use store::*;

use thiserror::Error;

use crate::backup::BackupError;
use crate::guard::GuardError;
use crate::inventory::InventoryError;

#[derive(Debug, Error)]
pub enum VarsError {
    #[error("no {scope} variable file for '{name}'")]
    NotFound { scope: VarScope, name: String },

    #[error("malformed YAML in {scope} variables: {reason}")]
    Parse { scope: VarScope, reason: String },

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which scope a variable file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarScope {
    Group,
    Host,
}

impl std::fmt::Display for VarScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarScope::Group => write!(f, "group"),
            VarScope::Host => write!(f, "host"),
        }
    }
}
