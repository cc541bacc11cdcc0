//! Tool dispatch: string arguments in, one string result out
//!
//! The dispatcher owns the whole boundary sequence (sanitize, guard,
//! backup, operate, mask) and converts every error into a prefixed string.
//! Nothing propagates as an unhandled fault to the transport.

pub mod dispatcher;
pub mod handlers;
pub mod request;

pub use dispatcher::*;
pub use request::*;

use std::sync::Arc;

use thiserror::Error;

use crate::backup::{BackupError, BackupManager};
use crate::config::WorkspaceConfig;
use crate::device::{DeviceError, DeviceTools};
use crate::guard::{GuardError, InputSanitizer, PathGuard};
use crate::inventory::{InventoryError, InventoryStore};
use crate::playbook::{PlaybookError, PlaybookStore};
use crate::runner::{CommandRunner, EngineInvoker, RunnerError};
use crate::vars::{VariableStore, VarsError};
use crate::workspace::{WorkspaceError, WorkspaceFiles};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing required argument '{name}'")]
    MissingArgument { name: String },

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Vars(#[from] VarsError),

    #[error(transparent)]
    Playbook(#[from] PlaybookError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// The component graph every handler operates on.
pub struct Services {
    pub config: Arc<WorkspaceConfig>,
    pub sanitizer: InputSanitizer,
    pub guard: Arc<PathGuard>,
    pub backups: Arc<BackupManager>,
    pub inventory: Arc<InventoryStore>,
    pub vars: Arc<VariableStore>,
    pub playbooks: Arc<PlaybookStore>,
    pub files: Arc<WorkspaceFiles>,
    pub devices: Arc<DeviceTools>,
}

impl Services {
    /// Wire the components against the real engine runner.
    pub fn initialize(config: Arc<WorkspaceConfig>) -> std::io::Result<Self> {
        let engine: Arc<dyn EngineInvoker> = Arc::new(CommandRunner::new(config.clone()));
        Self::with_engine(config, engine)
    }

    /// Wire the components against an explicit engine seam (tests stub it).
    pub fn with_engine(
        config: Arc<WorkspaceConfig>,
        engine: Arc<dyn EngineInvoker>,
    ) -> std::io::Result<Self> {
        let guard = Arc::new(PathGuard::new(config.root())?);
        let backups = Arc::new(BackupManager::new());
        let inventory = Arc::new(InventoryStore::new(
            config.clone(),
            guard.clone(),
            backups.clone(),
            engine.clone(),
        ));
        let vars = Arc::new(VariableStore::new(
            config.clone(),
            guard.clone(),
            backups.clone(),
            inventory.clone(),
        ));
        let playbooks = Arc::new(PlaybookStore::new(
            config.clone(),
            guard.clone(),
            backups.clone(),
            engine.clone(),
        ));
        let files = Arc::new(WorkspaceFiles::new(
            config.clone(),
            guard.clone(),
            backups.clone(),
        ));
        let devices = Arc::new(DeviceTools::new(config.clone(), engine));

        Ok(Self {
            config,
            sanitizer: InputSanitizer::new(),
            guard,
            backups,
            inventory,
            vars,
            playbooks,
            files,
            devices,
        })
    }
}
