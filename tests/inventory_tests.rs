//! InventoryStore behavior against a real workspace with a stubbed engine

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rustle_workbench::backup::BackupManager;
use rustle_workbench::guard::PathGuard;
use rustle_workbench::inventory::{InventoryError, InventoryStore};
use rustle_workbench::runner::{EngineCommand, EngineInvoker, ExecutionResult, RunnerError};
use rustle_workbench::WorkspaceConfig;
use tempfile::TempDir;

/// Engine stand-in: records argv vectors, returns a canned result.
struct StubEngine {
    calls: Mutex<Vec<Vec<String>>>,
    result: ExecutionResult,
}

impl StubEngine {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            result: ExecutionResult {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                timed_out: false,
            },
        })
    }
}

#[async_trait]
impl EngineInvoker for StubEngine {
    async fn invoke(&self, command: &EngineCommand) -> Result<ExecutionResult, RunnerError> {
        self.calls.lock().unwrap().push(command.argv().to_vec());
        Ok(self.result.clone())
    }
}

fn store() -> (TempDir, InventoryStore) {
    let temp = TempDir::new().unwrap();
    let config = Arc::new(WorkspaceConfig::with_root(temp.path()).unwrap());
    let guard = Arc::new(PathGuard::new(config.root()).unwrap());
    let backups = Arc::new(BackupManager::new());
    let store = InventoryStore::new(config, guard, backups, StubEngine::succeeding());
    (temp, store)
}

const SEED: &str = "\
[qfx_switches]
sw1 ansible_host=192.168.10.1
sw2 ansible_host=192.168.10.2

[qfx_switches:vars]
ansible_network_os=junos
";

#[tokio::test]
async fn write_then_read_round_trips() {
    let (_temp, store) = store();
    let report = store.write(SEED).await.unwrap();
    assert!(report.backup.is_none(), "first write has nothing to back up");
    assert!(report.validation_warning.is_none());
    assert_eq!(store.read().await.unwrap(), SEED);
}

#[tokio::test]
async fn read_missing_inventory_is_not_found() {
    let (_temp, store) = store();
    assert!(matches!(
        store.read().await,
        Err(InventoryError::NotFound)
    ));
}

#[tokio::test]
async fn add_then_remove_restores_the_file_byte_for_byte() {
    let (_temp, store) = store();
    store.write(SEED).await.unwrap();

    store
        .add_host("spine", "core1", "10.0.0.1", None)
        .await
        .unwrap();
    let with_host = store.read().await.unwrap();
    assert!(with_host.contains("[spine]\ncore1 ansible_host=10.0.0.1"));

    store.remove_host("core1").await.unwrap();
    assert_eq!(store.read().await.unwrap(), SEED);
}

#[tokio::test]
async fn duplicate_host_is_rejected_not_duplicated() {
    let (_temp, store) = store();
    store.write(SEED).await.unwrap();

    let err = store
        .add_host("edge", "sw1", "10.0.0.9", None)
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::DuplicateHost { host } if host == "sw1"));
    // File untouched by the failed add
    assert_eq!(store.read().await.unwrap(), SEED);
}

#[tokio::test]
async fn remove_unknown_host_is_host_not_found() {
    let (_temp, store) = store();
    store.write(SEED).await.unwrap();

    let err = store.remove_host("ghost").await.unwrap_err();
    assert!(matches!(err, InventoryError::HostNotFound { host } if host == "ghost"));
}

#[tokio::test]
async fn mutations_snapshot_the_prior_content() {
    let (_temp, store) = store();
    store.write(SEED).await.unwrap();

    let backup = store
        .add_host("spine", "core1", "10.0.0.1", None)
        .await
        .unwrap()
        .expect("existing file must be backed up");
    assert_eq!(backup.content, SEED.as_bytes());
    assert!(backup.backup_path.exists());
}

#[tokio::test]
async fn vars_sections_survive_host_edits() {
    let (_temp, store) = store();
    store.write(SEED).await.unwrap();

    store
        .add_host("qfx_switches", "sw3", "192.168.10.3", Some("ansible_port=830"))
        .await
        .unwrap();
    store.remove_host("sw2").await.unwrap();

    let content = store.read().await.unwrap();
    assert!(content.contains("[qfx_switches:vars]"));
    assert!(content.contains("ansible_network_os=junos"));
    assert!(content.contains("sw3 ansible_host=192.168.10.3 ansible_port=830"));
    assert!(!content.contains("sw2"));
}

#[tokio::test]
async fn list_reports_groups_and_members() {
    let (_temp, store) = store();
    store.write(SEED).await.unwrap();

    let summary = store.list().await.unwrap();
    assert_eq!(summary.total_hosts, 2);
    assert_eq!(summary.groups.len(), 1);
    assert_eq!(summary.groups[0].name, "qfx_switches");
    assert_eq!(summary.groups[0].hosts, vec!["sw1", "sw2"]);
}

#[tokio::test]
async fn whole_file_write_asks_the_engine_to_validate() {
    let temp = TempDir::new().unwrap();
    let config = Arc::new(WorkspaceConfig::with_root(temp.path()).unwrap());
    let guard = Arc::new(PathGuard::new(config.root()).unwrap());
    let backups = Arc::new(BackupManager::new());
    let engine = StubEngine::succeeding();
    let store = InventoryStore::new(config, guard, backups, engine.clone());

    store.write(SEED).await.unwrap();

    let calls = engine.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0][0].contains("ansible-inventory"));
    assert!(calls[0].contains(&"--list".to_string()));
}
