//! VariableStore CRUD and the effective-variables merge

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rustle_workbench::backup::BackupManager;
use rustle_workbench::guard::PathGuard;
use rustle_workbench::inventory::InventoryStore;
use rustle_workbench::runner::{EngineCommand, EngineInvoker, ExecutionResult, RunnerError};
use rustle_workbench::vars::{VarScope, VariableStore, VarsError};
use rustle_workbench::WorkspaceConfig;
use serde_yaml::Value;
use tempfile::TempDir;

struct StubEngine {
    calls: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl EngineInvoker for StubEngine {
    async fn invoke(&self, command: &EngineCommand) -> Result<ExecutionResult, RunnerError> {
        self.calls.lock().unwrap().push(command.argv().to_vec());
        Ok(ExecutionResult {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
        })
    }
}

fn stores() -> (TempDir, Arc<InventoryStore>, VariableStore) {
    let temp = TempDir::new().unwrap();
    let config = Arc::new(WorkspaceConfig::with_root(temp.path()).unwrap());
    let guard = Arc::new(PathGuard::new(config.root()).unwrap());
    let backups = Arc::new(BackupManager::new());
    let engine = Arc::new(StubEngine {
        calls: Mutex::new(Vec::new()),
    });
    let inventory = Arc::new(InventoryStore::new(
        config.clone(),
        guard.clone(),
        backups.clone(),
        engine,
    ));
    let vars = VariableStore::new(config, guard, backups, inventory.clone());
    (temp, inventory, vars)
}

fn lookup<'a>(mapping: &'a serde_yaml::Mapping, key: &str) -> Option<&'a Value> {
    mapping
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

#[tokio::test]
async fn write_then_read() {
    let (_temp, _inventory, vars) = stores();
    vars.write(VarScope::Group, "qfx_switches", "ntp_server: 10.0.0.53\n")
        .await
        .unwrap();

    let content = vars.read(VarScope::Group, "qfx_switches").await.unwrap();
    assert_eq!(content, "ntp_server: 10.0.0.53\n");
}

#[tokio::test]
async fn malformed_yaml_is_rejected_before_touching_disk() {
    let (_temp, _inventory, vars) = stores();
    let err = vars
        .write(VarScope::Host, "sw1", "key: [unclosed\n")
        .await
        .unwrap_err();
    assert!(matches!(err, VarsError::Parse { .. }));
    assert!(matches!(
        vars.read(VarScope::Host, "sw1").await,
        Err(VarsError::NotFound { .. })
    ));
}

#[tokio::test]
async fn overwrites_are_backed_up() {
    let (_temp, _inventory, vars) = stores();
    vars.write(VarScope::Group, "all", "a: 1\n").await.unwrap();
    let backup = vars
        .write(VarScope::Group, "all", "a: 2\n")
        .await
        .unwrap()
        .expect("overwrite must snapshot");
    assert_eq!(backup.content, b"a: 1\n");
}

#[tokio::test]
async fn listing_is_scoped_and_sorted() {
    let (_temp, _inventory, vars) = stores();
    vars.write(VarScope::Group, "spine", "x: 1\n").await.unwrap();
    vars.write(VarScope::Group, "edge", "x: 1\n").await.unwrap();
    vars.write(VarScope::Host, "sw1", "x: 1\n").await.unwrap();

    let listing = vars.list().await.unwrap();
    assert_eq!(listing.group_vars, vec!["edge", "spine"]);
    assert_eq!(listing.host_vars, vec!["sw1"]);
}

#[tokio::test]
async fn host_scope_overrides_group_scope() {
    let (_temp, inventory, vars) = stores();
    inventory
        .write("[g]\nh1 ansible_host=10.0.0.1\n")
        .await
        .unwrap();
    vars.write(VarScope::Group, "g", "x: 1\n").await.unwrap();
    vars.write(VarScope::Host, "h1", "x: 2\n").await.unwrap();

    let effective = vars.effective("h1").await.unwrap();
    assert_eq!(lookup(&effective, "x").and_then(Value::as_i64), Some(2));
}

#[tokio::test]
async fn group_scope_overrides_inline_inventory_vars() {
    let (_temp, inventory, vars) = stores();
    inventory
        .write("[g]\nh1 ansible_host=10.0.0.1 mtu=1500\n")
        .await
        .unwrap();
    vars.write(VarScope::Group, "g", "mtu: 9000\n").await.unwrap();

    let effective = vars.effective("h1").await.unwrap();
    assert_eq!(lookup(&effective, "mtu").and_then(Value::as_i64), Some(9000));
    // Inline vars without an override survive the merge
    assert_eq!(
        lookup(&effective, "ansible_host").and_then(Value::as_str),
        Some("10.0.0.1")
    );
}

#[tokio::test]
async fn later_groups_override_earlier_in_declared_order() {
    let (_temp, inventory, vars) = stores();
    inventory
        .write("[first]\nh1 ansible_host=10.0.0.1\n\n[second]\nh1 ansible_host=10.0.0.1\n")
        .await
        .unwrap();
    vars.write(VarScope::Group, "first", "domain: first.lab\n")
        .await
        .unwrap();
    vars.write(VarScope::Group, "second", "domain: second.lab\n")
        .await
        .unwrap();

    let effective = vars.effective("h1").await.unwrap();
    assert_eq!(
        lookup(&effective, "domain").and_then(Value::as_str),
        Some("second.lab")
    );
}

#[tokio::test]
async fn effective_vars_for_unknown_host_are_empty() {
    let (_temp, inventory, vars) = stores();
    inventory.write("[g]\nh1\n").await.unwrap();
    let effective = vars.effective("stranger").await.unwrap();
    assert!(effective.is_empty());
}
