//! Ad-hoc device interaction through the automation engine
//!
//! Free-form payloads (operational commands, configuration lines) are
//! JSON-encoded here and travel as a single argv element; nothing the
//! caller supplies is ever interpreted by a shell.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::WorkspaceConfig;
use crate::runner::{EngineCommand, EngineInvoker, ExecutionResult, RunnerError};

const FACTS_MODULE: &str = "junipernetworks.junos.junos_facts";
const COMMAND_MODULE: &str = "junipernetworks.junos.junos_command";
const CONFIG_MODULE: &str = "junipernetworks.junos.junos_config";

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unsupported format '{format}'; use one of: {allowed}")]
    UnsupportedFormat { format: String, allowed: String },

    #[error("no commands supplied")]
    EmptyCommands,

    #[error("no configuration lines supplied")]
    EmptyConfig,

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Connectivity summary derived from a ping sweep.
#[derive(Debug)]
pub struct PingReport {
    pub reachable: usize,
    pub failed: usize,
    pub rendering: String,
}

pub struct DeviceTools {
    config: Arc<WorkspaceConfig>,
    engine: Arc<dyn EngineInvoker>,
}

impl DeviceTools {
    pub fn new(config: Arc<WorkspaceConfig>, engine: Arc<dyn EngineInvoker>) -> Self {
        Self { config, engine }
    }

    /// Run an arbitrary engine module against a host pattern.
    pub async fn adhoc(
        &self,
        pattern: &str,
        module: &str,
        module_args: Option<String>,
    ) -> Result<(ExecutionResult, String), DeviceError> {
        let command = EngineCommand::adhoc(&self.config, pattern, module, module_args);
        let result = self.engine.invoke(&command).await?;
        let rendering = command.render(&result);
        Ok((result, rendering))
    }

    /// Ping sweep with a reachable/failed tally.
    pub async fn ping(&self, pattern: &str) -> Result<PingReport, DeviceError> {
        let (result, rendering) = self.adhoc(pattern, "ping", None).await?;
        let reachable = result.stdout.matches("SUCCESS").count();
        let failed =
            result.stdout.matches("UNREACHABLE").count() + result.stdout.matches("FAILED").count();
        info!(pattern, reachable, failed, "connectivity sweep finished");
        Ok(PingReport {
            reachable,
            failed,
            rendering,
        })
    }

    /// Gather device facts, optionally limited to a subset.
    pub async fn facts(
        &self,
        pattern: &str,
        gather_subset: Option<&str>,
    ) -> Result<(ExecutionResult, String), DeviceError> {
        let module_args = gather_subset
            .filter(|subset| !subset.trim().is_empty())
            .map(|subset| format!("gather_subset={subset}"));
        self.adhoc(pattern, FACTS_MODULE, module_args).await
    }

    /// Retrieve running configuration in one of the display formats.
    pub async fn get_config(
        &self,
        pattern: &str,
        format: &str,
    ) -> Result<(ExecutionResult, String), DeviceError> {
        let allowed = ["text", "set", "json", "xml"];
        if !allowed.contains(&format) {
            return Err(DeviceError::UnsupportedFormat {
                format: format.to_string(),
                allowed: allowed.join(", "),
            });
        }
        self.adhoc(pattern, CONFIG_MODULE, Some(format!("display={format}")))
            .await
    }

    /// Run operational commands (comma-separated) on devices.
    pub async fn run_commands(
        &self,
        pattern: &str,
        commands: &str,
    ) -> Result<(ExecutionResult, String), DeviceError> {
        let list: Vec<&str> = commands
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        if list.is_empty() {
            return Err(DeviceError::EmptyCommands);
        }
        let encoded = serde_json::to_string(&list).expect("string list always encodes");
        self.adhoc(pattern, COMMAND_MODULE, Some(format!("commands={encoded}")))
            .await
    }

    /// Push configuration lines to devices. `check_mode` evaluates the
    /// candidate without committing anything.
    pub async fn push_config(
        &self,
        pattern: &str,
        config_lines: &str,
        format: &str,
        commit: bool,
        check_mode: bool,
    ) -> Result<(ExecutionResult, String), DeviceError> {
        let allowed = ["set", "text", "json"];
        if !allowed.contains(&format) {
            return Err(DeviceError::UnsupportedFormat {
                format: format.to_string(),
                allowed: allowed.join(", "),
            });
        }

        let lines: Vec<&str> = config_lines
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(DeviceError::EmptyConfig);
        }

        let encoded = serde_json::to_string(&lines).expect("string list always encodes");
        let commit_flag = if commit { "yes" } else { "no" };
        let module_args = format!("lines={encoded} update=merge commit={commit_flag}");

        let mut command = EngineCommand::adhoc(&self.config, pattern, CONFIG_MODULE, Some(module_args));
        if check_mode {
            command = command.into_check_mode();
        }
        let result = self.engine.invoke(&command).await?;
        let rendering = command.render(&result);
        Ok((result, rendering))
    }
}
