//! Child-process execution with explicit argument vectors
//!
//! The engine is always spawned directly from an argv vector; nothing is
//! ever concatenated into a shell command line. Every invocation carries a
//! wall-clock timeout with forced termination on expiry.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::WorkspaceConfig;

use super::EngineCommand;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting on '{program}': {source}")]
    WaitFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured outcome of one engine invocation. Non-zero exit is data here,
/// not an error: classification belongs to the calling store.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// Sectioned rendering of the captured streams.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if self.timed_out {
            parts.push("=== TIMED OUT ===".to_string());
        }
        if !self.stdout.is_empty() {
            parts.push(format!("=== OUTPUT ===\n{}", self.stdout));
        }
        if !self.stderr.is_empty() {
            parts.push(format!("=== STDERR ===\n{}", self.stderr));
        }
        if !self.timed_out && self.exit_code != 0 {
            parts.push(format!("=== RETURN CODE: {} ===", self.exit_code));
        }
        if parts.is_empty() {
            "Command completed with no output.".to_string()
        } else {
            parts.join("\n")
        }
    }
}

/// Seam for the engine boundary so stores can be exercised without the
/// engine installed.
#[async_trait]
pub trait EngineInvoker: Send + Sync {
    async fn invoke(&self, command: &EngineCommand) -> Result<ExecutionResult, RunnerError>;
}

/// Spawns engine processes inside the workspace root.
pub struct CommandRunner {
    config: Arc<WorkspaceConfig>,
}

impl CommandRunner {
    pub fn new(config: Arc<WorkspaceConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineInvoker for CommandRunner {
    async fn invoke(&self, command: &EngineCommand) -> Result<ExecutionResult, RunnerError> {
        let argv = command.argv();
        let Some(program) = argv.first().cloned() else {
            return Err(RunnerError::SpawnFailed {
                program: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
            });
        };
        info!(command = %argv.join(" "), "running engine command");

        let mut cmd = Command::new(&program);
        cmd.args(&argv[1..])
            .current_dir(self.config.root())
            .env("ANSIBLE_HOST_KEY_CHECKING", "False")
            .env("ANSIBLE_FORCE_COLOR", "false")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| RunnerError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = tokio::spawn(drain(stdout));
        let stderr_task = tokio::spawn(drain(stderr));

        let (exit_code, timed_out) =
            match tokio::time::timeout(command.timeout(), child.wait()).await {
                Ok(status) => {
                    let status = status.map_err(|source| RunnerError::WaitFailed {
                        program: program.clone(),
                        source,
                    })?;
                    (status.code().unwrap_or(-1), false)
                }
                Err(_elapsed) => {
                    warn!(command = %argv.join(" "), "engine command timed out, killing child");
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                    (-1, true)
                }
            };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
        })
    }
}

async fn drain(stream: Option<impl AsyncReadExt + Unpin>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).into_owned()
}
