use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustle_workbench::dispatch::{Dispatcher, Services};
use rustle_workbench::WorkspaceConfig;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rustle-workbench")]
#[command(about = "Guarded workspace manager for Ansible automation directories")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Workspace root (overrides the ANSIBLE_DIR environment variable)
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the exposed tool names
    Tools,

    /// Invoke a single tool with key=value arguments
    Call {
        tool: String,

        /// Arguments as key=value pairs
        #[arg(value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },

    /// Serve tool calls as line-delimited JSON over stdin/stdout
    Serve,
}

/// One request line on the serve channel.
#[derive(Deserialize)]
struct WireRequest {
    tool: String,
    #[serde(default)]
    args: HashMap<String, String>,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the protocol channel in serve mode; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.workspace {
        Some(root) => WorkspaceConfig::with_root(root.clone()),
        None => WorkspaceConfig::from_env(),
    }
    .context("failed to configure the workspace")?;
    let config = Arc::new(config);

    info!(root = %config.root().display(), "workspace ready");
    let missing = config.missing_engine_binaries();
    if !missing.is_empty() {
        warn!(
            binaries = missing.join(", "),
            "engine binaries not found on PATH; execution tools will fail until installed"
        );
    }

    let services = Arc::new(Services::initialize(config).context("failed to wire components")?);
    let dispatcher = Dispatcher::new(services);

    match cli.command {
        Command::Tools => {
            for name in dispatcher.tool_names() {
                println!("{name}");
            }
        }
        Command::Call { tool, args } => {
            let result = dispatcher.dispatch(&tool, args.into_iter().collect()).await;
            println!("{result}");
        }
        Command::Serve => serve(dispatcher).await?,
    }

    Ok(())
}

/// Line-delimited JSON loop: `{"tool": "...", "args": {...}}` in, one
/// `{"result": "..."}` object out per request.
async fn serve(dispatcher: Dispatcher) -> Result<()> {
    info!("serving tool calls on stdin/stdout");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<WireRequest>(&line) {
            Ok(request) => dispatcher.dispatch(&request.tool, request.args).await,
            Err(err) => format!("ERROR: malformed request: {err}"),
        };

        let response = serde_json::json!({ "result": result });
        stdout.write_all(response.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("input closed, shutting down");
    Ok(())
}
