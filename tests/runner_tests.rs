//! CommandRunner behavior against real child processes

use std::sync::Arc;
use std::time::{Duration, Instant};

use rustle_workbench::runner::{CaptureMode, CommandRunner, EngineCommand, EngineInvoker};
use rustle_workbench::WorkspaceConfig;
use tempfile::TempDir;

fn runner() -> (TempDir, CommandRunner) {
    let temp = TempDir::new().unwrap();
    let config = Arc::new(WorkspaceConfig::with_root(temp.path()).unwrap());
    (temp, CommandRunner::new(config))
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn timeout_kills_the_child() {
    let (_temp, runner) = runner();
    let command = EngineCommand::custom(
        argv(&["sleep", "10"]),
        Duration::from_secs(1),
        CaptureMode::Raw,
    );

    let started = Instant::now();
    let result = runner.invoke(&command).await.unwrap();
    let elapsed = started.elapsed();

    assert!(result.timed_out);
    assert!(!result.success());
    assert!(
        elapsed < Duration::from_secs(3),
        "timeout took {elapsed:?}, expected ~1s"
    );
}

#[tokio::test]
async fn captures_stdout() {
    let (_temp, runner) = runner();
    let command = EngineCommand::custom(
        argv(&["echo", "hello workbench"]),
        Duration::from_secs(5),
        CaptureMode::Raw,
    );

    let result = runner.invoke(&command).await.unwrap();
    assert!(result.success());
    assert!(!result.timed_out);
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("hello workbench"));
}

#[tokio::test]
async fn shell_metacharacters_are_literal_arguments() {
    let (_temp, runner) = runner();
    // With a shell in the path these would expand or chain commands;
    // as argv elements they must come back verbatim.
    let hostile = "$(whoami); echo injected | cat";
    let command = EngineCommand::custom(
        argv(&["echo", hostile]),
        Duration::from_secs(5),
        CaptureMode::Raw,
    );

    let result = runner.invoke(&command).await.unwrap();
    assert!(result.success());
    assert!(result.stdout.contains(hostile));
    assert!(!result.stdout.contains("root\n"));
}

#[tokio::test]
async fn nonzero_exit_is_data_not_an_error() {
    let (_temp, runner) = runner();
    let command = EngineCommand::custom(argv(&["false"]), Duration::from_secs(5), CaptureMode::Raw);

    let result = runner.invoke(&command).await.unwrap();
    assert!(!result.success());
    assert!(!result.timed_out);
    assert_ne!(result.exit_code, 0);
}

#[tokio::test]
async fn missing_binary_is_a_spawn_error() {
    let (_temp, runner) = runner();
    let command = EngineCommand::custom(
        argv(&["definitely-not-a-real-binary-4821"]),
        Duration::from_secs(5),
        CaptureMode::Raw,
    );

    assert!(runner.invoke(&command).await.is_err());
}

#[tokio::test]
async fn rendering_sections_cover_both_streams() {
    let (_temp, runner) = runner();
    let command = EngineCommand::custom(
        argv(&["echo", "to stdout"]),
        Duration::from_secs(5),
        CaptureMode::Raw,
    );

    let result = runner.invoke(&command).await.unwrap();
    let rendered = result.render();
    assert!(rendered.contains("=== OUTPUT ==="));
    assert!(rendered.contains("to stdout"));
    assert!(!rendered.contains("=== STDERR ==="));
}
