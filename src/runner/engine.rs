//! Typed argument-vector builders for the automation engine
//!
//! Dry-run, syntax-check and limiting are all distinguished here, at the
//! argv level; callers never assemble command lines by hand.

use std::path::Path;
use std::time::Duration;

use crate::config::WorkspaceConfig;

use super::ExecutionResult;

/// How captured output is rendered back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Verbatim stdout/stderr sections.
    Raw,
    /// Play-recap summary ahead of the full output.
    Summarized,
}

/// One fully-specified engine invocation.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    argv: Vec<String>,
    timeout: Duration,
    capture: CaptureMode,
}

impl EngineCommand {
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn capture(&self) -> CaptureMode {
        self.capture
    }

    /// Render a result according to this command's capture mode.
    pub fn render(&self, result: &ExecutionResult) -> String {
        match self.capture {
            CaptureMode::Raw => result.render(),
            CaptureMode::Summarized => summarize_run(&result.render()),
        }
    }

    /// An arbitrary argument vector with an explicit timeout. The engine
    /// builders below are preferred; this is the generic entry.
    pub fn custom(argv: Vec<String>, timeout: Duration, capture: CaptureMode) -> Self {
        Self {
            argv,
            timeout,
            capture,
        }
    }

    /// `ansible-playbook -i <inventory> <playbook> [--limit] [--extra-vars]
    /// [--tags] [-vvv]`
    pub fn playbook_run(config: &WorkspaceConfig, playbook: &Path, opts: &RunOptions) -> Self {
        let mut argv = playbook_base(config, playbook);
        if let Some(limit) = &opts.limit {
            argv.push("--limit".to_string());
            argv.push(limit.clone());
        }
        if let Some(extra_vars) = &opts.extra_vars {
            argv.push("--extra-vars".to_string());
            argv.push(extra_vars.clone());
        }
        if let Some(tags) = &opts.tags {
            argv.push("--tags".to_string());
            argv.push(tags.clone());
        }
        if opts.verbose {
            argv.push("-vvv".to_string());
        }
        Self {
            argv,
            timeout: config.run_timeout,
            capture: CaptureMode::Summarized,
        }
    }

    /// Check mode: reports intended changes without applying them.
    pub fn playbook_check(
        config: &WorkspaceConfig,
        playbook: &Path,
        limit: Option<&str>,
    ) -> Self {
        let mut argv = playbook_base(config, playbook);
        argv.push("--check".to_string());
        argv.push("--diff".to_string());
        if let Some(limit) = limit {
            argv.push("--limit".to_string());
            argv.push(limit.to_string());
        }
        Self {
            argv,
            timeout: config.run_timeout,
            capture: CaptureMode::Summarized,
        }
    }

    /// Syntax validation only; nothing is executed against devices.
    pub fn playbook_syntax_check(config: &WorkspaceConfig, playbook: &Path) -> Self {
        let mut argv = playbook_base(config, playbook);
        argv.push("--syntax-check".to_string());
        Self {
            argv,
            timeout: config.check_timeout,
            capture: CaptureMode::Raw,
        }
    }

    /// `ansible -i <inventory> <pattern> -m <module> [-a <args>]`
    pub fn adhoc(
        config: &WorkspaceConfig,
        pattern: &str,
        module: &str,
        module_args: Option<String>,
    ) -> Self {
        let mut argv = vec![
            config.adhoc_bin.clone(),
            "-i".to_string(),
            config.inventory_path().display().to_string(),
            pattern.to_string(),
            "-m".to_string(),
            module.to_string(),
        ];
        if let Some(args) = module_args {
            argv.push("-a".to_string());
            argv.push(args);
        }
        Self {
            argv,
            timeout: config.device_timeout,
            capture: CaptureMode::Raw,
        }
    }

    /// Adhoc with `--check` appended: candidate evaluation only.
    pub fn into_check_mode(mut self) -> Self {
        self.argv.push("--check".to_string());
        self
    }

    /// `ansible-inventory -i <inventory> --list`
    pub fn inventory_list(config: &WorkspaceConfig) -> Self {
        Self {
            argv: vec![
                config.inventory_bin.clone(),
                "-i".to_string(),
                config.inventory_path().display().to_string(),
                "--list".to_string(),
            ],
            timeout: config.check_timeout,
            capture: CaptureMode::Raw,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub limit: Option<String>,
    pub extra_vars: Option<String>,
    pub tags: Option<String>,
    pub verbose: bool,
}

fn playbook_base(config: &WorkspaceConfig, playbook: &Path) -> Vec<String> {
    vec![
        config.playbook_bin.clone(),
        "-i".to_string(),
        config.inventory_path().display().to_string(),
        playbook.display().to_string(),
    ]
}

/// Pull the play recap and failure lines to the front of a run transcript.
pub fn summarize_run(raw: &str) -> String {
    let mut summary = Vec::new();
    let mut in_recap = false;
    for line in raw.lines() {
        if line.contains("PLAY RECAP") {
            in_recap = true;
        }
        let lowered = line.to_lowercase();
        if in_recap
            || lowered.contains("fatal:")
            || lowered.contains("failed:")
            || (lowered.contains("changed:") && !lowered.contains("ok="))
        {
            summary.push(line);
        }
    }

    if summary.is_empty() {
        raw.to_string()
    } else {
        format!(
            "=== SUMMARY ===\n{}\n\n=== FULL OUTPUT ===\n{raw}",
            summary.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config() -> (TempDir, Arc<WorkspaceConfig>) {
        let temp = TempDir::new().unwrap();
        let config = WorkspaceConfig::with_root(temp.path()).unwrap();
        (temp, Arc::new(config))
    }

    #[test]
    fn check_mode_is_an_argv_distinction() {
        let (_temp, config) = config();
        let playbook = config.playbooks_dir().join("site.yml");

        let run = EngineCommand::playbook_run(&config, &playbook, &RunOptions::default());
        let check = EngineCommand::playbook_check(&config, &playbook, Some("qfx_switches"));

        assert!(!run.argv().contains(&"--check".to_string()));
        assert!(check.argv().contains(&"--check".to_string()));
        assert!(check.argv().contains(&"--diff".to_string()));
        let limit_at = check.argv().iter().position(|a| a == "--limit").unwrap();
        assert_eq!(check.argv()[limit_at + 1], "qfx_switches");
    }

    #[test]
    fn run_options_map_to_flags() {
        let (_temp, config) = config();
        let playbook = config.playbooks_dir().join("site.yml");
        let opts = RunOptions {
            limit: Some("core".to_string()),
            extra_vars: Some("env=lab".to_string()),
            tags: Some("interfaces".to_string()),
            verbose: true,
        };

        let cmd = EngineCommand::playbook_run(&config, &playbook, &opts);
        let argv = cmd.argv();
        assert!(argv.windows(2).any(|w| w == ["--limit", "core"]));
        assert!(argv.windows(2).any(|w| w == ["--extra-vars", "env=lab"]));
        assert!(argv.windows(2).any(|w| w == ["--tags", "interfaces"]));
        assert!(argv.contains(&"-vvv".to_string()));
    }

    #[test]
    fn adhoc_args_stay_single_elements() {
        let (_temp, config) = config();
        let cmd = EngineCommand::adhoc(
            &config,
            "all",
            "junipernetworks.junos.junos_command",
            Some(r#"commands=["show version"]"#.to_string()),
        );
        // The module args travel as one argv element, quoting intact.
        let at = cmd.argv().iter().position(|a| a == "-a").unwrap();
        assert_eq!(cmd.argv()[at + 1], r#"commands=["show version"]"#);
    }

    #[test]
    fn summarize_pulls_recap_forward() {
        let raw = "TASK [one]\nok: [sw1]\nfatal: [sw2]: FAILED! => {}\nPLAY RECAP\nsw1 : ok=1\n";
        let summary = summarize_run(raw);
        assert!(summary.starts_with("=== SUMMARY ==="));
        assert!(summary.contains("fatal: [sw2]"));
        assert!(summary.contains("=== FULL OUTPUT ==="));
    }

    #[test]
    fn summarize_passes_quiet_output_through() {
        assert_eq!(summarize_run("nothing to report"), "nothing to report");
    }
}
