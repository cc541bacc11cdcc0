//! String-map arguments and their typed request forms
//!
//! The transport delivers a flat map of string-typed named arguments; this
//! is the only place where strings are marshaled into typed requests.

use std::collections::HashMap;

use crate::guard::{ArgClass, GuardError, InputSanitizer};

use super::DispatchError;

/// Raw named arguments of one tool call; absent keys read as empty.
#[derive(Debug, Default)]
pub struct ToolArgs(HashMap<String, String>);

impl ToolArgs {
    pub fn new(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    /// The value if present and non-empty.
    pub fn opt(&self, key: &str) -> Option<&str> {
        let value = self.get(key);
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }

    pub fn require(&self, key: &str) -> Result<&str, DispatchError> {
        self.opt(key).ok_or_else(|| DispatchError::MissingArgument {
            name: key.to_string(),
        })
    }

    /// `yes` / `true` / `1` (any case) read as set.
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).trim().to_lowercase().as_str(),
            "yes" | "true" | "1"
        )
    }
}

/// `ansible_add_host` arguments.
#[derive(Debug)]
pub struct AddHostRequest {
    pub hostname: String,
    pub address: String,
    pub group: String,
    pub extra_vars: Option<String>,
}

impl AddHostRequest {
    pub fn from_args(sanitizer: &InputSanitizer, args: &ToolArgs) -> Result<Self, DispatchError> {
        let hostname = args.require("hostname")?;
        let address = args.require("ansible_host")?;
        let group = args.opt("group").unwrap_or("all");
        sanitizer.check("hostname", hostname, ArgClass::Name)?;
        sanitizer.check("group", group, ArgClass::Name)?;
        // These become inventory file text: the line-oriented charset keeps
        // a crafted value from smuggling extra inventory lines in.
        sanitizer.check("ansible_host", address, ArgClass::ProcessArg)?;
        let extra_vars = match args.opt("extra_vars") {
            Some(extra) => {
                sanitizer.check("extra_vars", extra, ArgClass::ProcessArg)?;
                Some(extra.to_string())
            }
            None => None,
        };
        Ok(Self {
            hostname: hostname.to_string(),
            address: address.to_string(),
            group: group.to_string(),
            extra_vars,
        })
    }
}

/// `ansible_run_playbook` arguments.
#[derive(Debug)]
pub struct RunPlaybookRequest {
    pub name: String,
    pub limit: Option<String>,
    pub extra_vars: Option<String>,
    pub tags: Option<String>,
    pub verbose: bool,
}

impl RunPlaybookRequest {
    pub fn from_args(sanitizer: &InputSanitizer, args: &ToolArgs) -> Result<Self, DispatchError> {
        let name = args.require("playbook_name")?;
        sanitizer.check("playbook_name", name, ArgClass::Name)?;
        let limit = checked_opt(sanitizer, args, "limit_hosts")?;
        let extra_vars = checked_opt(sanitizer, args, "extra_vars")?;
        let tags = checked_opt(sanitizer, args, "tags")?;
        Ok(Self {
            name: name.to_string(),
            limit,
            extra_vars,
            tags,
            verbose: args.flag("verbose"),
        })
    }
}

/// `ansible_push_config` arguments.
#[derive(Debug)]
pub struct PushConfigRequest {
    pub targets: String,
    pub config_lines: String,
    pub format: String,
    pub commit: bool,
    pub check_mode: bool,
}

impl PushConfigRequest {
    pub fn from_args(sanitizer: &InputSanitizer, args: &ToolArgs) -> Result<Self, DispatchError> {
        let targets = args.require("target_hosts")?;
        let config_lines = args.require("config_lines")?;
        sanitizer.check("target_hosts", targets, ArgClass::ProcessArg)?;
        sanitizer.check("config_lines", config_lines, ArgClass::Body)?;
        let format = args.opt("config_format").unwrap_or("set");
        sanitizer.check("config_format", format, ArgClass::Name)?;
        // commit defaults on, matching the engine module's merge behavior
        let commit = args.opt("commit").map(|_| args.flag("commit")).unwrap_or(true);
        Ok(Self {
            targets: targets.to_string(),
            config_lines: config_lines.to_string(),
            format: format.to_string(),
            commit,
            check_mode: args.flag("check_mode"),
        })
    }
}

/// Sanitize an optional process-argument value.
pub fn checked_opt(
    sanitizer: &InputSanitizer,
    args: &ToolArgs,
    key: &str,
) -> Result<Option<String>, GuardError> {
    match args.opt(key) {
        Some(value) => {
            sanitizer.check(key, value, ArgClass::ProcessArg)?;
            Ok(Some(value.to_string()))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> ToolArgs {
        ToolArgs::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn absent_keys_read_empty() {
        let a = args(&[]);
        assert_eq!(a.get("anything"), "");
        assert!(a.opt("anything").is_none());
        assert!(a.require("anything").is_err());
        assert!(!a.flag("anything"));
    }

    #[test]
    fn flags_accept_the_usual_spellings() {
        for spelling in ["yes", "TRUE", "1"] {
            assert!(args(&[("confirm", spelling)]).flag("confirm"));
        }
        assert!(!args(&[("confirm", "no")]).flag("confirm"));
    }

    #[test]
    fn add_host_rejects_hostile_names() {
        let sanitizer = InputSanitizer::new();
        let hostile = args(&[("hostname", "sw1; rm -rf /"), ("ansible_host", "10.0.0.1")]);
        assert!(AddHostRequest::from_args(&sanitizer, &hostile).is_err());

        let clean = args(&[("hostname", "sw1"), ("ansible_host", "10.0.0.1")]);
        let request = AddHostRequest::from_args(&sanitizer, &clean).unwrap();
        assert_eq!(request.group, "all");
    }

    #[test]
    fn push_config_defaults() {
        let sanitizer = InputSanitizer::new();
        let a = args(&[
            ("target_hosts", "qfx_switches"),
            ("config_lines", "set system host-name sw1"),
        ]);
        let request = PushConfigRequest::from_args(&sanitizer, &a).unwrap();
        assert_eq!(request.format, "set");
        assert!(request.commit);
        assert!(!request.check_mode);
    }
}
