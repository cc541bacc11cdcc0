//! Inbound argument filtering and outbound secret masking
//!
//! Filtering rejects instead of stripping: a disallowed byte is an explicit
//! error, never silently removed intent.

use once_cell::sync::Lazy;
use regex::Regex;

use super::GuardError;

/// Replacement for masked secret values.
pub const REDACTION_MARKER: &str = "********";

/// Matches a line-oriented `key: value` or `key=value` pair whose key looks
/// secret-bearing. The value group is replaced wholesale.
static SECRET_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\s*[A-Za-z0-9_.\-]*(?:password|passphrase|secret|token|key)[A-Za-z0-9_.\-]*\s*[:=]\s*)(.+)$",
    )
    .expect("invalid secret-line regex")
});

/// Character class an argument is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgClass {
    /// Bare identifiers: host, group, playbook and template names.
    Name,
    /// Workspace-relative file paths.
    PathArg,
    /// Single elements of a child-process argument vector.
    ProcessArg,
    /// File content bodies: free text, control bytes rejected.
    Body,
}

impl ArgClass {
    fn permits(self, c: char) -> bool {
        match self {
            ArgClass::Name => c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'),
            ArgClass::PathArg => {
                c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':')
            }
            ArgClass::ProcessArg => {
                c.is_ascii_alphanumeric()
                    || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | ',' | '@' | ' ' | '*')
            }
            ArgClass::Body => !c.is_control() || matches!(c, '\n' | '\r' | '\t'),
        }
    }
}

/// Two independent passes: inbound charset filtering, outbound masking.
#[derive(Debug, Clone, Default)]
pub struct InputSanitizer;

impl InputSanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Check a single argument against the charset of its class.
    pub fn check(&self, field: &str, value: &str, class: ArgClass) -> Result<(), GuardError> {
        for c in value.chars() {
            if !class.permits(c) {
                return Err(GuardError::SanitizationRejected {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Mask the value portion of secret-looking key/value lines. Idempotent:
    /// an already-masked value is replaced with the same marker again.
    pub fn mask(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            match SECRET_LINE.captures(line) {
                Some(caps) => {
                    out.push_str(&caps[1]);
                    out.push_str(REDACTION_MARKER);
                }
                None => out.push_str(line),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_charset() {
        let s = InputSanitizer::new();
        assert!(s.check("host", "core-sw01.lab", ArgClass::Name).is_ok());
        assert!(s.check("host", "host;rm -rf /", ArgClass::Name).is_err());
        assert!(s.check("host", "host name", ArgClass::Name).is_err());
        assert!(s.check("host", "a$(b)", ArgClass::Name).is_err());
    }

    #[test]
    fn path_charset() {
        let s = InputSanitizer::new();
        assert!(s
            .check("path", "group_vars/qfx_switches.yml", ArgClass::PathArg)
            .is_ok());
        assert!(s.check("path", "a|b", ArgClass::PathArg).is_err());
        assert!(s.check("path", "a`b`", ArgClass::PathArg).is_err());
    }

    #[test]
    fn process_arg_charset() {
        let s = InputSanitizer::new();
        assert!(s
            .check("extra_vars", "env=prod region=eu", ArgClass::ProcessArg)
            .is_ok());
        assert!(s.check("extra_vars", "x; reboot", ArgClass::ProcessArg).is_err());
        assert!(s.check("extra_vars", "$(id)", ArgClass::ProcessArg).is_err());
    }

    #[test]
    fn body_rejects_control_bytes_only() {
        let s = InputSanitizer::new();
        assert!(s
            .check("content", "- hosts: all\n  tasks: []\n", ArgClass::Body)
            .is_ok());
        assert!(s.check("content", "text\u{1b}[31m", ArgClass::Body).is_err());
        assert!(s.check("content", "a\u{0}b", ArgClass::Body).is_err());
    }

    #[test]
    fn masks_secret_lines() {
        let s = InputSanitizer::new();
        let masked = s.mask("user: admin\npassword: foo123\napi_token=abc\n");
        assert!(!masked.contains("foo123"));
        assert!(!masked.contains("abc"));
        assert!(masked.contains("user: admin"));
        assert!(masked.contains(&format!("password: {REDACTION_MARKER}")));
        assert!(masked.contains(&format!("api_token={REDACTION_MARKER}")));
    }

    #[test]
    fn masks_indented_yaml() {
        let s = InputSanitizer::new();
        let masked = s.mask("junos:\n  ansible_password: s3cret\n  port: 830\n");
        assert!(!masked.contains("s3cret"));
        assert!(masked.contains("port: 830"));
    }

    #[test]
    fn masking_is_idempotent() {
        let s = InputSanitizer::new();
        let once = s.mask("ssh_private_key: AAAA\npassword=hunter2");
        let twice = s.mask(&once);
        assert_eq!(once, twice);
    }
}
