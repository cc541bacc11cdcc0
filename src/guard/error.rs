use thiserror::Error;

/// Boundary violations. Messages stay generic on purpose: echoing the
/// offending input would reflect injected content back to the caller.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("path violation: the requested path is not inside the workspace")]
    PathViolation,

    #[error("rejected input for '{field}': characters outside the allowed set")]
    SanitizationRejected { field: String },
}
