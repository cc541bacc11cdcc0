//! Workspace path containment
//!
//! Canonicalization happens after joining onto the root, never before, so
//! symlink and `..` tricks are caught against the real filesystem layout.

use std::path::{Component, Path, PathBuf};

use super::GuardError;

/// Resolves caller-supplied relative paths against the canonical workspace
/// root and rejects anything that escapes it.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// The root must exist; it is canonicalized once here.
    pub fn new(root: &Path) -> std::io::Result<Self> {
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path to an absolute path inside the root.
    ///
    /// The target itself does not have to exist yet (writes create files),
    /// but every existing ancestor is canonicalized and checked, so a
    /// symlink pointing outside the workspace fails here.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, GuardError> {
        if relative.trim().is_empty() {
            return Err(GuardError::PathViolation);
        }

        let relative = Path::new(relative);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                // ParentDir, RootDir and prefixes all step outside the root
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(GuardError::PathViolation)
                }
            }
        }

        let joined = self.root.join(relative);
        let canonical =
            canonicalize_allow_missing(&joined).map_err(|_| GuardError::PathViolation)?;

        if canonical == self.root || canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(GuardError::PathViolation)
        }
    }

    /// Like [`resolve`](Self::resolve), but the target must already exist.
    pub fn resolve_existing(&self, relative: &str) -> Result<PathBuf, GuardError> {
        let path = self.resolve(relative)?;
        if path.exists() {
            Ok(path)
        } else {
            Err(GuardError::PathViolation)
        }
    }
}

/// Canonicalize a path whose leaf components may not exist yet: the deepest
/// existing ancestor is canonicalized and the remaining (already vetted)
/// components are appended.
fn canonicalize_allow_missing(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }

    let mut existing = path;
    let mut pending: Vec<&std::ffi::OsStr> = Vec::new();
    while !existing.exists() {
        let name = existing.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unresolvable path")
        })?;
        pending.push(name);
        existing = existing.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no existing ancestor")
        })?;
    }

    let mut resolved = existing.canonicalize()?;
    for name in pending.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}
