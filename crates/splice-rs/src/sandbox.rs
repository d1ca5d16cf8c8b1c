//! Workspace containment checks for every filesystem-touching command.
//!
//! All reads, writes, and deletes performed by the resolver, chunk store,
//! and patch engine pass through [`ensure_contained`] before touching the
//! filesystem. A path that canonicalizes outside the workspace root is a
//! hard rejection for the command that named it — never a silent clamp —
//! and no IO has happened by the time the rejection is produced.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::EngineError;

/// Validate that `path` stays inside `root`, returning its resolved
/// absolute form.
///
/// Relative paths are interpreted against `root`. Canonicalization resolves
/// `..` and symlinks where the path exists on disk; for not-yet-existing
/// targets (e.g. a `WRITE` creating a new file) the longest existing prefix
/// is canonicalized and the tail is resolved lexically.
///
/// Pure validation: the only filesystem access is metadata lookups during
/// canonicalization. Errors abort the single command being processed, not
/// the session.
pub fn ensure_contained(path: &Path, root: &Path) -> Result<PathBuf, EngineError> {
    let root = root.canonicalize()?;
    let candidate = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let resolved = canonicalize_lenient(&candidate)?;

    if resolved.strip_prefix(&root).is_err() {
        return Err(EngineError::SandboxViolation {
            path: path.to_path_buf(),
        });
    }
    Ok(resolved)
}

/// Canonicalize a path that may not fully exist yet.
///
/// The longest existing ancestor is canonicalized through the OS (resolving
/// symlinks); the nonexistent tail is appended with lexical `.`/`..`
/// resolution. A `..` that would climb above the filesystem root is an
/// error rather than being clamped.
fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Ok(resolved);
    }

    // Find the longest existing ancestor.
    let mut existing = path;
    while !existing.exists() {
        existing = existing.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no existing ancestor")
        })?;
    }
    let mut resolved = existing.canonicalize()?;

    // Lexically resolve the nonexistent tail.
    let tail = path
        .strip_prefix(existing)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "ancestor mismatch"))?;
    for component in tail.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "path escapes filesystem root",
                    ));
                }
            }
            Component::Normal(part) => resolved.push(part),
            Component::RootDir | Component::Prefix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "unexpected absolute component in path tail",
                ));
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_inside_root_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();

        let resolved = ensure_contained(Path::new("a.txt"), dir.path()).unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn parent_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_contained(Path::new("../etc/passwd"), dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::SandboxViolation { .. }));
    }

    #[test]
    fn nested_traversal_through_subdir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let err = ensure_contained(Path::new("sub/../../outside.txt"), dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::SandboxViolation { .. }));
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_contained(Path::new("/etc/passwd"), dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::SandboxViolation { .. }));
    }

    #[test]
    fn nonexistent_target_inside_root_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = ensure_contained(Path::new("new/deep/file.rs"), dir.path()).unwrap();
        assert!(resolved.ends_with("new/deep/file.rs"));
        // Pure validation: nothing was created.
        assert!(!dir.path().join("new").exists());
    }

    #[test]
    fn traversal_inside_root_normalizes_without_escaping() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();

        let resolved = ensure_contained(Path::new("sub/../a.txt"), dir.path()).unwrap();
        assert!(resolved.ends_with("a.txt"));
        assert!(!resolved.to_string_lossy().contains(".."));
    }

    #[test]
    fn root_itself_is_contained() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = ensure_contained(Path::new("."), dir.path()).unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }
}
