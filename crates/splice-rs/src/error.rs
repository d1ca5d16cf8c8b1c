//! Engine error taxonomy.
//!
//! Errors fall into two propagation classes. Validation errors
//! ([`EngineError::SandboxViolation`], [`EngineError::SearchNotFound`],
//! [`EngineError::MalformedCommand`]) are caught at command dispatch and
//! abort only the offending command — sibling commands in the same batch
//! still run. IO errors propagate to the top and terminate the current
//! task, since partial disk state may need manual inspection.
//!
//! Unresolved imports are deliberately *not* an error variant: the resolver
//! records them as opaque reference strings on the
//! [`Resolution`](crate::resolver::Resolution) and lets the caller decide
//! whether a gap is fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the context-assembly and edit-application engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A path canonicalized to a location outside the workspace root.
    ///
    /// Fatal for the offending command only; never silently clamped.
    #[error("path escapes the workspace root: {}", path.display())]
    SandboxViolation { path: PathBuf },

    /// A patch operation's search text was not found in the target file.
    ///
    /// Aborts the whole patch for that file — nothing is written to disk.
    /// An empty search string always produces this error; it is never
    /// interpreted as "insert at start of file".
    #[error("search text not found in {file}: {snippet}")]
    SearchNotFound { file: String, snippet: String },

    /// A command was missing a required attribute or had an unbalanced tag.
    ///
    /// The command is skipped with a warning; the batch continues.
    #[error("malformed command: {reason}")]
    MalformedCommand { reason: String },

    /// The agent response contained no recognized command.
    ///
    /// Fatal for the task: there is nothing to apply.
    #[error("agent response contained no recognized command")]
    NoCommandsFound,

    /// The external agent capability failed (network, backend, empty reply).
    #[error("agent call failed: {0}")]
    Agent(String),

    /// Filesystem failure (permissions, disk full, missing file).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Build a [`EngineError::SearchNotFound`] with a bounded snippet of the
    /// missing search text, so error messages stay one line.
    pub fn search_not_found(file: impl Into<String>, search: &str) -> Self {
        let snippet = if search.is_empty() {
            "(empty search)".to_string()
        } else {
            let one_line = search.replace('\n', "\\n");
            let mut s: String = one_line.chars().take(60).collect();
            if one_line.chars().count() > 60 {
                s.push('…');
            }
            format!("{s:?}")
        };
        Self::SearchNotFound {
            file: file.into(),
            snippet,
        }
    }

    /// Build a [`EngineError::MalformedCommand`] from any displayable reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedCommand {
            reason: reason.into(),
        }
    }
}
