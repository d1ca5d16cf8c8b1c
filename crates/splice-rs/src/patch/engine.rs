//! The disk-side half of the edit loop.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::command::EditCommand;
use crate::error::EngineError;
use crate::sandbox::ensure_contained;

/// What a successfully applied command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedKind {
    Wrote,
    Patched { ops: usize },
    Removed,
}

/// Per-command outcome. One report per disk-touching command, in emission
/// order; visibility commands produce no report.
#[derive(Debug)]
pub struct AppliedReport {
    pub path: String,
    pub result: Result<AppliedKind, EngineError>,
}

/// Applies `WRITE` / `PATCH` / `REMOVE` commands under a sandbox root.
pub struct PatchEngine {
    root: PathBuf,
}

impl PatchEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Apply commands strictly in emission order.
    ///
    /// A failed command is reported and skipped; it never rolls back
    /// earlier commands or blocks later ones. Visibility and compaction
    /// commands are not disk operations and are passed over here.
    pub fn apply(&self, commands: &[EditCommand]) -> Vec<AppliedReport> {
        let mut reports = Vec::new();
        for command in commands {
            let (path, result) = match command {
                EditCommand::Write { path, content } => (path, self.write(path, content)),
                EditCommand::Patch { path, ops } => (path, self.patch(path, ops)),
                EditCommand::Remove { path } => (path, self.remove(path)),
                EditCommand::Show { .. } | EditCommand::Hide { .. } | EditCommand::Omit { .. } => {
                    continue;
                }
            };
            if let Err(e) = &result {
                warn!("command for '{path}' failed: {e}");
            }
            reports.push(AppliedReport {
                path: path.clone(),
                result,
            });
        }
        reports
    }

    fn write(&self, path: &str, content: &str) -> Result<AppliedKind, EngineError> {
        let target = ensure_contained(Path::new(path), &self.root)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = trim_blank_runs(content);
        // An overwritten file keeps its newline style even when the agent
        // emitted the other one.
        let styled = match fs::read_to_string(&target) {
            Ok(existing) if uses_crlf(&existing) => to_crlf(&to_lf(body)),
            _ => to_lf(body),
        };
        fs::write(&target, styled)?;
        debug!("wrote {}", target.display());
        Ok(AppliedKind::Wrote)
    }

    fn patch(
        &self,
        path: &str,
        ops: &[crate::command::SearchReplace],
    ) -> Result<AppliedKind, EngineError> {
        let target = ensure_contained(Path::new(path), &self.root)?;
        let original = fs::read_to_string(&target)?;
        let crlf = uses_crlf(&original);

        // Matching is newline-normalized; nothing reaches disk until every
        // operation has landed.
        let mut content = to_lf(&original);
        for op in ops {
            let search = to_lf(&op.search);
            let replace = to_lf(&op.replace);
            if search.is_empty() {
                return Err(EngineError::search_not_found(path, &search));
            }
            let Some(start) = content.find(&search) else {
                return Err(EngineError::search_not_found(path, &search));
            };
            content.replace_range(start..start + search.len(), &replace);
        }

        let styled = if crlf { to_crlf(&content) } else { content };
        fs::write(&target, styled)?;
        debug!("patched {} ({} op(s))", target.display(), ops.len());
        Ok(AppliedKind::Patched { ops: ops.len() })
    }

    fn remove(&self, path: &str) -> Result<AppliedKind, EngineError> {
        let target = ensure_contained(Path::new(path), &self.root)?;
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        } else {
            fs::remove_file(&target)?;
        }
        debug!("removed {}", target.display());
        Ok(AppliedKind::Removed)
    }
}

/// Drop the leading and trailing runs of blank lines, keeping interior
/// blank lines intact.
fn trim_blank_runs(content: &str) -> &str {
    let mut s = content;
    while let Some(idx) = s.find('\n') {
        let (line, rest) = s.split_at(idx);
        if !line.trim().is_empty() {
            break;
        }
        let (_, rest) = rest.split_at(1);
        s = rest;
    }
    while let Some(idx) = s.rfind('\n') {
        let (rest, line) = s.split_at(idx);
        if !line.trim().is_empty() {
            break;
        }
        s = rest;
    }
    s
}

fn uses_crlf(content: &str) -> bool {
    content.contains("\r\n")
}

fn to_lf(content: &str) -> String {
    content.replace("\r\n", "\n")
}

fn to_crlf(content: &str) -> String {
    to_lf(content).replace('\n', "\r\n")
}
