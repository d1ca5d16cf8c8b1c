//! Depth-first dependency walking with an explicit visited set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use crate::context::set::{ContextSet, file_node};
use crate::error::EngineError;
use crate::resolver::dialect::DialectSet;
use crate::sandbox::ensure_contained;

/// The outcome of one resolution pass.
#[derive(Debug)]
pub struct Resolution {
    /// Resolved files in discovery order — entry first, then each import
    /// depth-first in the order encountered.
    pub context: ContextSet,
    /// References that matched a marker but could not be resolved to a
    /// readable file inside the root. Opaque strings; the caller decides
    /// whether a gap is fatal.
    pub unresolved: Vec<String>,
}

/// Cycle-safe, depth-unbounded import resolver.
///
/// The visited set is created per [`resolve`](Resolver::resolve) call and
/// threaded through the walk explicitly — never process-wide state — so two
/// resolutions can run concurrently without cross-talk. Sibling import
/// files are read in parallel; results are merged back in discovery order
/// by the single resolver coroutine, which is the only writer to the
/// visited set and context.
pub struct Resolver {
    root: PathBuf,
    dialects: DialectSet,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>, dialects: DialectSet) -> Self {
        Self {
            root: root.into(),
            dialects,
        }
    }

    /// Resolve the transitive import closure of `entry`.
    ///
    /// `content` is the entry's text as the caller wants it disclosed —
    /// typically the file body with any task marker already stripped.
    pub async fn resolve(&self, entry: &Path, content: &str) -> Result<Resolution, EngineError> {
        let root = self.root.canonicalize()?;
        let entry_path = ensure_contained(entry, &root)?;

        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(entry_path.clone());
        let mut context = ContextSet::new();
        let mut unresolved = Vec::new();

        self.visit(
            &root,
            entry_path,
            content.to_string(),
            &mut visited,
            &mut context,
            &mut unresolved,
        )
        .await?;

        // Keep one entry per distinct unresolved reference, first occurrence
        // order preserved.
        let mut seen = HashSet::new();
        unresolved.retain(|r| seen.insert(r.clone()));

        debug!(
            "resolved {} file(s), {} unresolved reference(s)",
            context.len(),
            unresolved.len()
        );
        Ok(Resolution {
            context,
            unresolved,
        })
    }

    fn visit<'a>(
        &'a self,
        root: &'a Path,
        path: PathBuf,
        content: String,
        visited: &'a mut HashSet<PathBuf>,
        context: &'a mut ContextSet,
        unresolved: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            let dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());

            // Scan for markers: one reference per line, first dialect in
            // registration order wins.
            let mut imports = Vec::new();
            let mut pending: Vec<(PathBuf, String)> = Vec::new();
            for line in content.lines() {
                let Some(reference) = self.dialects.match_line(line) else {
                    continue;
                };
                let candidate = dir.join(reference);
                let target = match ensure_contained(&candidate, root) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("import '{reference}' rejected: {e}");
                        unresolved.push(reference.to_string());
                        continue;
                    }
                };
                if !target.is_file() {
                    debug!("import '{reference}' does not resolve to a file");
                    unresolved.push(reference.to_string());
                    continue;
                }
                imports.push(rel_of(&target, root));
                if !visited.contains(&target) && !pending.iter().any(|(t, _)| t == &target) {
                    pending.push((target, reference.to_string()));
                }
            }

            // Record this node before descending: entry first, then each
            // import depth-first in the order encountered.
            context.push(file_node(rel_of(&path, root), &path, content, imports));

            // Speculative parallel reads. A file is claimed into the
            // visited set only when its visit starts, so a shared import
            // is emitted at its first depth-first position; a sibling's
            // subtree reaching it first discards this read below.
            let reads = join_all(
                pending
                    .iter()
                    .map(|(target, _)| tokio::fs::read_to_string(target.clone())),
            )
            .await;

            for ((target, reference), read) in pending.into_iter().zip(reads) {
                if visited.contains(&target) {
                    continue;
                }
                match read {
                    Ok(child_content) => {
                        visited.insert(target.clone());
                        self.visit(root, target, child_content, visited, context, unresolved)
                            .await?;
                    }
                    Err(e) => {
                        warn!("import '{reference}' unreadable: {e}");
                        unresolved.push(reference);
                    }
                }
            }
            Ok(())
        })
    }
}

/// Root-relative rendering of a canonical path, with forward slashes.
fn rel_of(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn resolver(root: &Path) -> Resolver {
        Resolver::new(root, DialectSet::common())
    }

    #[tokio::test]
    async fn resolves_transitive_chain_in_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./b.c//\nbody a");
        write(dir.path(), "b.c", "//./c.c//\nbody b");
        write(dir.path(), "c.c", "body c");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();

        let rels: Vec<&str> = res.context.files().iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["a.c", "b.c", "c.c"]);
        assert!(res.unresolved.is_empty());
    }

    #[tokio::test]
    async fn cyclic_imports_terminate_with_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./b.c//\nbody a");
        write(dir.path(), "b.c", "//./a.c//\nbody b");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();

        let rels: Vec<&str> = res.context.files().iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["a.c", "b.c"]);
    }

    #[tokio::test]
    async fn diamond_dependency_is_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./b.c//\n//./c.c//");
        write(dir.path(), "b.c", "//./c.c//\nbody b");
        write(dir.path(), "c.c", "body c");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();
        assert_eq!(res.context.len(), 3);
    }

    #[tokio::test]
    async fn shared_import_is_emitted_at_its_depth_first_position() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./b.c//\n//./c.c//");
        write(dir.path(), "b.c", "//./c.c//\n//./d.c//\nbody b");
        write(dir.path(), "c.c", "body c");
        write(dir.path(), "d.c", "body d");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();

        // c.c is referenced by both a.c and b.c; the walk reaches it first
        // inside b.c, so it lands there, before d.c.
        let rels: Vec<&str> = res.context.files().iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["a.c", "b.c", "c.c", "d.c"]);
    }

    #[tokio::test]
    async fn missing_import_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./gone.c//\n//./b.c//");
        write(dir.path(), "b.c", "body b");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();

        assert_eq!(res.unresolved, vec!["./gone.c"]);
        assert!(res.context.contains("b.c"));
    }

    #[tokio::test]
    async fn escaping_import_is_recorded_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//../../etc/passwd//\nbody");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();

        assert_eq!(res.unresolved, vec!["../../etc/passwd"]);
        assert_eq!(res.context.len(), 1);
    }

    #[tokio::test]
    async fn multiple_dialects_coexist_in_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./b.c//\n{-./c.c-}\n#./d.c#");
        write(dir.path(), "b.c", "b");
        write(dir.path(), "c.c", "c");
        write(dir.path(), "d.c", "d");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();
        assert_eq!(res.context.len(), 4);
    }

    #[tokio::test]
    async fn imports_resolve_relative_to_referencing_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "src/a.c", "//./sub/b.c//");
        write(dir.path(), "src/sub/b.c", "//../c.c//");
        write(dir.path(), "src/c.c", "body c");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();

        let rels: Vec<&str> = res.context.files().iter().map(|f| f.rel.as_str()).collect();
        assert_eq!(rels, vec!["src/a.c", "src/sub/b.c", "src/c.c"]);
    }

    #[tokio::test]
    async fn entry_content_is_taken_from_caller_not_disk() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "on disk");

        let res = resolver(dir.path()).resolve(&a, "caller body").await.unwrap();
        assert_eq!(res.context.entry().unwrap().content, "caller body");
    }

    #[tokio::test]
    async fn sequential_resolutions_do_not_share_state() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./b.c//");
        write(dir.path(), "b.c", "body b");

        let r = resolver(dir.path());
        let content = std::fs::read_to_string(&a).unwrap();
        let first = r.resolve(&a, &content).await.unwrap();
        let second = r.resolve(&a, &content).await.unwrap();
        // A shared visited set would make the second pass see b.c as
        // already resolved and skip it.
        assert_eq!(first.context.len(), second.context.len());
    }

    #[tokio::test]
    async fn import_lists_record_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.c", "//./z.c//\n//./b.c//");
        write(dir.path(), "z.c", "z");
        write(dir.path(), "b.c", "b");

        let content = std::fs::read_to_string(&a).unwrap();
        let res = resolver(dir.path()).resolve(&a, &content).await.unwrap();
        assert_eq!(res.context.entry().unwrap().imports, vec!["z.c", "b.c"]);
    }
}
