//! The ordered file set disclosed to the agent.

use std::path::{Path, PathBuf};

use crate::chunk::split_chunks;

/// A file node in the resolved dependency set.
///
/// Two nodes with the same canonical path are the same node — the resolver
/// deduplicates by canonical path, not by the lexical reference string.
/// Immutable during a resolution pass; visibility is the only field the
/// engine toggles afterwards.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Path relative to the workspace root, as rendered to the agent.
    pub rel: String,
    /// Absolute canonical path.
    pub path: PathBuf,
    /// File content at resolution time.
    pub content: String,
    /// Resolved imports, as root-relative paths in line order.
    pub imports: Vec<String>,
    /// Whether the file's full content is disclosed (vs. chunk previews).
    pub visible: bool,
    /// Chunk indices within this file rendered as previews while the file
    /// itself stays visible.
    pub hidden_chunks: Vec<usize>,
}

/// Ordered mapping from file path to content: what is currently disclosed
/// to the agent.
///
/// Order is the resolver's discovery order — entry file first, then each
/// import depth-first in the order encountered. That order is an external
/// contract: it determines file precedence in the rendered context.
#[derive(Debug, Default, Clone)]
pub struct ContextSet {
    files: Vec<FileNode>,
}

impl ContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file unless a node with the same canonical path exists.
    pub fn push(&mut self, node: FileNode) {
        if !self.files.iter().any(|f| f.path == node.path) {
            self.files.push(node);
        }
    }

    /// Files in discovery order.
    pub fn files(&self) -> &[FileNode] {
        &self.files
    }

    /// The entry file — first in discovery order.
    pub fn entry(&self) -> Option<&FileNode> {
        self.files.first()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.files.iter().any(|f| f.rel == rel)
    }

    pub fn get(&self, rel: &str) -> Option<&FileNode> {
        self.files.iter().find(|f| f.rel == rel)
    }

    /// Remove a file by its rendered path. Returns whether it was present.
    pub fn remove(&mut self, rel: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.rel != rel);
        before != self.files.len()
    }

    /// Toggle a file's visibility by its rendered path. Showing a file
    /// reveals all of its chunks.
    pub fn set_visible(&mut self, rel: &str, visible: bool) -> bool {
        match self.files.iter_mut().find(|f| f.rel == rel) {
            Some(file) => {
                file.visible = visible;
                if visible {
                    file.hidden_chunks.clear();
                }
                true
            }
            None => false,
        }
    }

    /// Toggle one chunk by its rendered ID.
    ///
    /// IDs count chunks across all files in discovery order, matching the
    /// assembler's numbering. Returns whether the ID was in range.
    pub fn set_chunk_visible(&mut self, id: usize, visible: bool) -> bool {
        let mut offset = 0;
        for file in &mut self.files {
            let count = split_chunks(&file.content).len();
            if id < offset + count {
                let local = id - offset;
                if visible {
                    if file.visible {
                        file.hidden_chunks.retain(|c| *c != local);
                    } else {
                        // Revealing one chunk of a hidden file keeps its
                        // siblings as previews.
                        file.visible = true;
                        file.hidden_chunks = (0..count).filter(|c| *c != local).collect();
                    }
                } else if file.visible && !file.hidden_chunks.contains(&local) {
                    file.hidden_chunks.push(local);
                }
                return true;
            }
            offset += count;
        }
        false
    }
}

/// Build a `FileNode` with visibility on (the default disclosure state).
pub(crate) fn file_node(
    rel: impl Into<String>,
    path: impl AsRef<Path>,
    content: impl Into<String>,
    imports: Vec<String>,
) -> FileNode {
    FileNode {
        rel: rel.into(),
        path: path.as_ref().to_path_buf(),
        content: content.into(),
        imports,
        visible: true,
        hidden_chunks: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_deduplicates_by_canonical_path() {
        let mut set = ContextSet::new();
        set.push(file_node("a.c", "/ws/a.c", "one", vec![]));
        set.push(file_node("a-alias.c", "/ws/a.c", "two", vec![]));
        assert_eq!(set.len(), 1);
        assert_eq!(set.files()[0].content, "one");
    }

    #[test]
    fn entry_is_first_in_discovery_order() {
        let mut set = ContextSet::new();
        set.push(file_node("main.c", "/ws/main.c", "", vec![]));
        set.push(file_node("util.c", "/ws/util.c", "", vec![]));
        assert_eq!(set.entry().unwrap().rel, "main.c");
    }

    #[test]
    fn remove_and_contains() {
        let mut set = ContextSet::new();
        set.push(file_node("a.c", "/ws/a.c", "", vec![]));
        assert!(set.contains("a.c"));
        assert!(set.remove("a.c"));
        assert!(!set.contains("a.c"));
        assert!(!set.remove("a.c"));
    }

    #[test]
    fn chunk_ids_map_across_files_in_order() {
        let mut set = ContextSet::new();
        set.push(file_node("a.c", "/ws/a.c", "a0\n\na1", vec![]));
        set.push(file_node("b.c", "/ws/b.c", "b0", vec![]));

        // a.c owns chunks 0 and 1, so 2 is b.c's first chunk.
        assert!(set.set_chunk_visible(2, false));
        assert!(set.files()[0].hidden_chunks.is_empty());
        assert_eq!(set.files()[1].hidden_chunks, vec![0]);
        assert!(!set.set_chunk_visible(3, false));
    }

    #[test]
    fn showing_a_chunk_of_a_hidden_file_keeps_siblings_as_previews() {
        let mut set = ContextSet::new();
        set.push(file_node("a.c", "/ws/a.c", "a0\n\na1\n\na2", vec![]));
        set.set_visible("a.c", false);

        assert!(set.set_chunk_visible(1, true));
        assert!(set.files()[0].visible);
        assert_eq!(set.files()[0].hidden_chunks, vec![0, 2]);
    }

    #[test]
    fn showing_a_file_reveals_its_hidden_chunks() {
        let mut set = ContextSet::new();
        set.push(file_node("a.c", "/ws/a.c", "a0\n\na1", vec![]));
        set.set_chunk_visible(0, false);
        assert!(set.set_visible("a.c", true));
        assert!(set.files()[0].hidden_chunks.is_empty());
    }

    #[test]
    fn set_visible_toggles_only_named_file() {
        let mut set = ContextSet::new();
        set.push(file_node("a.c", "/ws/a.c", "", vec![]));
        set.push(file_node("b.c", "/ws/b.c", "", vec![]));
        assert!(set.set_visible("b.c", false));
        assert!(set.files()[0].visible);
        assert!(!set.files()[1].visible);
        assert!(!set.set_visible("missing.c", true));
    }
}
