//! Structural chunk edits with ID renumbering.
//!
//! [`ChunkSet`] holds every chunk of a file set in document order and
//! supports the four structural edits (`edit`, `insert`, `append`,
//! `splice`). After every mutation the whole set is renumbered so IDs stay
//! dense, 0-based, and contiguous — the ephemeral-ID contract from the
//! module docs. Saving rejoins each file's chunks with single blank lines
//! and overwrites the file in place, through the sandbox guard.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::chunk::model::{Chunk, join_chunks, split_chunks};
use crate::error::EngineError;
use crate::sandbox::ensure_contained;

/// A file participating in a chunk set.
#[derive(Debug, Clone)]
pub struct ChunkFile {
    /// Path relative to the workspace root, as rendered to the agent.
    pub rel: String,
    /// Absolute canonical path for saving.
    pub path: PathBuf,
}

/// All chunks of a file set, in document order, with dense IDs.
#[derive(Debug, Default)]
pub struct ChunkSet {
    files: Vec<ChunkFile>,
    chunks: Vec<Chunk>,
}

impl ChunkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, chunking its content and appending its chunks after any
    /// existing ones. New chunks are visible.
    pub fn add_file(&mut self, rel: impl Into<String>, path: impl Into<PathBuf>, content: &str) {
        let file_idx = self.files.len();
        self.files.push(ChunkFile {
            rel: rel.into(),
            path: path.into(),
        });
        for text in split_chunks(content) {
            self.chunks.push(Chunk {
                id: 0, // assigned by renumber below
                file: file_idx,
                text,
                visible: true,
            });
        }
        self.renumber();
    }

    /// All chunks in document order. IDs equal positions.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The participating files, in the order they were added.
    pub fn files(&self) -> &[ChunkFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Toggle a chunk's visibility by ID.
    pub fn set_visible(&mut self, id: usize, visible: bool) -> Result<(), EngineError> {
        let chunk = self
            .chunks
            .get_mut(id)
            .ok_or_else(|| EngineError::malformed(format!("chunk id {id} out of range")))?;
        chunk.visible = visible;
        Ok(())
    }

    /// Replace chunk `i` with the given texts (count may change).
    pub fn edit(&mut self, i: usize, texts: Vec<String>) -> Result<(), EngineError> {
        self.splice(i..=i, texts)
    }

    /// Insert the given texts before chunk `i`.
    pub fn insert(&mut self, i: usize, texts: Vec<String>) -> Result<(), EngineError> {
        self.check_index(i)?;
        let file = self.chunks[i].file;
        let new: Vec<Chunk> = Self::make_chunks(file, texts);
        self.chunks.splice(i..i, new);
        self.renumber();
        Ok(())
    }

    /// Insert the given texts after chunk `i`.
    pub fn append(&mut self, i: usize, texts: Vec<String>) -> Result<(), EngineError> {
        self.check_index(i)?;
        let file = self.chunks[i].file;
        let new: Vec<Chunk> = Self::make_chunks(file, texts);
        self.chunks.splice(i + 1..i + 1, new);
        self.renumber();
        Ok(())
    }

    /// Replace the inclusive range `i..=j` with the given texts.
    ///
    /// The range must lie within a single file; chunks of other files are
    /// untouched and keep their relative order.
    pub fn splice(
        &mut self,
        range: RangeInclusive<usize>,
        texts: Vec<String>,
    ) -> Result<(), EngineError> {
        let (i, j) = (*range.start(), *range.end());
        self.check_index(i)?;
        self.check_index(j)?;
        if i > j {
            return Err(EngineError::malformed(format!(
                "splice range {i}..={j} is inverted"
            )));
        }
        if self.chunks[i].file != self.chunks[j].file {
            return Err(EngineError::malformed(format!(
                "splice range {i}..={j} spans multiple files"
            )));
        }
        let file = self.chunks[i].file;
        let new: Vec<Chunk> = Self::make_chunks(file, texts);
        self.chunks.splice(i..=j, new);
        self.renumber();
        Ok(())
    }

    /// Rejoin a file's chunks (in current order) with single blank lines.
    pub fn render_file(&self, file: usize) -> String {
        let texts: Vec<&str> = self
            .chunks
            .iter()
            .filter(|c| c.file == file)
            .map(|c| c.text.as_str())
            .collect();
        join_chunks(&texts)
    }

    /// Persist every file by rejoining its chunks and overwriting in place.
    ///
    /// Each target passes through the sandbox guard before writing.
    pub fn save(&self, root: &Path) -> Result<Vec<PathBuf>, EngineError> {
        let mut written = Vec::with_capacity(self.files.len());
        for (idx, file) in self.files.iter().enumerate() {
            let target = ensure_contained(&file.path, root)?;
            std::fs::write(&target, self.render_file(idx))?;
            debug!("saved {} ({} chunks)", file.rel, self.file_chunk_count(idx));
            written.push(target);
        }
        Ok(written)
    }

    fn file_chunk_count(&self, file: usize) -> usize {
        self.chunks.iter().filter(|c| c.file == file).count()
    }

    fn check_index(&self, i: usize) -> Result<(), EngineError> {
        if i >= self.chunks.len() {
            return Err(EngineError::malformed(format!(
                "chunk index {i} out of range (len {})",
                self.chunks.len()
            )));
        }
        Ok(())
    }

    fn make_chunks(file: usize, texts: Vec<String>) -> Vec<Chunk> {
        // Replacement texts may themselves contain blank lines; re-split so
        // the one-chunk-per-blank-boundary invariant holds.
        texts
            .iter()
            .flat_map(|t| split_chunks(t))
            .map(|text| Chunk {
                id: 0,
                file,
                text,
                visible: true,
            })
            .collect()
    }

    /// Reassign IDs as a projection of current list order.
    fn renumber(&mut self) {
        for (i, chunk) in self.chunks.iter_mut().enumerate() {
            chunk.id = i;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_file_set() -> ChunkSet {
        let mut set = ChunkSet::new();
        set.add_file("a.c", "/ws/a.c", "a0\n\na1\n\na2");
        set.add_file("b.c", "/ws/b.c", "b0\n\nb1");
        set
    }

    fn assert_dense_ids(set: &ChunkSet) {
        for (i, chunk) in set.chunks().iter().enumerate() {
            assert_eq!(chunk.id, i, "IDs must be dense and ordered");
        }
    }

    #[test]
    fn ids_are_dense_after_construction() {
        let set = two_file_set();
        assert_eq!(set.len(), 5);
        assert_dense_ids(&set);
    }

    #[test]
    fn edit_replaces_one_chunk_with_many() {
        let mut set = two_file_set();
        set.edit(1, vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(set.len(), 6);
        assert_eq!(set.chunks()[1].text, "x");
        assert_eq!(set.chunks()[2].text, "y");
        assert_eq!(set.chunks()[3].text, "a2");
        assert_dense_ids(&set);
    }

    #[test]
    fn insert_places_before_index() {
        let mut set = two_file_set();
        set.insert(0, vec!["pre".into()]).unwrap();
        assert_eq!(set.chunks()[0].text, "pre");
        assert_eq!(set.chunks()[1].text, "a0");
        assert_dense_ids(&set);
    }

    #[test]
    fn append_places_after_index() {
        let mut set = two_file_set();
        set.append(2, vec!["post".into()]).unwrap();
        assert_eq!(set.chunks()[2].text, "a2");
        assert_eq!(set.chunks()[3].text, "post");
        assert_eq!(set.chunks()[3].file, 0, "appended chunk joins the same file");
        assert_dense_ids(&set);
    }

    #[test]
    fn splice_replaces_inclusive_range() {
        let mut set = two_file_set();
        set.splice(0..=2, vec!["merged".into()]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.chunks()[0].text, "merged");
        assert_eq!(set.chunks()[1].text, "b0");
        assert_dense_ids(&set);
    }

    #[test]
    fn splice_across_files_is_rejected() {
        let mut set = two_file_set();
        let err = set.splice(2..=3, vec!["x".into()]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedCommand { .. }));
    }

    #[test]
    fn other_files_keep_relative_order() {
        let mut set = two_file_set();
        set.edit(0, vec!["changed".into()]).unwrap();
        let b_chunks: Vec<&str> = set
            .chunks()
            .iter()
            .filter(|c| c.file == 1)
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(b_chunks, vec!["b0", "b1"]);
    }

    #[test]
    fn new_chunks_are_visible() {
        let mut set = two_file_set();
        set.set_visible(1, false).unwrap();
        set.edit(1, vec!["fresh".into()]).unwrap();
        assert!(set.chunks()[1].visible);
    }

    #[test]
    fn replacement_text_with_blank_lines_is_resplit() {
        let mut set = two_file_set();
        set.edit(0, vec!["one\n\ntwo".into()]).unwrap();
        assert_eq!(set.chunks()[0].text, "one");
        assert_eq!(set.chunks()[1].text, "two");
        assert_dense_ids(&set);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut set = two_file_set();
        assert!(set.edit(99, vec!["x".into()]).is_err());
        assert!(set.insert(99, vec!["x".into()]).is_err());
        assert!(set.set_visible(99, true).is_err());
    }

    #[test]
    fn render_file_rejoins_with_blank_lines() {
        let set = two_file_set();
        assert_eq!(set.render_file(0), "a0\n\na1\n\na2");
        assert_eq!(set.render_file(1), "b0\n\nb1");
    }

    #[test]
    fn save_overwrites_files_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.c");
        std::fs::write(&a, "a0\n\na1").unwrap();

        let mut set = ChunkSet::new();
        set.add_file("a.c", &a, "a0\n\na1");
        set.edit(1, vec!["a1 changed".into()]).unwrap();
        set.save(dir.path()).unwrap();

        assert_eq!(std::fs::read_to_string(&a).unwrap(), "a0\n\na1 changed");
    }

    #[test]
    fn save_refuses_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let outside = other.path().join("x.c");
        std::fs::write(&outside, "x").unwrap();

        let mut set = ChunkSet::new();
        set.add_file("x.c", &outside, "x");
        let err = set.save(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::SandboxViolation { .. }));
        assert_eq!(std::fs::read_to_string(&outside).unwrap(), "x");
    }
}
