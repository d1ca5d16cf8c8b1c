//! Chunk model: blank-line segmentation and structural edits.
//!
//! A chunk is a maximal run of non-blank lines — the atomic unit of partial
//! visibility and structural editing. [`model`] owns segmentation and the
//! one-or-two-line previews used for hidden chunks; [`mutate`] owns the
//! [`ChunkSet`](mutate::ChunkSet) with its insert/append/replace/splice
//! operations and ID renumbering.
//!
//! Chunk IDs are a projection of current list order, recomputed after every
//! mutation — never stable identifiers across turns. Callers must re-fetch
//! the chunk list before referencing IDs from a prior response.

pub mod model;
pub mod mutate;

pub use model::{Chunk, join_chunks, shorten, split_chunks};
pub use mutate::ChunkSet;
