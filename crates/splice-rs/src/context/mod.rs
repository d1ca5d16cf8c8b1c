//! Context disclosure: the file set shown to the agent, its rendering,
//! and the optional compaction pre-pass.
//!
//! A [`ContextSet`] is the ordered subset of the dependency graph currently
//! disclosed to the agent, created fresh per top-level task and discarded
//! when the task concludes. [`assembler`] renders it into a single textual
//! block with visibility markers; [`compaction`] asks a cheaper agent
//! invocation to mark irrelevant files for exclusion when the rendered
//! size exceeds a token budget.

pub mod assembler;
pub mod compaction;
pub mod set;

pub use assembler::render;
pub use compaction::{CompactionConfig, compact, estimate_tokens};
pub use set::{ContextSet, FileNode};
