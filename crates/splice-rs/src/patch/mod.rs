//! Applying parsed edit commands to disk.
//!
//! Commands are processed strictly in emission order, each target path
//! sandbox-checked first. Failure isolation is per file: a failed patch
//! aborts that file without touching disk, and earlier commands for other
//! files stay applied.

pub mod engine;

pub use engine::{AppliedKind, AppliedReport, PatchEngine};
