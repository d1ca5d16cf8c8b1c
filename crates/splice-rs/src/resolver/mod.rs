//! Transitive, cycle-safe import resolution.
//!
//! Files reference each other through line-oriented import markers — a line
//! that is entirely `comment-open + relative-path + comment-close` in one
//! of the registered [`MarkerDialect`](dialect::MarkerDialect)s. The
//! [`Resolver`](resolve::Resolver) walks these references depth-first from
//! a seed file, deduplicating by canonical path, and produces the ordered
//! [`ContextSet`](crate::context::ContextSet) disclosed to the agent.
//!
//! Unresolvable references are recorded as opaque strings on the
//! [`Resolution`](resolve::Resolution), never treated as errors — the
//! caller decides whether a gap is fatal.

pub mod dialect;
pub mod resolve;

pub use dialect::{DialectSet, MarkerDialect, TASK_MARKERS, split_task};
pub use resolve::{Resolution, Resolver};
