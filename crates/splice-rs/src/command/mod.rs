//! The agent-facing edit command grammar.
//!
//! Agent responses are free prose with tag-like commands embedded in them:
//!
//! ```text
//! <SHOW path="..."/>              reveal a file or chunk
//! <HIDE path="..."/>              hide a file or chunk
//! <WRITE path="...">...</WRITE>   whole-file create/overwrite
//! <PATCH path="...">
//! <<<<<<< SEARCH
//! ...
//! =======
//! ...
//! >>>>>>> REPLACE
//! </PATCH>                        ordered search/replace operations
//! <REMOVE path="..."/>            delete a file or directory
//! <omit file="..."/>              compaction-stage exclusion
//! ```
//!
//! Parsing is tolerant by design: models pad commands with prose, misspell
//! tags, and drop attributes. Anything that does not parse as a known
//! command is skipped with a warning; only what parses cleanly reaches the
//! patch engine.

pub mod parser;

pub use parser::{EditCommand, ParseOutcome, SearchReplace, parse_commands};
