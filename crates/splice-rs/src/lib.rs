//! Context assembly and structured edit application for LLM coding agents.
//!
//! `splice-rs` turns a seed source file into an edited workspace. It reads
//! the seed, follows its import markers to build a dependency context,
//! hands the rendered context plus a task to an LLM, parses the reply into
//! a closed set of edit commands, and applies them to disk inside a
//! sandboxed root.
//!
//! The core abstraction is the [`Engine`](engine::Engine) — one call to
//! [`run_task()`](engine::Engine::run_task) performs the whole loop:
//! resolve, compact, ask, parse, apply.
//!
//! # Getting started
//!
//! ```ignore
//! use std::path::Path;
//! use splice_rs::{Engine, EngineConfig, OpenRouterAgent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let agent = OpenRouterAgent::from_env()?;
//!
//!     let config = EngineConfig::default()
//!         .with_model("anthropic/claude-sonnet-4")
//!         .with_history_dir(".splice-history");
//!
//!     let engine = Engine::new(".", Box::new(agent), config);
//!     let outcome = engine
//!         .run_task(Path::new("src/main.c"), None)
//!         .await
//!         .map_err(|e| e.to_string())?;
//!
//!     println!("{} command(s) applied", outcome.applied);
//!     Ok(())
//! }
//! ```
//!
//! The seed file carries its own instruction as an end-of-body task
//! marker (`//!`, `--!`, or `##!`); everything before the marker is the
//! file body, everything after is the task.
//!
//! # Where to find things
//!
//! If you're looking for how to...
//!
//! - **Follow imports:** see [`Resolver`](resolver::Resolver) and the
//!   [`MarkerDialect`](resolver::MarkerDialect)s it recognizes
//!   (`//./file//`, `{-./file-}`, `#./file#`).
//! - **Render context for the agent:** see [`context::render`] and
//!   [`ContextSet`](context::ContextSet); hidden files render as chunk
//!   previews via [`chunk::shorten`].
//! - **Control token spend:** see [`context::compact`], which asks a
//!   cheaper model to drop task-irrelevant files once the rendered
//!   context overruns [`EngineConfig::token_budget`](engine::EngineConfig).
//! - **Parse agent replies:** see [`command::parse_commands`] and the
//!   grammar documented on [`command`].
//! - **Apply edits to disk:** see [`PatchEngine`](patch::PatchEngine);
//!   every target path passes [`sandbox::ensure_contained`] first.
//! - **Edit chunk-by-chunk:** see [`ChunkSet`](chunk::ChunkSet) for
//!   structural edits with dense, renumbered chunk IDs.
//! - **Swap the model vendor:** implement
//!   [`AgentCapability`](api::AgentCapability); the engine consumes only
//!   final text.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`engine`] | [`Engine`](engine::Engine) task loop and [`EngineConfig`](engine::EngineConfig) |
//! | [`resolver`] | Marker dialects, task splitting, cycle-safe import resolution |
//! | [`context`] | [`ContextSet`](context::ContextSet), rendering, compaction |
//! | [`chunk`] | Blank-line chunk model and structural mutations |
//! | [`command`] | Tolerant parser for the agent's edit command grammar |
//! | [`patch`] | Sandboxed `WRITE`/`PATCH`/`REMOVE` application |
//! | [`api`] | [`AgentCapability`](api::AgentCapability) seam, OpenRouter client, scripted test double |
//! | [`sandbox`] | Path containment checks |
//! | [`session`] | Prompt/response transcripts |
//! | [`error`] | [`EngineError`](error::EngineError) taxonomy |

pub mod api;
pub mod chunk;
pub mod command;
pub mod context;
pub mod engine;
pub mod error;
pub mod patch;
pub mod resolver;
pub mod sandbox;
pub mod session;

pub use api::{AgentCapability, AskOptions, OpenRouterAgent, ScriptedAgent};
pub use chunk::ChunkSet;
pub use command::{EditCommand, parse_commands};
pub use context::ContextSet;
pub use engine::{Engine, EngineConfig, TaskOutcome};
pub use error::EngineError;
pub use patch::PatchEngine;
pub use resolver::{DialectSet, MarkerDialect, Resolver};
pub use session::SessionLog;

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for edit and compaction calls.
pub const DEFAULT_MODEL: &str = "z-ai/glm-5";

/// Default rendered-context budget before compaction kicks in.
pub const DEFAULT_TOKEN_BUDGET: u64 = 24_000;
