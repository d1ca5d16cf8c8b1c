//! Budget-driven context compaction.
//!
//! When the rendered context overruns the token budget and more than one
//! file is present, a cheap agent call is asked which files matter for the
//! task; files it marks with `<omit file="..."/>` are dropped from the
//! set. The entry file is never dropped. Compaction is strictly an
//! optimization: skipping it changes token cost, never the final result.

use tracing::{debug, warn};

use crate::api::{AgentCapability, AskOptions};
use crate::command::{EditCommand, parse_commands};
use crate::context::assembler::render;
use crate::context::set::ContextSet;
use crate::error::EngineError;

/// Rough chars-per-token ratio for budget estimation.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

const RELEVANCE_PROMPT: &str = "\
You are pruning context for a code-editing task. For each file below, decide \
whether it is relevant to the task. For every file that is NOT needed, emit \
one directive on its own line:

<omit file=\"path/as/rendered\"/>

Emit nothing for files that should stay. Do not emit any other commands.";

/// Estimate the token cost of a rendered context.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as f64 / DEFAULT_CHARS_PER_TOKEN).ceil() as u64
}

#[derive(Debug, Clone)]
pub struct CompactionConfig {
    /// Budget above which the relevance pass runs.
    pub token_budget: u64,
    /// Model for the relevance call; cheaper than the edit model.
    pub model: String,
}

/// Drop task-irrelevant files from the context. Returns how many files
/// were removed.
///
/// A failed relevance call is logged and skipped; the engine proceeds
/// with the uncompacted context rather than failing the task.
pub async fn compact(
    context: &mut ContextSet,
    task: &str,
    agent: &dyn AgentCapability,
    config: &CompactionConfig,
) -> Result<usize, EngineError> {
    if context.len() <= 1 {
        return Ok(0);
    }
    let rendered = render(context);
    let estimate = estimate_tokens(&rendered);
    if estimate <= config.token_budget {
        debug!(
            "context fits budget ({estimate} <= {} tokens), skipping compaction",
            config.token_budget
        );
        return Ok(0);
    }

    let prompt = format!("{RELEVANCE_PROMPT}\n\nTask:\n{task}\n\nContext:\n{rendered}");
    let options = AskOptions {
        model: Some(config.model.clone()),
        temperature: Some(0.0),
        max_tokens: Some(1024),
        ..Default::default()
    };
    let response = match agent.ask(&prompt, &options).await {
        Ok(r) => r,
        Err(e) => {
            warn!("compaction call failed, keeping full context: {e}");
            return Ok(0);
        }
    };

    let entry = context.entry().map(|f| f.rel.clone());
    let mut removed = 0;
    for command in parse_commands(&response).commands {
        let EditCommand::Omit { path } = command else {
            warn!("compaction response carried a non-omit command, ignoring");
            continue;
        };
        if entry.as_deref() == Some(path.as_str()) {
            warn!("refusing to omit the entry file '{path}'");
            continue;
        }
        if context.remove(&path) {
            debug!("omitted '{path}'");
            removed += 1;
        } else {
            warn!("omit named unknown file '{path}'");
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ScriptedAgent;
    use crate::context::set::file_node;

    fn set_of(files: &[(&str, &str)]) -> ContextSet {
        let mut set = ContextSet::new();
        for (rel, content) in files {
            set.push(file_node(*rel, format!("/ws/{rel}"), *content, vec![]));
        }
        set
    }

    fn tight() -> CompactionConfig {
        CompactionConfig {
            token_budget: 1,
            model: "cheap".into(),
        }
    }

    #[tokio::test]
    async fn under_budget_skips_the_agent_entirely() {
        let mut set = set_of(&[("a.c", "x"), ("b.c", "y")]);
        let agent = ScriptedAgent::new(["<omit file=\"b.c\"/>"]);
        let config = CompactionConfig {
            token_budget: 1_000_000,
            model: "cheap".into(),
        };

        let removed = compact(&mut set, "task", &agent, &config).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(set.len(), 2);
        assert_eq!(agent.remaining(), 1);
    }

    #[tokio::test]
    async fn single_file_context_is_never_compacted() {
        let mut set = set_of(&[("a.c", "x".repeat(10_000).as_str())]);
        let agent = ScriptedAgent::default();
        let removed = compact(&mut set, "task", &agent, &tight()).await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn omitted_files_are_removed_except_the_entry() {
        let mut set = set_of(&[("main.c", "entry"), ("a.c", "aaa"), ("b.c", "bbb")]);
        let agent =
            ScriptedAgent::new(["<omit file=\"main.c\"/>\n<omit file=\"b.c\"/>"]);

        let removed = compact(&mut set, "task", &agent, &tight()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(set.contains("main.c"));
        assert!(set.contains("a.c"));
        assert!(!set.contains("b.c"));
    }

    #[tokio::test]
    async fn failed_relevance_call_keeps_the_full_context() {
        let mut set = set_of(&[("main.c", "entry"), ("a.c", "aaa")]);
        let agent = ScriptedAgent::default();

        let removed = compact(&mut set, "task", &agent, &tight()).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn non_omit_commands_in_the_response_are_ignored() {
        let mut set = set_of(&[("main.c", "entry"), ("a.c", "aaa")]);
        let agent = ScriptedAgent::new(["<REMOVE path=\"a.c\"/>"]);

        let removed = compact(&mut set, "task", &agent, &tight()).await.unwrap();
        assert_eq!(removed, 0);
        assert!(set.contains("a.c"));
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 2);
    }
}
