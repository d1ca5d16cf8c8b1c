//! The task loop: resolve, compact, ask, parse, apply.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::api::{AgentCapability, AskOptions};
use crate::command::{EditCommand, parse_commands};
use crate::context::{CompactionConfig, compact, render};
use crate::error::EngineError;
use crate::patch::PatchEngine;
use crate::resolver::{DialectSet, Resolver, split_task};
use crate::sandbox::ensure_contained;
use crate::session::SessionLog;
use crate::{DEFAULT_MODEL, DEFAULT_TOKEN_BUDGET};

const SYSTEM_PROMPT: &str = "\
You are a code editor operating on the files disclosed below. Reply with \
edit commands, any prose outside them is ignored:

<SHOW path=\"...\"/>              reveal a file or chunk
<HIDE path=\"...\"/>              hide a file or chunk
<WRITE path=\"...\">...</WRITE>   whole-file create/overwrite
<PATCH path=\"...\">
<<<<<<< SEARCH
exact existing text
=======
replacement text
>>>>>>> REPLACE
</PATCH>
<REMOVE path=\"...\"/>            delete a file or directory

Search text must match the file exactly, whitespace included. Multiple \
SEARCH/REPLACE blocks in one PATCH apply in order, each seeing the \
previous one's result. Paths are relative to the workspace root.";

/// Engine tuning. Every field has a serviceable default; builders override
/// per invocation.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model for the edit call.
    pub model: String,
    /// Model for the compaction relevance call.
    pub compaction_model: String,
    /// Token budget above which compaction runs.
    pub token_budget: u64,
    /// Completion cap for the edit call.
    pub max_tokens: u32,
    pub temperature: f32,
    /// Import-marker dialects, in precedence order.
    pub dialects: DialectSet,
    /// Where to persist prompt/response transcripts. `None` disables the
    /// session log.
    pub history_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            compaction_model: DEFAULT_MODEL.to_string(),
            token_budget: DEFAULT_TOKEN_BUDGET,
            max_tokens: 16_384,
            temperature: 0.3,
            dialects: DialectSet::common(),
            history_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_compaction_model(mut self, model: impl Into<String>) -> Self {
        self.compaction_model = model.into();
        self
    }

    pub fn with_token_budget(mut self, budget: u64) -> Self {
        self.token_budget = budget;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_dialects(mut self, dialects: DialectSet) -> Self {
        self.dialects = dialects;
        self
    }

    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history_dir = Some(dir.into());
        self
    }
}

/// What one task run accomplished.
#[derive(Debug, Default)]
pub struct TaskOutcome {
    /// Commands applied successfully.
    pub applied: usize,
    /// Commands that failed or were skipped, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Import references that did not resolve.
    pub unresolved: Vec<String>,
}

/// One engine per workspace root. Holds the agent capability and config;
/// each [`run_task`](Engine::run_task) call builds its context fresh.
pub struct Engine {
    root: PathBuf,
    agent: Box<dyn AgentCapability>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        root: impl Into<PathBuf>,
        agent: Box<dyn AgentCapability>,
        config: EngineConfig,
    ) -> Self {
        Self {
            root: root.into(),
            agent,
            config,
        }
    }

    /// Run one task from a seed file.
    ///
    /// The seed's task comes from its end-of-body task marker, unless
    /// `task_override` supplies one. A seed with neither is an error.
    pub async fn run_task(
        &self,
        seed: &Path,
        task_override: Option<&str>,
    ) -> Result<TaskOutcome, EngineError> {
        let seed = ensure_contained(seed, &self.root)?;
        let content = tokio::fs::read_to_string(&seed).await?;
        let (body, marker_task) = split_task(&content);
        let task = match task_override.map(str::to_string).or(marker_task) {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err(EngineError::malformed(
                    "seed file has no task marker and no task was given",
                ));
            }
        };
        info!("task: {task}");

        let resolver = Resolver::new(&self.root, self.config.dialects.clone());
        let resolution = resolver.resolve(&seed, &body).await?;
        let mut context = resolution.context;
        let unresolved = resolution.unresolved;
        for reference in &unresolved {
            warn!("unresolved import: {reference}");
        }

        let compaction = CompactionConfig {
            token_budget: self.config.token_budget,
            model: self.config.compaction_model.clone(),
        };
        let dropped = compact(&mut context, &task, self.agent.as_ref(), &compaction).await?;
        if dropped > 0 {
            debug!("compaction dropped {dropped} file(s)");
        }

        let prompt = format!("{}\n\nTask:\n{task}", render(&context));
        let options = AskOptions {
            system: Some(SYSTEM_PROMPT.to_string()),
            model: Some(self.config.model.clone()),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        };
        let response = self
            .agent
            .ask(&prompt, &options)
            .await
            .map_err(EngineError::Agent)?;

        // Audit only; a failed transcript write never fails the task.
        if let Some(dir) = &self.config.history_dir {
            match SessionLog::new(dir) {
                Ok(log) => {
                    if let Err(e) = log.record(&prompt, &response) {
                        warn!("session log write failed: {e}");
                    }
                }
                Err(e) => warn!("session log unavailable: {e}"),
            }
        }

        let parsed = parse_commands(&response);
        if parsed.commands.is_empty() {
            return Err(EngineError::NoCommandsFound);
        }

        let mut outcome = TaskOutcome {
            unresolved,
            ..Default::default()
        };
        for warning in parsed.warnings {
            outcome.skipped.push(("(parse)".to_string(), warning));
        }

        let entry = context.entry().map(|f| f.rel.clone());
        for command in &parsed.commands {
            match command {
                EditCommand::Show { target } | EditCommand::Hide { target } => {
                    let visible = matches!(command, EditCommand::Show { .. });
                    // Numeric targets name rendered chunk IDs, paths name
                    // whole files.
                    let toggled = match target.parse::<usize>() {
                        Ok(id) => {
                            context.set_chunk_visible(id, visible)
                                || context.set_visible(target, visible)
                        }
                        Err(_) => context.set_visible(target, visible),
                    };
                    if toggled {
                        outcome.applied += 1;
                    } else {
                        outcome.skipped.push((
                            target.clone(),
                            "no such file or chunk in context".to_string(),
                        ));
                    }
                }
                EditCommand::Omit { path } => {
                    if entry.as_deref() == Some(path.as_str()) {
                        outcome
                            .skipped
                            .push((path.clone(), "entry file cannot be omitted".to_string()));
                    } else if context.remove(path) {
                        outcome.applied += 1;
                    } else {
                        outcome
                            .skipped
                            .push((path.clone(), "no such file in context".to_string()));
                    }
                }
                EditCommand::Write { .. } | EditCommand::Patch { .. } | EditCommand::Remove { .. } => {}
            }
        }

        let engine = PatchEngine::new(&self.root);
        for report in engine.apply(&parsed.commands) {
            match report.result {
                Ok(_) => outcome.applied += 1,
                Err(e) => outcome.skipped.push((report.path, e.to_string())),
            }
        }

        info!(
            "task done: {} applied, {} skipped",
            outcome.applied,
            outcome.skipped.len()
        );
        Ok(outcome)
    }
}
