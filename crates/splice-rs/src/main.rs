//! Command-line front end for the splice engine.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable.
//!
//! # Examples
//!
//! ```sh
//! # Task taken from the seed file's //! marker
//! splice src/main.c --workdir .
//!
//! # Task given on the command line
//! splice src/main.c --task "extract the parser into parser.c"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use splice_rs::resolver::DialectSet;
use splice_rs::{DEFAULT_MODEL, DEFAULT_TOKEN_BUDGET, Engine, EngineConfig, OpenRouterAgent};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Import-aware context assembly and structured edit application.
#[derive(Parser)]
#[command(name = "splice")]
struct Cli {
    /// Seed file; its task marker (or --task) drives the edit.
    seed: PathBuf,

    /// Workspace root; all reads and writes are sandboxed to it.
    #[arg(long, default_value = ".")]
    workdir: String,

    /// Task instruction, overriding the seed's task marker.
    #[arg(long)]
    task: Option<String>,

    /// Model for the edit call.
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Model for the compaction relevance call (defaults to --model).
    #[arg(long)]
    compaction_model: Option<String>,

    /// Rendered-context token budget before compaction kicks in.
    #[arg(long, default_value_t = DEFAULT_TOKEN_BUDGET)]
    token_budget: u64,

    /// Import-marker dialect (slash, brace, hash); repeat to set
    /// precedence order. Defaults to all three.
    #[arg(long = "dialect")]
    dialects: Vec<String>,

    /// Directory for prompt/response transcripts. Unset disables logging.
    #[arg(long)]
    history_dir: Option<PathBuf>,

    /// Maximum tokens per LLM response.
    #[arg(long, default_value_t = 16384)]
    max_tokens: u32,

    /// Sampling temperature.
    #[arg(long, default_value_t = 0.3)]
    temperature: f32,

    /// Enable debug logging.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    let dialects = if cli.dialects.is_empty() {
        DialectSet::common()
    } else {
        match DialectSet::from_tags(&cli.dialects) {
            Ok(set) => set,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let agent = match OpenRouterAgent::from_env() {
        Ok(agent) => agent.with_default_model(&cli.model),
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = EngineConfig::default()
        .with_model(&cli.model)
        .with_compaction_model(cli.compaction_model.as_deref().unwrap_or(&cli.model))
        .with_token_budget(cli.token_budget)
        .with_max_tokens(cli.max_tokens)
        .with_temperature(cli.temperature)
        .with_dialects(dialects);
    if let Some(dir) = &cli.history_dir {
        config = config.with_history_dir(dir);
    }

    let engine = Engine::new(&cli.workdir, Box::new(agent), config);
    let outcome = match engine.run_task(&cli.seed, cli.task.as_deref()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for reference in &outcome.unresolved {
        eprintln!("unresolved import: {reference}");
    }
    for (path, reason) in &outcome.skipped {
        eprintln!("skipped {path}: {reason}");
    }
    if outcome.applied == 0 {
        eprintln!("Error: no commands applied");
        return ExitCode::FAILURE;
    }
    println!("{} command(s) applied", outcome.applied);
    ExitCode::SUCCESS
}
