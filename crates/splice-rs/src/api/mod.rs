//! The agent capability seam.
//!
//! The engine consumes exactly one external capability: `ask(prompt,
//! options) -> text`. [`OpenRouterAgent`] implements it against the
//! OpenRouter chat completions API; [`ScriptedAgent`] implements it from a
//! canned script for tests. Errors cross this seam as plain strings, the
//! way HTTP-layer failures are reported throughout; the engine wraps them
//! into its own error type at the call site.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{DEFAULT_MODEL, OPENROUTER_URL};

/// Boxed future returned by [`AgentCapability::ask`].
pub type AskFuture<'a> = Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>>;

/// Per-call knobs. Unset fields fall back to the implementation's
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub system: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A single-shot text completion capability.
///
/// The engine only consumes the final text; streaming, vendor choice, and
/// retry policy are the implementation's business.
pub trait AgentCapability: Send + Sync {
    fn ask<'a>(&'a self, prompt: &'a str, options: &'a AskOptions) -> AskFuture<'a>;
}

// ── OpenRouter ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct RawChatResponse {
    choices: Option<Vec<Choice>>,
    error: Option<ApiError>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

/// Async client for the OpenRouter chat completions API.
pub struct OpenRouterAgent {
    client: reqwest::Client,
    api_key: String,
    default_model: String,
}

impl OpenRouterAgent {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("splice-rs/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            default_model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Read the API key from the `OPENROUTER_KEY` environment variable.
    pub fn from_env() -> Result<Self, String> {
        let api_key =
            std::env::var("OPENROUTER_KEY").map_err(|_| "OPENROUTER_KEY not set".to_string())?;
        Self::new(api_key)
    }

    /// Override the model used when a call does not name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    async fn complete(&self, prompt: &str, options: &AskOptions) -> Result<String, String> {
        let mut messages = Vec::new();
        if let Some(system) = &options.system {
            messages.push(Message {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(Message {
            role: "user",
            content: prompt.to_string(),
        });

        let body = ChatRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone()),
            messages,
            max_tokens: options.max_tokens.unwrap_or(16_384),
            temperature: options.temperature.unwrap_or(0.3),
        };
        debug!(
            "LLM request: model={}, max_tokens={}, temp={}",
            body.model, body.max_tokens, body.temperature
        );
        trace!("prompt size: {} bytes", prompt.len());

        let start = Instant::now();
        let resp = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;
        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("OpenRouter API HTTP {status}: {text}"));
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))?;
        if let Some(err) = parsed.error {
            return Err(format!("OpenRouter API error: {}", err.message));
        }
        if let Some(usage) = &parsed.usage {
            debug!(
                "token usage: prompt={}, completion={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
            );
        }

        parsed
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message.content)
            .ok_or_else(|| "empty completion".to_string())
    }
}

impl AgentCapability for OpenRouterAgent {
    fn ask<'a>(&'a self, prompt: &'a str, options: &'a AskOptions) -> AskFuture<'a> {
        Box::pin(self.complete(prompt, options))
    }
}

// ── Scripted test double ───────────────────────────────────────────

/// Replays a fixed sequence of responses. Asking past the end of the
/// script is an error, so tests catch unexpected extra calls.
#[derive(Default)]
pub struct ScriptedAgent {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedAgent {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl AgentCapability for ScriptedAgent {
    fn ask<'a>(&'a self, _prompt: &'a str, _options: &'a AskOptions) -> AskFuture<'a> {
        Box::pin(async move {
            self.responses
                .lock()
                .map_err(|_| "script poisoned".to_string())?
                .pop_front()
                .ok_or_else(|| "script exhausted".to_string())
        })
    }
}
