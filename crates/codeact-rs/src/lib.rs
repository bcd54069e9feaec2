//! Single-turn core of a CodeAct-style software agent.
//!
//! `codeact-rs` drives one turn of an autonomous coding agent: it renders the
//! task's event [`History`](history::History) into chat messages, asks a
//! completion service for the next step, and decodes the free-form reply into
//! exactly one structured [`Action`](history::Action) — a shell command, an
//! IPython cell, a browser directive, a plain message, or a finish signal.
//!
//! The model is asked to wrap its actions in a small markup grammar:
//!
//! ```text
//! <execute_bash>ls -la</execute_bash>
//! <execute_ipython>print(1)</execute_ipython>
//! <execute_browse>goto("https://example.com")</execute_browse>
//! <finish></finish>
//! ```
//!
//! When the prompt no longer fits the completion service's context window,
//! the turn condenses history through a [`Condenser`](context::Condenser)
//! and retries, up to three attempts per turn.
//!
//! # Getting started
//!
//! ```ignore
//! use codeact_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("OPENROUTER_KEY")?;
//!     let client = OpenRouterClient::new(api_key)?;
//!     let config = AgentConfig::default().with_max_input_tokens(100_000);
//!     let condenser = LlmCondenser::new(&client, config.model.clone());
//!
//!     let mut state = TaskState::new(30);
//!     state.history.push(Event::action(
//!         Source::User,
//!         Action::message("List the files in the repository.", false),
//!     ));
//!
//!     let action = CodeActAgent::new(&client, config)
//!         .with_condenser(&condenser)
//!         .step(&mut state)
//!         .await?;
//!     println!("{action:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`history`] | [`Event`](history::Event) sum types and the append-only [`History`](history::History) arena |
//! | [`prompt`] | Observation formatting, prompt templates, and the history renderer |
//! | [`decode`] | Markup scanner and response decoder |
//! | [`context`] | Token estimation, the [`Condenser`](context::Condenser) seam, overflow recovery |
//! | [`api`] | [`CompletionService`](api::CompletionService) seam and error classification |
//! | [`agent`] | [`CodeActAgent`](agent::CodeActAgent) turn orchestrator, config, task state, events |

pub mod agent;
pub mod api;
pub mod context;
pub mod decode;
pub mod error;
pub mod history;
pub mod prelude;
pub mod prompt;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model for completion calls.
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4";

/// Version reported in the per-turn log line.
pub const AGENT_VERSION: &str = "1.5";

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body.
///
/// `temperature` is always serialized: the agent samples at `0.0` and the
/// service default is not deterministic.
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a prompt message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A role-tagged prompt message. Built fresh every turn, never persisted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Token usage statistics, logged per request.
#[derive(Deserialize, Debug)]
struct UsageInfo {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the OpenRouter chat completions API.
///
/// Errors are plain strings carrying the HTTP status and the provider's
/// message; [`api::classify`] turns them into
/// [`CompletionError`](error::CompletionError) values.
pub struct OpenRouterClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) referer: String,
    pub(crate) title: String,
}

impl OpenRouterClient {
    /// Create a new client with the given API key and default headers.
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        Self::with_headers(api_key, "https://github.com/codeact-rs", "codeact-rs")
    }

    /// Create a new client with custom Referer and X-Title headers.
    pub fn with_headers(
        api_key: impl Into<String>,
        referer: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("codeact-rs/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            referer: referer.into(),
            title: title.into(),
        })
    }

    /// Send a chat completion request and return the reply text.
    ///
    /// A response with no choices or no content yields an empty string.
    pub async fn chat(&self, body: &ChatRequest) -> Result<String, String> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(body)
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
            return Err(match err.code {
                Some(code) => format!("OpenRouter API error ({code}): {}", err.message),
                None => format!("OpenRouter API error: {}", err.message),
            });
        }

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        let choice = parsed.choices.and_then(|c| c.into_iter().next());
        match choice {
            Some(c) => Ok(c.message.content.unwrap_or_default()),
            None => {
                debug!("LLM output: empty (no choices)");
                Ok(String::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "hello");

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let assist = Message::assistant("reply");
        assert_eq!(assist.role, MessageRole::Assistant);
    }

    #[test]
    fn chat_request_keeps_zero_temperature() {
        let req = ChatRequest {
            model: "test-model".into(),
            messages: vec![Message::user("hi")],
            temperature: 0.0,
            stop: Some(vec!["</execute_bash>".into()]),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["stop"][0], "</execute_bash>");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_value(Message::assistant("x")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(MessageRole::User.to_string(), "user");
    }

    #[test]
    fn raw_response_reads_content_and_tolerates_extra_fields() {
        let parsed: RawChatResponse = serde_json::from_str(
            r#"{
                "choices": [{"message": {"content": "ls"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.usage.unwrap().total_tokens, Some(11));
        let choice = parsed.choices.unwrap().into_iter().next().unwrap();
        assert_eq!(choice.message.content.as_deref(), Some("ls"));
    }
}
