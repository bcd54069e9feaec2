//! Configuration for the [`CodeActAgent`](super::turn::CodeActAgent).
//!
//! # Examples
//!
//! Defaults everywhere:
//!
//! ```ignore
//! let config = AgentConfig::default();
//! ```
//!
//! Customized with builder methods:
//!
//! ```ignore
//! let config = AgentConfig::new("anthropic/claude-sonnet-4")
//!     .with_max_input_tokens(100_000)
//!     .with_max_tokens(4096)
//!     .with_github(false);
//! ```

use crate::DEFAULT_MODEL;
use crate::prompt::DEFAULT_MAX_OBSERVATION_CHARS;

/// Completion attempts per turn before giving up on repeated overflows.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Snippet attached to every interpreter action.
pub const DEFAULT_KERNEL_INIT_CODE: &str = "from agentskills import *";

/// Turn-level configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model identifier (e.g. `"anthropic/claude-sonnet-4"`).
    pub model: String,
    /// Sampling temperature. Defaults to the minimum.
    pub temperature: f32,
    /// Maximum tokens per LLM response. `0` leaves it to the service.
    pub max_tokens: u32,
    /// Input-token ceiling for pre-emptive condensation. `None` disables it.
    pub max_input_tokens: Option<usize>,
    /// Completion attempts per turn.
    pub max_attempts: u32,
    /// Per-observation character ceiling.
    pub observation_max_chars: usize,
    /// Include the GitHub addendum in the system message.
    pub enable_github: bool,
    /// Code run in the interpreter kernel before each cell.
    pub kernel_init_code: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: 0,
            max_input_tokens: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            observation_max_chars: DEFAULT_MAX_OBSERVATION_CHARS,
            enable_github: true,
            kernel_init_code: DEFAULT_KERNEL_INIT_CODE.to_string(),
        }
    }
}

impl AgentConfig {
    /// Create a config for `model` with every other setting at its default.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    // ── Builder methods ───────────────────────────────────────────

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Condense before sending when the estimated prompt exceeds `tokens`.
    pub fn with_max_input_tokens(mut self, tokens: usize) -> Self {
        self.max_input_tokens = Some(tokens);
        self
    }

    /// Set the attempt budget. Clamped to at least one attempt.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_observation_max_chars(mut self, max_chars: usize) -> Self {
        self.observation_max_chars = max_chars;
        self
    }

    pub fn with_github(mut self, enabled: bool) -> Self {
        self.enable_github = enabled;
        self
    }

    pub fn with_kernel_init_code(mut self, code: impl Into<String>) -> Self {
        self.kernel_init_code = code.into();
        self
    }
}
