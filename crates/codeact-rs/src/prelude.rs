//! Convenience re-exports for common `codeact-rs` types.
//!
//! Meant to be glob-imported:
//!
//! ```ignore
//! use codeact_rs::prelude::*;
//! ```
//!
//! This pulls in what a caller needs to drive turns: the
//! [`OpenRouterClient`], [`CodeActAgent`] + config and state, the history
//! event types, the condenser, and event handlers. Lower-level pieces
//! (the markup scanner, error classification, prompt templates) are left
//! out; import those from their modules directly.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{Message, MessageRole, OpenRouterClient};

// ── Agent runtime ───────────────────────────────────────────────────
pub use crate::agent::{
    AgentConfig, CodeActAgent, EventHandler, FnEventHandler, LoggingHandler, NoopHandler,
    TaskState, TurnEvent,
};

// ── History ─────────────────────────────────────────────────────────
pub use crate::history::{Action, Event, History, Observation, Source};

// ── Completion and context management ───────────────────────────────
pub use crate::api::{CompletionRequest, CompletionService};
pub use crate::context::{Condenser, LlmCondenser};

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{CompletionError, TurnError};
