//! Error types for completion calls, history splicing, and turns.

use thiserror::Error;

/// Failure reported by a [`CompletionService`](crate::api::CompletionService).
///
/// The turn loop only distinguishes two cases: the prompt did not fit the
/// model's context window (recoverable by condensing history), or anything
/// else (propagated to the caller untouched).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// The prompt exceeded the model's input limit.
    #[error("context window exceeded: {0}")]
    ContextWindowExceeded(String),

    /// Network, rate-limit, auth, or any other service failure.
    #[error("completion request failed: {0}")]
    Request(String),
}

impl CompletionError {
    pub fn is_context_window_exceeded(&self) -> bool {
        matches!(self, Self::ContextWindowExceeded(_))
    }
}

/// Errors raised while mutating or loading a [`History`](crate::history::History).
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A condensation named a span outside the live history or an empty one.
    #[error("invalid summary span {start}..{end} for history of {len} events")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// Reading a history file failed.
    #[error("failed to read history file: {0}")]
    Io(#[from] std::io::Error),

    /// A history file was not a JSON array of events.
    #[error("failed to parse history file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that end a turn without a decoded action.
#[derive(Debug, Error)]
pub enum TurnError {
    /// History could not be condensed any further (or no condenser is
    /// configured). No further completions are possible for this task.
    #[error("Context window limit exceeded. Unable to condense memory.")]
    ContextWindowLimit,

    /// Every attempt in the turn hit the context window, even though each
    /// failure was followed by a successful condensation.
    #[error("context window exceeded on all {attempts} completion attempts")]
    AttemptsExhausted { attempts: u32 },

    /// A non-overflow completion failure. Not retried by the turn loop.
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl TurnError {
    /// Whether the caller should move the task to an error state instead of
    /// issuing more turns.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ContextWindowLimit | Self::AttemptsExhausted { .. }
        )
    }
}
