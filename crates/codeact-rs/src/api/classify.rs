//! Classify completion failures into [`CompletionError`] variants.
//!
//! The HTTP client reports failures as strings (`"OpenRouter API HTTP 400:
//! ..."`, `"request failed: ..."`). Providers disagree on how they phrase
//! an over-long prompt, so detection is substring-based and
//! case-insensitive.

use crate::error::CompletionError;

/// Phrases providers use when the prompt exceeds the context window.
const CONTEXT_WINDOW_PATTERNS: &[&str] = &[
    "context_length_exceeded",
    "context length",
    "context window",
    "maximum context",
    "too many tokens",
    "prompt is too long",
    "input is too long",
];

/// Whether an error string says the prompt did not fit.
pub fn is_context_window_error(error: &str) -> bool {
    let lower = error.to_lowercase();
    CONTEXT_WINDOW_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Whether an error string indicates a transient (retryable) failure.
///
/// Only used for logging: the turn loop does not retry these.
pub fn is_transient_error(error: &str) -> bool {
    let transient_statuses = ["429", "500", "502", "503", "504"];
    if transient_statuses
        .iter()
        .any(|s| error.contains(&format!("HTTP {s}")))
    {
        return true;
    }

    let lower = error.to_lowercase();
    [
        "request failed:",
        "connection reset",
        "connection refused",
        "timed out",
        "timeout",
        "broken pipe",
    ]
    .iter()
    .any(|p| lower.contains(p))
}

/// Convert a client error string into a [`CompletionError`].
pub fn classify_error(error: String) -> CompletionError {
    if is_context_window_error(&error) {
        CompletionError::ContextWindowExceeded(error)
    } else {
        CompletionError::Request(error)
    }
}
