//! Completion service layer.
//!
//! - [`completion`] — the [`CompletionService`] trait the turn loop talks to,
//!   and its implementation for [`OpenRouterClient`](crate::OpenRouterClient).
//! - [`classify`] — maps client error strings onto
//!   [`CompletionError`](crate::error::CompletionError), separating
//!   context-window overflows from every other failure.

pub mod classify;
pub mod completion;

pub use classify::{classify_error, is_context_window_error};
pub use completion::{CompletionFuture, CompletionRequest, CompletionService};
