//! Prompt assembly: fixed templates, observation formatting, history rendering.
//!
//! - [`templates`] — system preamble, command reference, worked example.
//! - [`observation`] — middle truncation and inline-image redaction for
//!   environment output.
//! - [`render`] — [`PromptRenderer`], which maps each history event to a
//!   role-tagged message and appends the iteration reminder.

pub mod observation;
pub mod render;
pub mod templates;

pub use observation::{DEFAULT_MAX_OBSERVATION_CHARS, truncate_observation};
pub use render::{EXIT_SENTINEL, PromptRenderer, is_exit_request, latest_user_message};
