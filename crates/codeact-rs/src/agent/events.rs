//! Events and handlers for the [`CodeActAgent`](super::turn::CodeActAgent) turn loop.
//!
//! A turn reports its progress through [`TurnEvent`] variants. Callers
//! implement [`EventHandler`] to observe them for logging, UI updates,
//! metrics, or tests.
//!
//! # Choosing an event handler
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures for simple callbacks |
//! | Custom `impl EventHandler` | Full control |

use crate::context::{ContextUsage, OverflowTrigger};
use crate::history::Action;
use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted during a single turn.
#[derive(Debug)]
pub enum TurnEvent<'a> {
    /// A turn is starting.
    TurnStart { iteration: u32, max_iterations: u32 },
    /// A prompt was rendered for a completion attempt.
    PromptRendered {
        attempt: u32,
        messages: usize,
        chars: usize,
    },
    /// The estimated prompt size is over the configured ceiling.
    PreemptiveOverflow { usage: &'a ContextUsage },
    /// The completion service rejected the prompt as too long.
    ContextWindowExceeded {
        attempt: u32,
        max_attempts: u32,
        error: &'a str,
    },
    /// History was condensed.
    Condensed {
        trigger: OverflowTrigger,
        replaced: usize,
        remaining: usize,
    },
    /// The latest user message is the exit sentinel; no completion is made.
    ExitRequested,
    /// The completion service returned text.
    ResponseReceived { attempt: u32, text: &'a str },
    /// The response was decoded into an action.
    ActionDecoded(&'a Action),
}

// ── Handlers ───────────────────────────────────────────────────────

/// Observer for [`TurnEvent`]s. The default implementation ignores everything.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &TurnEvent<'_>) {
        let _ = event;
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
///
/// # Example
///
/// ```ignore
/// let handler = FnEventHandler::new(|event| {
///     if let TurnEvent::ActionDecoded(action) = event {
///         println!("{}", action.kind());
///     }
/// });
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&TurnEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&TurnEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&TurnEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &TurnEvent<'_>) {
        (self.0)(event)
    }
}

/// Maps turn events onto `tracing` levels.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &TurnEvent<'_>) {
        match event {
            TurnEvent::TurnStart {
                iteration,
                max_iterations,
            } => {
                info!("[turn {iteration}/{max_iterations}]");
            }
            TurnEvent::PromptRendered {
                attempt,
                messages,
                chars,
            } => {
                debug!("Attempt {attempt}: {messages} message(s), {chars} chars");
            }
            TurnEvent::PreemptiveOverflow { usage } => {
                warn!("Prompt over input ceiling, condensing ({})", usage.to_log_string());
            }
            TurnEvent::ContextWindowExceeded {
                attempt,
                max_attempts,
                error,
            } => {
                warn!("Context window exceeded ({attempt}/{max_attempts}): {error}");
            }
            TurnEvent::Condensed {
                trigger,
                replaced,
                remaining,
            } => {
                info!("Condensed {replaced} event(s) ({trigger}); {remaining} live event(s) remain");
            }
            TurnEvent::ExitRequested => {
                info!("User requested exit");
            }
            TurnEvent::ResponseReceived { attempt, text } => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "LLM text (attempt {attempt}): {preview}{}",
                    if text.chars().count() > 200 { "..." } else { "" }
                );
            }
            TurnEvent::ActionDecoded(action) => {
                debug!("Decoded action: {}", action.kind());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn fn_handler_receives_events() {
        let seen = Mutex::new(Vec::new());
        let handler = FnEventHandler::new(|event| {
            seen.lock().unwrap().push(format!("{event:?}"));
        });
        handler.on_event(&TurnEvent::ExitRequested);
        let finish = Action::finish("done");
        handler.on_event(&TurnEvent::ActionDecoded(&finish));

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], "ExitRequested");
        assert!(seen[1].contains("Finish"));
    }

    #[test]
    fn builtin_handlers_accept_every_event() {
        let usage = ContextUsage {
            estimated_tokens: 10,
            max_tokens: 5,
            usage_pct: 2.0,
        };
        let action = Action::message("hi", true);
        let events = [
            TurnEvent::TurnStart {
                iteration: 1,
                max_iterations: 3,
            },
            TurnEvent::PromptRendered {
                attempt: 1,
                messages: 2,
                chars: 40,
            },
            TurnEvent::PreemptiveOverflow { usage: &usage },
            TurnEvent::ContextWindowExceeded {
                attempt: 1,
                max_attempts: 3,
                error: "too long",
            },
            TurnEvent::Condensed {
                trigger: OverflowTrigger::Reactive,
                replaced: 4,
                remaining: 2,
            },
            TurnEvent::ExitRequested,
            TurnEvent::ResponseReceived {
                attempt: 1,
                text: "hello",
            },
            TurnEvent::ActionDecoded(&action),
        ];
        for event in &events {
            NoopHandler.on_event(event);
            LoggingHandler.on_event(event);
        }
    }
}
