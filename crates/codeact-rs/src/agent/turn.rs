//! The turn orchestrator: one pass of render, complete, decode.
//!
//! [`CodeActAgent::step`] runs a small state machine over [`TurnPhase`]:
//!
//! ```text
//! Rendering ──▶ Requesting ──▶ Decoded
//!    ▲  │            │
//!    │  │ over       │ context window exceeded
//!    │  ▼ ceiling    ▼
//!    └─ Recovering ◀─┘ ──(nothing to condense)──▶ FatalOverflow
//! ```
//!
//! The pre-emptive check runs once, on the first render. Each
//! context-window failure consumes one of `max_attempts` attempts and is
//! followed by exactly one condensation before the next render. Any other
//! completion failure ends the turn immediately.

use super::config::AgentConfig;
use super::events::{EventHandler, NoopHandler, TurnEvent};
use super::state::TaskState;
use crate::AGENT_VERSION;
use crate::Message;
use crate::api::{CompletionRequest, CompletionService};
use crate::context::{Condenser, OverflowRecovery, OverflowTrigger};
use crate::decode::{decode_response, stop_sequences};
use crate::error::{CompletionError, TurnError};
use crate::history::Action;
use crate::prompt::PromptRenderer;
use crate::prompt::render::{is_exit_request, total_chars};
use tracing::{info, trace};

/// Where a turn is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPhase {
    /// Render the prompt for `attempt`.
    Rendering { attempt: u32 },
    /// Send a rendered prompt to the completion service.
    Requesting { attempt: u32, messages: Vec<Message> },
    /// Condense history, then render for `attempt`.
    Recovering {
        attempt: u32,
        trigger: OverflowTrigger,
    },
    /// The response decoded into an action. Terminal.
    Decoded(Action),
    /// History cannot be condensed any further. Terminal.
    FatalOverflow,
}

impl TurnPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TurnPhase::Rendering { .. } => "rendering",
            TurnPhase::Requesting { .. } => "requesting",
            TurnPhase::Recovering { .. } => "recovering",
            TurnPhase::Decoded(_) => "decoded",
            TurnPhase::FatalOverflow => "fatal_overflow",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnPhase::Decoded(_) | TurnPhase::FatalOverflow)
    }
}

/// Runs single turns of the CodeAct agent against a completion service.
///
/// # Example
///
/// ```ignore
/// let agent = CodeActAgent::new(&client, AgentConfig::default())
///     .with_condenser(&condenser)
///     .with_event_handler(&LoggingHandler);
/// let action = agent.step(&mut state).await?;
/// ```
pub struct CodeActAgent<'a> {
    service: &'a dyn CompletionService,
    condenser: Option<&'a dyn Condenser>,
    config: AgentConfig,
    renderer: PromptRenderer,
    event_handler: &'a dyn EventHandler,
}

impl<'a> CodeActAgent<'a> {
    pub fn new(service: &'a dyn CompletionService, config: AgentConfig) -> Self {
        Self {
            service,
            condenser: None,
            renderer: PromptRenderer::from_config(&config),
            config,
            event_handler: &NoopHandler,
        }
    }

    /// Attach the condenser used for overflow recovery. Without one, any
    /// context-window overflow is fatal.
    pub fn with_condenser(mut self, condenser: &'a dyn Condenser) -> Self {
        self.condenser = Some(condenser);
        self
    }

    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn renderer(&self) -> &PromptRenderer {
        &self.renderer
    }

    /// Run one turn and return the next action.
    ///
    /// Adds the rendered prompt and raw response sizes to
    /// `state.num_of_chars`. Does not touch `state.iteration`.
    pub async fn step(&self, state: &mut TaskState) -> Result<Action, TurnError> {
        info!("Running CodeAct agent v{AGENT_VERSION}");
        self.event_handler.on_event(&TurnEvent::TurnStart {
            iteration: state.iteration,
            max_iterations: state.max_iterations,
        });

        let recovery = OverflowRecovery::new(self.condenser, self.config.max_input_tokens);
        let max_attempts = self.config.max_attempts.max(1);
        let mut preemptive_checked = false;
        let mut phase = TurnPhase::Rendering { attempt: 1 };

        loop {
            trace!(phase = phase.name(), "Turn phase");
            phase = match phase {
                TurnPhase::Rendering { attempt } => {
                    let messages =
                        self.renderer
                            .render(&state.history, state.iteration, state.max_iterations);
                    self.event_handler.on_event(&TurnEvent::PromptRendered {
                        attempt,
                        messages: messages.len(),
                        chars: total_chars(&messages),
                    });

                    let overflow = if preemptive_checked {
                        None
                    } else {
                        preemptive_checked = true;
                        recovery.preemptive_overflow(&messages)
                    };

                    if let Some(usage) = overflow {
                        self.event_handler
                            .on_event(&TurnEvent::PreemptiveOverflow { usage: &usage });
                        TurnPhase::Recovering {
                            attempt,
                            trigger: OverflowTrigger::Preemptive,
                        }
                    } else if is_exit_request(&messages) {
                        self.event_handler.on_event(&TurnEvent::ExitRequested);
                        return Ok(Action::finish(""));
                    } else {
                        TurnPhase::Requesting { attempt, messages }
                    }
                }

                TurnPhase::Requesting { attempt, messages } => {
                    let request = self.completion_request(messages);
                    match self.service.complete(&request).await {
                        Ok(text) => {
                            self.event_handler
                                .on_event(&TurnEvent::ResponseReceived { attempt, text: &text });
                            state.num_of_chars +=
                                (total_chars(&request.messages) + text.chars().count()) as u64;
                            TurnPhase::Decoded(decode_response(
                                &text,
                                &self.config.kernel_init_code,
                            ))
                        }
                        Err(CompletionError::ContextWindowExceeded(error)) => {
                            self.event_handler.on_event(&TurnEvent::ContextWindowExceeded {
                                attempt,
                                max_attempts,
                                error: &error,
                            });
                            if attempt >= max_attempts {
                                return Err(TurnError::AttemptsExhausted { attempts: attempt });
                            }
                            TurnPhase::Recovering {
                                attempt: attempt + 1,
                                trigger: OverflowTrigger::Reactive,
                            }
                        }
                        Err(e) => return Err(TurnError::Completion(e)),
                    }
                }

                TurnPhase::Recovering { attempt, trigger } => {
                    match recovery.recover(&mut state.history, trigger).await {
                        Ok(recovered) => {
                            self.event_handler.on_event(&TurnEvent::Condensed {
                                trigger,
                                replaced: recovered.replaced,
                                remaining: recovered.remaining,
                            });
                            TurnPhase::Rendering { attempt }
                        }
                        Err(_) => TurnPhase::FatalOverflow,
                    }
                }

                TurnPhase::Decoded(action) => {
                    self.event_handler.on_event(&TurnEvent::ActionDecoded(&action));
                    return Ok(action);
                }

                TurnPhase::FatalOverflow => return Err(TurnError::ContextWindowLimit),
            };
        }
    }

    fn completion_request(&self, messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            stop: stop_sequences(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CompletionFuture;
    use crate::context::{CondenseFuture, Condensation};
    use crate::history::{Event, History, Source};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies in order; the last reply repeats once the script runs out.
    struct ScriptedService {
        replies: Mutex<VecDeque<Result<String, CompletionError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedService {
        fn new(replies: impl IntoIterator<Item = Result<String, CompletionError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl CompletionService for ScriptedService {
        fn complete<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
            self.requests.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap()
            };
            Box::pin(async move { reply })
        }
    }

    /// Always folds the first two live events into one summary.
    struct PairCondenser;

    impl Condenser for PairCondenser {
        fn estimate_token_count(&self, _messages: &[Message]) -> usize {
            0
        }

        fn condense<'a>(&'a self, history: &'a History) -> CondenseFuture<'a> {
            let result = (history.len() >= 2).then(|| Condensation {
                span: 0..2,
                summary: "earlier work".into(),
            });
            Box::pin(async move { Ok(result) })
        }
    }

    fn overflow() -> Result<String, CompletionError> {
        Err(CompletionError::ContextWindowExceeded(
            "maximum context length exceeded".into(),
        ))
    }

    fn state_with(messages: &[&str]) -> TaskState {
        TaskState::new(10).with_history(History::from_events(
            messages
                .iter()
                .map(|m| Event::action(Source::User, Action::message(*m, false))),
        ))
    }

    #[test]
    fn phase_names_and_terminals() {
        assert_eq!(TurnPhase::Rendering { attempt: 1 }.name(), "rendering");
        assert!(!TurnPhase::Rendering { attempt: 1 }.is_terminal());
        assert!(TurnPhase::FatalOverflow.is_terminal());
        assert!(TurnPhase::Decoded(Action::finish("")).is_terminal());
    }

    #[tokio::test]
    async fn request_uses_stop_sequences_and_config() {
        let service = ScriptedService::new([Ok("<finish></finish>".to_string())]);
        let config = AgentConfig::new("test/model").with_max_tokens(256);
        let mut state = state_with(&["hello"]);

        let action = CodeActAgent::new(&service, config)
            .step(&mut state)
            .await
            .unwrap();
        assert_eq!(action, Action::finish(""));

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test/model");
        assert_eq!(requests[0].temperature, 0.0);
        assert_eq!(requests[0].max_tokens, 256);
        assert_eq!(requests[0].stop, stop_sequences());
    }

    #[tokio::test]
    async fn overflow_then_success_condenses_once() {
        let service = ScriptedService::new([overflow(), Ok("Done.".to_string())]);
        let mut state = state_with(&["a", "b", "c"]);

        let action = CodeActAgent::new(&service, AgentConfig::default())
            .with_condenser(&PairCondenser)
            .step(&mut state)
            .await
            .unwrap();

        assert_eq!(action, Action::message("Done.", true));
        assert_eq!(service.calls(), 2);
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history.arena_len(), 4);
    }

    #[tokio::test]
    async fn overflow_without_condenser_is_fatal() {
        let service = ScriptedService::new([overflow()]);
        let mut state = state_with(&["a"]);

        let err = CodeActAgent::new(&service, AgentConfig::default())
            .step(&mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::ContextWindowLimit));
        assert_eq!(service.calls(), 1);
        assert_eq!(state.num_of_chars, 0);
    }

    #[tokio::test]
    async fn attempt_budget_is_configurable() {
        let service = ScriptedService::new([overflow()]);
        let mut state = state_with(&["a", "b", "c", "d", "e", "f"]);

        let err = CodeActAgent::new(&service, AgentConfig::default().with_max_attempts(2))
            .with_condenser(&PairCondenser)
            .step(&mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::AttemptsExhausted { attempts: 2 }));
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn events_follow_the_phases() {
        let service = ScriptedService::new([overflow(), Ok("ok".to_string())]);
        let mut state = state_with(&["a", "b"]);
        let seen = Mutex::new(Vec::new());
        let handler = crate::agent::events::FnEventHandler::new(|event| {
            let name = match event {
                TurnEvent::TurnStart { .. } => "start",
                TurnEvent::PromptRendered { .. } => "rendered",
                TurnEvent::PreemptiveOverflow { .. } => "preemptive",
                TurnEvent::ContextWindowExceeded { .. } => "exceeded",
                TurnEvent::Condensed { .. } => "condensed",
                TurnEvent::ExitRequested => "exit",
                TurnEvent::ResponseReceived { .. } => "response",
                TurnEvent::ActionDecoded(_) => "decoded",
            };
            seen.lock().unwrap().push(name);
        });

        CodeActAgent::new(&service, AgentConfig::default())
            .with_condenser(&PairCondenser)
            .with_event_handler(&handler)
            .step(&mut state)
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            [
                "start",
                "rendered",
                "exceeded",
                "condensed",
                "rendered",
                "response",
                "decoded"
            ]
        );
    }
}
