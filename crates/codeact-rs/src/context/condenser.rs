//! History condensation: replace a run of old events with one summary.
//!
//! The [`Condenser`] trait is what the overflow recovery path talks to. It
//! answers two questions: roughly how many tokens a rendered prompt costs,
//! and which span of the live history can be folded into a summary.
//! [`LlmCondenser`] answers the second with a single completion call.

use super::budget::TokenEstimator;
use crate::api::{CompletionRequest, CompletionService};
use crate::history::{Action, Event, History, Source};
use crate::prompt::{DEFAULT_MAX_OBSERVATION_CHARS, PromptRenderer};
use crate::Message;
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use tracing::debug;

/// The prompt used for summarization. Instructs the model to produce a concise,
/// factual summary that can stand in for the replaced events.
const SUMMARIZATION_PROMPT: &str = "\
Summarize the following agent history concisely. It will replace the \
original events, so the agent must be able to continue the task from it. Focus on:
- What was accomplished (commands run, files created or modified)
- Key findings and decisions made
- Failed approaches (what was tried and why it failed)
- File paths, function names, and package names mentioned
- What remains to be done

Rules:
- Only include facts explicitly stated in the history. Do not infer or extrapolate.
- Preserve file paths, function names, and error messages verbatim.
- Be concise. Every token must earn its place.
- If the history already contains a summary, merge it into the new one. The result \
  must be a standalone summary that replaces the old one entirely.";

/// Boxed future returned by [`Condenser::condense`].
pub type CondenseFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<Condensation>, String>> + Send + 'a>>;

/// A proposed condensation: replace the live events in `span` with `summary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condensation {
    /// Range of live-history positions to replace.
    pub span: Range<usize>,
    pub summary: String,
}

impl Condensation {
    /// The event spliced into history in place of the span.
    pub fn summary_event(&self) -> Event {
        Event::action(
            Source::Agent,
            Action::Summarize {
                summary: self.summary.clone(),
            },
        )
    }
}

/// Shrinks history when the prompt no longer fits.
///
/// `condense` returns `Ok(None)` when there is nothing left to fold away.
/// Uses a boxed future so the trait stays dyn-compatible.
pub trait Condenser: Send + Sync {
    /// Approximate prompt size in tokens.
    fn estimate_token_count(&self, messages: &[Message]) -> usize;

    /// Propose a condensation of the live history.
    fn condense<'a>(&'a self, history: &'a History) -> CondenseFuture<'a>;
}

/// Configuration for [`LlmCondenser`].
#[derive(Debug, Clone)]
pub struct CondenserConfig {
    /// Most recent live events that are never summarised.
    pub keep_recent: usize,
    /// Maximum tokens for the summarization response. `0` leaves it to the service.
    pub max_summary_tokens: u32,
    /// Calibrated chars-per-token ratio, if known.
    pub chars_per_token: Option<f64>,
    /// Per-observation character ceiling used when rendering the events to summarise.
    pub observation_max_chars: usize,
}

impl Default for CondenserConfig {
    fn default() -> Self {
        Self {
            keep_recent: 4,
            max_summary_tokens: 2048,
            chars_per_token: None,
            observation_max_chars: DEFAULT_MAX_OBSERVATION_CHARS,
        }
    }
}

/// Condenser that asks a language model to summarise old history.
///
/// Everything but the last `keep_recent` live events is summarised in one
/// call. Fewer than two eligible events means nothing is left to condense.
pub struct LlmCondenser<'a> {
    service: &'a dyn CompletionService,
    model: String,
    config: CondenserConfig,
    estimator: TokenEstimator,
    renderer: PromptRenderer,
}

impl<'a> LlmCondenser<'a> {
    pub fn new(service: &'a dyn CompletionService, model: impl Into<String>) -> Self {
        Self::with_config(service, model, CondenserConfig::default())
    }

    pub fn with_config(
        service: &'a dyn CompletionService,
        model: impl Into<String>,
        config: CondenserConfig,
    ) -> Self {
        Self {
            service,
            model: model.into(),
            estimator: TokenEstimator::with_calibration(config.chars_per_token),
            renderer: PromptRenderer::default()
                .with_observation_max_chars(config.observation_max_chars),
            config,
        }
    }

    pub fn config(&self) -> &CondenserConfig {
        &self.config
    }

    /// Live positions that would be summarised, or `None` if fewer than two.
    pub fn eligible_span(&self, history: &History) -> Option<Range<usize>> {
        let end = history.len().saturating_sub(self.config.keep_recent);
        (end >= 2).then_some(0..end)
    }

    /// Build the summarization prompt for a span of live events.
    ///
    /// Returns a (system, user) message pair suitable for a one-shot LLM call.
    pub fn build_summarization_request(
        &self,
        history: &History,
        span: Range<usize>,
    ) -> (String, String) {
        let mut content = String::new();
        for event in history.iter().skip(span.start).take(span.len()) {
            if let Some(msg) = self.renderer.event_message(event) {
                content.push_str(&format!("[{}]: {}\n\n", msg.role, msg.content));
            }
        }
        (SUMMARIZATION_PROMPT.to_string(), content)
    }
}

impl Condenser for LlmCondenser<'_> {
    fn estimate_token_count(&self, messages: &[Message]) -> usize {
        self.estimator.estimate(messages)
    }

    fn condense<'b>(&'b self, history: &'b History) -> CondenseFuture<'b> {
        Box::pin(async move {
            let Some(span) = self.eligible_span(history) else {
                debug!(live = history.len(), "Nothing left to condense");
                return Ok(None);
            };

            let (system, user) = self.build_summarization_request(history, span.clone());
            let request = CompletionRequest {
                model: self.model.clone(),
                messages: vec![Message::system(system), Message::user(user)],
                stop: Vec::new(),
                temperature: 0.0,
                max_tokens: self.config.max_summary_tokens,
            };
            let summary = self
                .service
                .complete(&request)
                .await
                .map_err(|e| format!("summarization failed: {e}"))?;

            let summary = summary.trim();
            if summary.is_empty() {
                debug!("Summarizer returned an empty summary");
                return Ok(None);
            }
            debug!(
                events = span.len(),
                summary_chars = summary.chars().count(),
                "Summarised history span"
            );
            Ok(Some(Condensation {
                span,
                summary: summary.to_string(),
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CompletionFuture;
    use crate::error::CompletionError;
    use crate::history::Observation;
    use crate::prompt::observation::TRUNCATION_MARKER;
    use std::sync::Mutex;

    struct FixedSummary {
        reply: Result<String, CompletionError>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl FixedSummary {
        fn new(reply: Result<String, CompletionError>) -> Self {
            Self {
                reply,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl CompletionService for FixedSummary {
        fn complete<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    fn history_of(n: usize) -> History {
        History::from_events((0..n).map(|i| {
            if i % 2 == 0 {
                Event::action(Source::Agent, Action::run_command(format!("step {i}"), ""))
            } else {
                Event::observation(Observation::CommandOutput {
                    content: format!("output {i}"),
                    command_id: i as i64,
                    exit_code: 0,
                })
            }
        }))
    }

    #[test]
    fn eligible_span_keeps_recent_events() {
        let service = FixedSummary::new(Ok(String::new()));
        let condenser = LlmCondenser::new(&service, "m");
        assert_eq!(condenser.eligible_span(&history_of(10)), Some(0..6));
        assert_eq!(condenser.eligible_span(&history_of(6)), Some(0..2));
        assert_eq!(condenser.eligible_span(&history_of(5)), None);
        assert_eq!(condenser.eligible_span(&History::new()), None);
    }

    #[test]
    fn summarization_request_covers_only_the_span() {
        let service = FixedSummary::new(Ok(String::new()));
        let condenser = LlmCondenser::new(&service, "m");
        let (system, user) = condenser.build_summarization_request(&history_of(8), 0..4);

        assert!(system.contains("Summarize"));
        assert!(user.contains("[assistant]: \n<execute_bash>\nstep 0\n</execute_bash>"));
        assert!(user.contains("[user]: OBSERVATION:\noutput 3"));
        assert!(!user.contains("step 4"));
    }

    #[test]
    fn estimate_uses_chars_per_token() {
        let service = FixedSummary::new(Ok(String::new()));
        let condenser = LlmCondenser::new(&service, "m");
        assert_eq!(condenser.estimate_token_count(&[Message::user("x".repeat(35))]), 10);
    }

    #[tokio::test]
    async fn condense_returns_summary_for_span() {
        let service = FixedSummary::new(Ok("  Ran steps 0-5.\n".into()));
        let condenser = LlmCondenser::new(&service, "summary-model");
        let condensation = condenser.condense(&history_of(10)).await.unwrap().unwrap();

        assert_eq!(condensation.span, 0..6);
        assert_eq!(condensation.summary, "Ran steps 0-5.");
        assert_eq!(
            condensation.summary_event(),
            Event::action(
                Source::Agent,
                Action::Summarize {
                    summary: "Ran steps 0-5.".into()
                }
            )
        );

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "summary-model");
        assert!(requests[0].stop.is_empty());
        assert_eq!(requests[0].max_tokens, 2048);
    }

    #[tokio::test]
    async fn nothing_to_condense_skips_the_call() {
        let service = FixedSummary::new(Ok("unused".into()));
        let condenser = LlmCondenser::new(&service, "m");
        assert_eq!(condenser.condense(&history_of(3)).await, Ok(None));
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_summary_is_nothing() {
        let service = FixedSummary::new(Ok("   ".into()));
        let condenser = LlmCondenser::new(&service, "m");
        assert_eq!(condenser.condense(&history_of(10)).await, Ok(None));
    }

    #[tokio::test]
    async fn summarization_failure_is_an_error() {
        let service = FixedSummary::new(Err(CompletionError::ContextWindowExceeded(
            "maximum context length".into(),
        )));
        let condenser = LlmCondenser::new(&service, "m");
        let err = condenser.condense(&history_of(10)).await.unwrap_err();
        assert!(err.starts_with("summarization failed:"));
    }

    #[test]
    fn keep_recent_is_configurable() {
        let service = FixedSummary::new(Ok(String::new()));
        let condenser = LlmCondenser::with_config(
            &service,
            "m",
            CondenserConfig {
                keep_recent: 0,
                ..CondenserConfig::default()
            },
        );
        assert_eq!(condenser.eligible_span(&history_of(2)), Some(0..2));
        assert_eq!(condenser.config().keep_recent, 0);
    }

    #[test]
    fn summarization_request_honours_observation_ceiling() {
        let service = FixedSummary::new(Ok(String::new()));
        let condenser = LlmCondenser::with_config(
            &service,
            "m",
            CondenserConfig {
                observation_max_chars: 20,
                ..CondenserConfig::default()
            },
        );
        let history = History::from_events([
            Event::observation(Observation::BrowserOutput {
                content: format!("{}{}", "h".repeat(50), "t".repeat(50)),
            }),
            Event::action(Source::Agent, Action::run_command("ls", "")),
        ]);
        let (_, user) = condenser.build_summarization_request(&history, 0..2);

        assert!(user.contains(&format!("hhhhhhhhhh{TRUNCATION_MARKER}tttttttttt")));
        assert!(!user.contains(&"h".repeat(11)));
    }
}
