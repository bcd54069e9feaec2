//! Overflow recovery: shrink history when the prompt no longer fits.
//!
//! Two triggers lead here. The pre-emptive one fires before a request when
//! a configured input-token ceiling is set and the condenser's estimate of
//! the rendered prompt is over it. The reactive one fires when the
//! completion service reports a context-window overflow. Both run the same
//! recovery: ask the condenser for a summary and splice it into history.
//! If there is no condenser, or it has nothing left to give, the turn
//! cannot proceed and [`TurnError::ContextWindowLimit`] is returned.

use super::budget::ContextUsage;
use super::condenser::Condenser;
use crate::Message;
use crate::error::TurnError;
use crate::history::History;
use tracing::{debug, warn};

/// What caused a recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowTrigger {
    /// Estimated prompt size over the configured ceiling.
    Preemptive,
    /// The completion service rejected the prompt.
    Reactive,
}

impl std::fmt::Display for OverflowTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverflowTrigger::Preemptive => write!(f, "pre-emptive"),
            OverflowTrigger::Reactive => write!(f, "reactive"),
        }
    }
}

/// Result of a successful recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recovered {
    /// Live events folded into the summary.
    pub replaced: usize,
    /// Live history length after the splice.
    pub remaining: usize,
}

/// Overflow recovery controller for one turn.
pub struct OverflowRecovery<'a> {
    condenser: Option<&'a dyn Condenser>,
    max_input_tokens: Option<usize>,
}

impl<'a> OverflowRecovery<'a> {
    pub fn new(condenser: Option<&'a dyn Condenser>, max_input_tokens: Option<usize>) -> Self {
        Self {
            condenser,
            max_input_tokens,
        }
    }

    /// Estimated usage, if the prompt should be condensed before it is
    /// sent. Needs both a ceiling and a condenser to estimate with.
    pub fn preemptive_overflow(&self, messages: &[Message]) -> Option<ContextUsage> {
        let limit = self.max_input_tokens?;
        let condenser = self.condenser?;
        let usage = ContextUsage::new(condenser.estimate_token_count(messages), limit);
        debug!("{}", usage.to_log_string());
        usage.exceeds_limit().then_some(usage)
    }

    /// Condense `history` in place.
    ///
    /// Any outcome other than a summary over a valid span is fatal.
    pub async fn recover(
        &self,
        history: &mut History,
        trigger: OverflowTrigger,
    ) -> Result<Recovered, TurnError> {
        let Some(condenser) = self.condenser else {
            warn!(%trigger, "Context overflow with no condenser configured");
            return Err(TurnError::ContextWindowLimit);
        };

        let condensation = match condenser.condense(history).await {
            Ok(Some(condensation)) => condensation,
            Ok(None) => {
                warn!(%trigger, live = history.len(), "Context overflow: nothing left to condense");
                return Err(TurnError::ContextWindowLimit);
            }
            Err(e) => {
                warn!(%trigger, "Context overflow: condensation failed: {e}");
                return Err(TurnError::ContextWindowLimit);
            }
        };

        let replaced = condensation.span.len();
        if let Err(e) = history.replace_span_with_summary(
            condensation.span.clone(),
            condensation.summary_event(),
        ) {
            warn!(%trigger, "Context overflow: rejected condensation: {e}");
            return Err(TurnError::ContextWindowLimit);
        }

        Ok(Recovered {
            replaced,
            remaining: history.len(),
        })
    }
}
