//! Token budget estimation for rendered prompts.
//!
//! No tokenizer is bundled, so token counts are approximated from character
//! counts. The estimate is only used to decide whether to condense before a
//! request is sent; the completion service remains the authority on whether
//! a prompt actually fits.

use crate::Message;

/// Default characters per token (conservative estimate for English text).
/// Most tokenizers average 3-4 chars per token; we use 3.5 as a middle ground.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// Estimates prompt size in tokens from character counts.
///
/// # Example
///
/// ```ignore
/// let estimator = TokenEstimator::default();
/// let usage = estimator.usage(&messages, 100_000);
/// println!("{}", usage.to_log_string());
/// if usage.exceeds_limit() {
///     // condense before sending
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TokenEstimator {
    chars_per_token: f64,
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self {
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl TokenEstimator {
    /// Create an estimator with a calibrated chars-per-token ratio. Pass
    /// `None` (or a non-positive ratio) to use the default.
    pub fn with_calibration(calibrated_cpt: Option<f64>) -> Self {
        match calibrated_cpt {
            Some(cpt) if cpt > 0.0 => Self {
                chars_per_token: cpt,
            },
            _ => Self::default(),
        }
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }

    /// Estimated tokens for a single piece of text, rounded up.
    pub fn estimate_text(&self, text: &str) -> usize {
        let chars = text.chars().count();
        (chars as f64 / self.chars_per_token).ceil() as usize
    }

    /// Estimated tokens for a full message list, rounded up.
    pub fn estimate(&self, messages: &[Message]) -> usize {
        let chars: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        (chars as f64 / self.chars_per_token).ceil() as usize
    }

    /// Snapshot of usage against an input-token ceiling.
    pub fn usage(&self, messages: &[Message], max_tokens: usize) -> ContextUsage {
        ContextUsage::new(self.estimate(messages), max_tokens)
    }
}

/// Snapshot of context usage at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextUsage {
    /// Estimated tokens consumed.
    pub estimated_tokens: usize,
    /// Configured input-token ceiling.
    pub max_tokens: usize,
    /// Usage as a fraction (0.0 to 1.0+).
    pub usage_pct: f64,
}

impl ContextUsage {
    pub fn new(estimated_tokens: usize, max_tokens: usize) -> Self {
        let usage_pct = if max_tokens > 0 {
            estimated_tokens as f64 / max_tokens as f64
        } else {
            1.0
        };
        Self {
            estimated_tokens,
            max_tokens,
            usage_pct,
        }
    }

    /// Strictly over the ceiling. A prompt exactly at the ceiling still fits.
    pub fn exceeds_limit(&self) -> bool {
        self.estimated_tokens > self.max_tokens
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "context: ~{} tokens ({:.0}% of {})",
            self.estimated_tokens,
            self.usage_pct * 100.0,
            self.max_tokens,
        )
    }
}
