//! Context window management: estimation, condensation, and overflow recovery.
//!
//! 1. **[`budget`]** — [`TokenEstimator`] approximates prompt size from
//!    character counts.
//!
//! 2. **[`condenser`]** — the [`Condenser`] seam and [`LlmCondenser`], which
//!    folds old history into one summary event with a single LLM call.
//!
//! 3. **[`recovery`]** — [`OverflowRecovery`] decides when to condense and
//!    splices the result into history, or gives up with a fatal error.
//!
//! The [`CodeActAgent`](crate::agent::CodeActAgent) turn loop drives all
//! three.

pub mod budget;
pub mod condenser;
pub mod recovery;

pub use budget::{ContextUsage, DEFAULT_CHARS_PER_TOKEN, TokenEstimator};
pub use condenser::{Condensation, CondenseFuture, Condenser, CondenserConfig, LlmCondenser};
pub use recovery::{OverflowRecovery, OverflowTrigger, Recovered};
