//! Agent runtime: the [`CodeActAgent`] turn orchestrator and its supporting types.
//!
//! - [`turn::CodeActAgent`] — runs one turn: render, complete, decode. Start here.
//! - [`config::AgentConfig`] — model, sampling, attempt budget, prompt knobs.
//! - [`state::TaskState`] — history and counters carried across turns.
//! - [`events`] — [`EventHandler`] trait and [`TurnEvent`] enum for
//!   observing a turn. Includes [`LoggingHandler`] and [`FnEventHandler`].

pub mod config;
pub mod events;
pub mod state;
pub mod turn;

// Re-export commonly used items at the module level.
pub use config::AgentConfig;
pub use events::{EventHandler, FnEventHandler, LoggingHandler, NoopHandler, TurnEvent};
pub use state::TaskState;
pub use turn::{CodeActAgent, TurnPhase};
