//! Per-task state carried across turns.

use crate::history::History;

/// Everything a turn reads and mutates for one task.
///
/// The caller owns the iteration counter and bumps it between turns; a turn
/// only appends to `num_of_chars` and, when recovering from an overflow,
/// condenses `history`.
#[derive(Debug, Clone, Default)]
pub struct TaskState {
    pub history: History,
    /// Turns taken so far.
    pub iteration: u32,
    pub max_iterations: u32,
    /// Characters sent and received, summed over every completion. A cost proxy.
    pub num_of_chars: u64,
}

impl TaskState {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn with_iteration(mut self, iteration: u32) -> Self {
        self.iteration = iteration;
        self
    }

    /// Turns left before the iteration bound. Never negative.
    pub fn remaining_iterations(&self) -> u32 {
        self.max_iterations.saturating_sub(self.iteration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty() {
        let state = TaskState::new(30);
        assert!(state.history.is_empty());
        assert_eq!(state.iteration, 0);
        assert_eq!(state.num_of_chars, 0);
        assert_eq!(state.remaining_iterations(), 30);
    }

    #[test]
    fn remaining_saturates() {
        assert_eq!(TaskState::new(5).with_iteration(3).remaining_iterations(), 2);
        assert_eq!(TaskState::new(5).with_iteration(9).remaining_iterations(), 0);
    }
}
