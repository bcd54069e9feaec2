//! Task history: an append-only arena of [`Event`]s plus a live index.
//!
//! Events are never mutated or freed once pushed. Condensation does not
//! delete anything from the arena; it rewrites the live index so that a
//! span of event ids is replaced by the id of a single summary event. Every
//! reader (the renderer, the condenser) sees only the live view.

mod event;

pub use event::{Action, Event, Observation, Source};

use crate::error::HistoryError;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// Stable handle to an event in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(usize);

impl EventId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered event log for one task.
#[derive(Debug, Clone, Default)]
pub struct History {
    arena: Vec<Event>,
    live: Vec<EventId>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history whose live view is exactly `events`, in order.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        let mut history = Self::new();
        for event in events {
            history.push(event);
        }
        history
    }

    /// Load a history from a JSON file holding an array of events.
    pub fn load_json(path: &Path) -> Result<Self, HistoryError> {
        let raw = std::fs::read_to_string(path)?;
        let events: Vec<Event> = serde_json::from_str(&raw)?;
        debug!("Loaded {} event(s) from {}", events.len(), path.display());
        Ok(Self::from_events(events))
    }

    /// Append an event to the end of the live view.
    pub fn push(&mut self, event: Event) -> EventId {
        let id = EventId(self.arena.len());
        self.arena.push(event);
        self.live.push(id);
        id
    }

    /// Number of live events.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Total events ever recorded, including ones hidden by summaries.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Look up any event in the arena, live or not.
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.arena.get(id.0)
    }

    pub fn live_ids(&self) -> &[EventId] {
        &self.live
    }

    /// Iterate the live view in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Event> + ExactSizeIterator + '_ {
        self.live.iter().map(|id| &self.arena[id.0])
    }

    /// Replace the live events at positions `span` with a single summary
    /// event. The replaced events stay in the arena.
    ///
    /// The span must be non-empty and lie within the live view, so the live
    /// length never grows.
    pub fn replace_span_with_summary(
        &mut self,
        span: Range<usize>,
        summary: Event,
    ) -> Result<EventId, HistoryError> {
        if span.start >= span.end || span.end > self.live.len() {
            return Err(HistoryError::InvalidSpan {
                start: span.start,
                end: span.end,
                len: self.live.len(),
            });
        }
        let id = EventId(self.arena.len());
        self.arena.push(summary);
        let replaced = span.len();
        self.live.splice(span, std::iter::once(id));
        debug!(
            "Spliced summary over {replaced} event(s); {} live of {} recorded",
            self.live.len(),
            self.arena.len()
        );
        Ok(id)
    }
}
