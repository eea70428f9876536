// 🧺 Row/Line Accumulator - Record boundary state machine
// Owns the "current record under construction" for exactly one source unit.
// Adapters decide what counts as a new-record signal; the transitions here
// are identical for every format and testable without any I/O loop.

use crate::record::{DraftField, DraftRecord};

// ============================================================================
// EVENTS
// ============================================================================

/// One step of record assembly, as seen by the accumulator.
#[derive(Debug, Clone)]
pub enum AccumulatorEvent {
    /// A new record begins. Flushes the record in progress (when it carries
    /// any data) and installs the seed as the new current draft.
    NewRecord(DraftRecord),

    /// A candidate value for one field of the record in progress.
    /// Ignored when no record is in progress (stray continuation lines
    /// before the first record drop harmlessly, they never crash).
    Field { field: DraftField, value: String },

    /// End of the source unit. Same flush behavior as `NewRecord`.
    EndOfInput,
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// State: the nullable current draft plus the completed output list.
#[derive(Debug, Default)]
pub struct Accumulator {
    current: Option<DraftRecord>,
    completed: Vec<DraftRecord>,
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator::default()
    }

    /// Apply one event. First-match-wins field population is delegated to
    /// `DraftRecord::set_if_absent`.
    pub fn apply(&mut self, event: AccumulatorEvent) {
        match event {
            AccumulatorEvent::NewRecord(seed) => {
                self.flush();
                self.current = Some(seed);
            }
            AccumulatorEvent::Field { field, value } => {
                if let Some(draft) = self.current.as_mut() {
                    draft.set_if_absent(field, &value);
                }
            }
            AccumulatorEvent::EndOfInput => self.flush(),
        }
    }

    /// Whether a record is currently in progress.
    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    /// Direct access to the record in progress, for adapter steps that go
    /// beyond single-field candidates (raw provenance, category tags).
    pub fn current_mut(&mut self) -> Option<&mut DraftRecord> {
        self.current.as_mut()
    }

    /// Consume the accumulator, flushing the record in progress.
    pub fn finish(mut self) -> Vec<DraftRecord> {
        self.apply(AccumulatorEvent::EndOfInput);
        self.completed
    }

    // A draft flushes when it carries any data at all. Named drafts are
    // valid; nameless-but-nonempty drafts still flush and get flagged by
    // data quality later. Completely blank drafts are discarded.
    fn flush(&mut self) {
        if let Some(draft) = self.current.take() {
            if !draft.is_blank() {
                self.completed.push(draft);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
