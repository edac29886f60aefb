use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// The stream is the source of truth; the read model is a cache that can be
/// dropped and rebuilt by applying the stream again from the start.
///
/// ## Exactly once
///
/// Projections here are **not** idempotent: applying the same envelope twice
/// counts it twice. The owner of the stream must apply each envelope exactly
/// once, in sequence order, in the same step that appends it.
///
/// ## Error Handling
///
/// `apply` is infallible. Anything that can reject an event must do so before
/// the event is appended to the stream.
pub trait Projection {
    type Ev: Event;

    /// Apply a single envelope, updating the read model.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);

    /// Drop all derived state.
    fn clear(&mut self);
}
