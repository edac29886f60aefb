//! Ledger events: the event contract, journal envelopes and projections.

mod envelope;
mod event;
mod handler;
mod projection;

pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use projection::Projection;
