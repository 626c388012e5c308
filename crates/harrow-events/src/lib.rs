//! Event bus for the Harrow transfer engine.
//!
//! Every noteworthy scheduling step (a unit queued, a transfer finished, a
//! destination retired) is published as a typed [`Event`]. The bus keeps a
//! bounded replay ring so late subscribers can catch up on recent history;
//! when the broadcast channel overflows, the oldest events are dropped.

pub mod bus;
pub mod payloads;

pub use bus::{EventBus, EventStream};
pub use payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};
