//! In-process broadcast bus with a bounded replay ring.
//!
//! Publishing assigns the id, records the envelope and broadcasts it under one
//! lock, so ids, ring order and delivery order always agree. Subscribing takes
//! the same lock, which means a replayed backlog never overlaps or misses the
//! live feed that follows it.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError};

use crate::payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId};

struct Ring {
    entries: VecDeque<EventEnvelope>,
    capacity: usize,
    last_id: EventId,
}

impl Ring {
    fn push(&mut self, envelope: EventEnvelope) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(envelope);
    }

    fn after(&self, id: EventId) -> impl Iterator<Item = &EventEnvelope> {
        self.entries.iter().filter(move |envelope| envelope.id > id)
    }
}

struct Shared {
    sender: Sender<EventEnvelope>,
    ring: Mutex<Ring>,
}

/// Cloneable handle to one bus.
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    /// A bus whose broadcast buffer and replay ring both hold `capacity`
    /// envelopes. A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            shared: Arc::new(Shared {
                sender,
                ring: Mutex::new(Ring {
                    entries: VecDeque::with_capacity(capacity),
                    capacity,
                    last_id: 0,
                }),
            }),
        }
    }

    /// A bus sized by [`DEFAULT_REPLAY_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish `event` and return its id. Never blocks on subscribers.
    pub fn publish(&self, event: Event) -> EventId {
        let mut ring = self.ring();
        ring.last_id += 1;
        let envelope = EventEnvelope {
            id: ring.last_id,
            timestamp: Utc::now(),
            event,
        };
        ring.push(envelope.clone());
        // No receivers is not an error here.
        let _ = self.shared.sender.send(envelope);
        ring.last_id
    }

    /// Start receiving. With `Some(id)`, ring entries newer than `id` are
    /// delivered first.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let ring = self.ring();
        let backlog = since_id
            .map(|since| ring.after(since).cloned().collect())
            .unwrap_or_default();
        EventStream {
            backlog,
            receiver: self.shared.sender.subscribe(),
            lagged: 0,
        }
    }

    /// Id of the most recent envelope still in the ring.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.ring().entries.back().map(|envelope| envelope.id)
    }

    /// Ring entries newer than `id`, oldest first.
    #[must_use]
    pub fn backlog_since(&self, id: EventId) -> Vec<EventEnvelope> {
        self.ring().after(id).cloned().collect()
    }

    fn ring(&self) -> MutexGuard<'_, Ring> {
        self.shared
            .ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber: replayed backlog first, then live envelopes.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
    lagged: u64,
}

impl EventStream {
    /// Next envelope; `None` once every bus handle has been dropped.
    ///
    /// A subscriber that falls behind the broadcast buffer skips ahead to the
    /// oldest envelope still buffered; [`EventStream::lagged`] counts the loss.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(envelope) = self.backlog.pop_front() {
            return Some(envelope);
        }
        loop {
            match self.receiver.recv().await {
                Ok(envelope) => return Some(envelope),
                Err(RecvError::Lagged(missed)) => self.lagged += missed,
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Envelopes this subscriber never saw because it fell behind.
    #[must_use]
    pub const fn lagged(&self) -> u64 {
        self.lagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retired(index: usize) -> Event {
        Event::DestinationRetired {
            destination: format!("nas{index}::plots"),
            reason: "file_io".into(),
        }
    }

    #[tokio::test]
    async fn replay_then_live_without_gaps() {
        let bus = EventBus::with_capacity(8);
        for index in 0..3 {
            bus.publish(retired(index));
        }
        let mut stream = bus.subscribe(Some(1));
        bus.publish(retired(3));

        let mut ids = Vec::new();
        for _ in 0..3 {
            if let Some(envelope) = stream.next().await {
                ids.push(envelope.id);
            }
        }
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(bus.last_event_id(), Some(4));
    }

    #[test]
    fn ring_keeps_only_the_newest_entries() {
        let bus = EventBus::with_capacity(3);
        for index in 0..5 {
            bus.publish(retired(index));
        }
        let ids: Vec<_> = bus.backlog_since(0).iter().map(|env| env.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(bus.backlog_since(5).is_empty());
    }

    #[test]
    fn zero_capacity_still_records_the_latest_event() {
        let bus = EventBus::with_capacity(0);
        bus.publish(retired(0));
        bus.publish(retired(1));
        assert_eq!(bus.backlog_since(0).len(), 1);
        assert_eq!(bus.last_event_id(), Some(2));
    }

    #[tokio::test]
    async fn slow_subscriber_skips_ahead_and_counts_the_loss() {
        let bus = EventBus::with_capacity(2);
        let mut stream = bus.subscribe(None);
        for index in 0..5 {
            bus.publish(retired(index));
        }
        let first = stream.next().await.map(|envelope| envelope.id);
        assert_eq!(first, Some(4));
        assert_eq!(stream.lagged(), 3);
    }

    #[tokio::test]
    async fn stream_ends_when_the_bus_is_dropped() {
        let bus = EventBus::with_capacity(4);
        let mut stream = bus.subscribe(None);
        drop(bus);
        assert!(stream.next().await.is_none());
    }
}
