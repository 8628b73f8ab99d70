//! Event emission.
//!
//! Every committed state change is appended to an in-memory audit journal
//! and broadcast to live subscribers. Subscribers that fall behind by more
//! than the channel capacity miss events; the journal never does.

use harvest_types::events::{Event, EventKind};
use harvest_types::Timestamp;
use tokio::sync::broadcast;

/// Per-subscriber buffer before lagging receivers start dropping events.
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Journal plus broadcast channel.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    journal: Vec<Event>,
    sequence: u64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            journal: Vec::new(),
            sequence: 0,
        }
    }

    /// Record and broadcast an event. Returns its sequence number.
    pub fn emit(&mut self, timestamp: Timestamp, kind: EventKind) -> u64 {
        self.sequence += 1;
        let event = Event {
            sequence: self.sequence,
            timestamp,
            kind,
        };
        tracing::trace!(sequence = event.sequence, event = event.kind.name(), "event emitted");
        // No subscribers is fine.
        let _ = self.sender.send(event.clone());
        self.journal.push(event);
        self.sequence
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// All events emitted so far, oldest first.
    pub fn journal(&self) -> &[Event] {
        &self.journal
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_types::Address;

    fn withdrawn(amount: u128) -> EventKind {
        EventKind::ExcessWithdrawn {
            to: Address::repeat(1),
            amount,
        }
    }

    #[test]
    fn test_sequence_and_journal() {
        let mut bus = EventBus::default();
        assert_eq!(bus.emit(10, withdrawn(1)), 1);
        assert_eq!(bus.emit(11, withdrawn(2)), 2);
        assert_eq!(bus.sequence(), 2);
        assert_eq!(bus.journal().len(), 2);
        assert_eq!(bus.journal()[1].timestamp, 11);
    }

    #[test]
    fn test_subscriber_receives_events() {
        let mut bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.emit(10, withdrawn(7));
        let event = rx.try_recv().expect("event delivered");
        assert_eq!(event.sequence, 1);
        assert_eq!(event.kind, withdrawn(7));
    }
}
