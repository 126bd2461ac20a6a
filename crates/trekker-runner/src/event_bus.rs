// Event bus infrastructure
// The runner owns the bus; producers hold an EventSender, consumers a receiver

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

pub use trekker_events::{EventContext, EventEnvelope, EventSource, EventType, SessionEvent};
use trekker_events::WorldNotification;

/// Event sender that producers use to publish events for one agent
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: broadcast::Sender<EventEnvelope>,
    agent_id: u32,
    sequence: Arc<AtomicU64>,
}

impl EventSender {
    fn new(sender: broadcast::Sender<EventEnvelope>, agent_id: u32) -> Self {
        Self {
            sender,
            agent_id,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn publish(&self, envelope: EventEnvelope) {
        let _ = self.sender.send(envelope);
    }

    pub fn publish_world(&self, notification: WorldNotification, source: EventSource) {
        let envelope =
            EventEnvelope::world_event(notification, self.agent_id, self.next_sequence(), source);
        self.publish(envelope);
    }

    pub fn publish_session(&self, event: SessionEvent) {
        let envelope = EventEnvelope::session_event(event, self.agent_id, self.next_sequence());
        self.publish(envelope);
    }

    pub fn agent_id(&self) -> u32 {
        self.agent_id
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }
}

/// Central event bus that manages event distribution
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<EventEnvelope>) {
        let (sender, receiver) = broadcast::channel(capacity);
        (EventBus { sender }, receiver)
    }

    pub fn create_sender(&self, agent_id: u32) -> EventSender {
        EventSender::new(self.sender.clone(), agent_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trekker_events::Coordinate;

    #[tokio::test]
    async fn test_sequence_numbers_increase_per_sender() {
        let (bus, mut rx) = EventBus::new(16);
        let sender = bus.create_sender(3);

        sender.publish_session(SessionEvent::Ready);
        sender.publish_world(
            WorldNotification::PlayerFound {
                id: 1,
                is_kin: true,
                coord: Coordinate::new(0, 0),
            },
            EventSource::World,
        );

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.context.agent_id, 3);
        assert_eq!(first.context.sequence, 0);
        assert_eq!(first.source, EventSource::Session);
        assert_eq!(second.context.sequence, 1);
        assert!(second.world_notification().is_some());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_harmless() {
        let (bus, rx) = EventBus::new(4);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 0);
        bus.create_sender(0).publish_session(SessionEvent::Ready);
    }
}
