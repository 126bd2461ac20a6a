/// Core event types for trekker
///
/// World notifications, session lifecycle events and the consumer trait live
/// here so the automation core and the runner can share them without
/// depending on each other.
use std::time::Instant;

mod world_events;

pub use world_events::{Coordinate, NotificationKind, ObjectId, WorldNotification};

// ============================================================================
// Event Source and Context
// ============================================================================

/// Source of the event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// Reported by the game world (host client)
    World,
    /// Raised by the session lifecycle (ready, shutdown)
    Session,
    /// Produced by a simulator or test harness
    Simulated,
}

/// Context information attached to all events
#[derive(Debug, Clone)]
pub struct EventContext {
    /// ID of the agent this event belongs to
    pub agent_id: u32,
    /// Sequence number for this event, relative to the agent
    pub sequence: u64,
}

impl EventContext {
    pub fn new(agent_id: u32, sequence: u64) -> Self {
        Self { agent_id, sequence }
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// Session lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The character is in the world and automation may begin
    Ready,
    /// The session is going away
    Shutdown { reason: String },
}

/// Unified event type carried on the bus
#[derive(Debug, Clone)]
pub enum EventType {
    World(WorldNotification),
    Session(SessionEvent),
}

// ============================================================================
// Event Envelope
// ============================================================================

/// Complete event envelope
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub event: EventType,
    pub context: EventContext,
    pub timestamp: Instant,
    pub source: EventSource,
}

impl EventEnvelope {
    pub fn new(event: EventType, context: EventContext, source: EventSource) -> Self {
        Self {
            event,
            context,
            timestamp: Instant::now(),
            source,
        }
    }

    pub fn world_event(
        notification: WorldNotification,
        agent_id: u32,
        sequence: u64,
        source: EventSource,
    ) -> Self {
        let context = EventContext::new(agent_id, sequence);
        Self::new(EventType::World(notification), context, source)
    }

    pub fn session_event(session_event: SessionEvent, agent_id: u32, sequence: u64) -> Self {
        let context = EventContext::new(agent_id, sequence);
        Self::new(
            EventType::Session(session_event),
            context,
            EventSource::Session,
        )
    }

    pub fn world_notification(&self) -> Option<&WorldNotification> {
        match &self.event {
            EventType::World(notification) => Some(notification),
            _ => None,
        }
    }
}

// ============================================================================
// Event Consumer Trait
// ============================================================================

/// Trait for consuming events off the bus
///
/// Consumers are driven one envelope at a time, in publication order.
#[async_trait::async_trait]
pub trait EventConsumer: Send + 'static {
    /// Handle an event envelope
    async fn handle_event(&mut self, envelope: EventEnvelope);
}
