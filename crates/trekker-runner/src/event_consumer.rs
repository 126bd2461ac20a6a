use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use trekker_automation::{AutomationError, DispatchOutcome, Session};

use crate::event_bus::{EventEnvelope, EventType, SessionEvent};

pub use trekker_events::EventConsumer;

/// Routes bus events into the automation session's lifecycle hooks
pub struct AutomationConsumer {
    session: Arc<Session>,
}

impl AutomationConsumer {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl EventConsumer for AutomationConsumer {
    async fn handle_event(&mut self, envelope: EventEnvelope) {
        match envelope.event {
            EventType::Session(SessionEvent::Ready) => {
                if let Err(e) = self.session.on_ready() {
                    error!(target: "events", "Could not start autowalk: {}", e);
                }
            }
            EventType::Session(SessionEvent::Shutdown { .. }) => {
                self.session.on_shutdown().await;
            }
            EventType::World(notification) => {
                match self.session.on_notification(&notification).await {
                    Ok(DispatchOutcome::Reacted) => {
                        debug!(
                            target: "events",
                            "Reacted to {} {} (seq {})",
                            notification.kind(),
                            notification.subject_id(),
                            envelope.context.sequence
                        );
                    }
                    Ok(DispatchOutcome::Ignored) => {}
                    Err(e @ AutomationError::StateViolation(_)) => {
                        error!(target: "events", "Dispatch hit a state violation: {}", e);
                    }
                    Err(e) => {
                        warn!(target: "events", "Dispatch failed: {}", e);
                    }
                }
            }
        }
    }
}

/// Event consumer that logs every event to the console
pub struct LoggingConsumer;

#[async_trait]
impl EventConsumer for LoggingConsumer {
    async fn handle_event(&mut self, envelope: EventEnvelope) {
        match envelope.event {
            EventType::Session(SessionEvent::Ready) => {
                info!(target: "events", "Agent {} is in the world", envelope.context.agent_id);
            }
            EventType::Session(SessionEvent::Shutdown { reason }) => {
                info!(target: "events", "Agent {} shutting down: {}", envelope.context.agent_id, reason);
            }
            EventType::World(notification) => {
                debug!(
                    target: "events",
                    "[{:?} #{}] {} {} {:?} at {}",
                    envelope.source,
                    envelope.context.sequence,
                    notification.kind(),
                    notification.subject_id(),
                    notification.subject_name(),
                    notification.coordinate()
                );
            }
        }
    }
}
