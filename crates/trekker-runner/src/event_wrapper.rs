use tokio::sync::mpsc;
use trekker_events::{EventSource, WorldNotification};

use crate::event_bus::EventSender;

/// Wraps raw world notifications from the host bridge and publishes them as envelopes
pub struct EventWrapper {
    sender: EventSender,
    source: EventSource,
}

impl EventWrapper {
    pub fn new(sender: EventSender, source: EventSource) -> Self {
        Self { sender, source }
    }

    /// Run until the raw channel closes
    pub async fn run(self, mut raw_rx: mpsc::Receiver<WorldNotification>) {
        tracing::info!(target: "event_wrapper", "EventWrapper started for agent {}", self.sender.agent_id());
        while let Some(notification) = raw_rx.recv().await {
            tracing::debug!(
                target: "event_wrapper",
                "Publishing {} {}",
                notification.kind(),
                notification.subject_id()
            );
            self.sender.publish_world(notification, self.source);
        }
        tracing::debug!(target: "event_wrapper", "EventWrapper stopped - no more notifications");
    }
}
