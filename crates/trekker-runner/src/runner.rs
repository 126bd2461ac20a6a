use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::event_bus::{EventEnvelope, EventType, SessionEvent};
use crate::event_consumer::EventConsumer;

/// Drive `consumers` from one receiver until the session shuts down.
///
/// Every consumer sees every envelope, in publish order. The loop ends after
/// a `Shutdown` envelope has been handled by all consumers, when the bus
/// closes, or when `shutdown_rx` flips to true.
pub async fn run_consumers(
    mut event_rx: broadcast::Receiver<EventEnvelope>,
    mut consumers: Vec<Box<dyn EventConsumer>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(target: "events", "Running {} event consumers", consumers.len());

    loop {
        tokio::select! {
            received = event_rx.recv() => {
                match received {
                    Ok(envelope) => {
                        let is_shutdown =
                            matches!(envelope.event, EventType::Session(SessionEvent::Shutdown { .. }));
                        for consumer in consumers.iter_mut() {
                            consumer.handle_event(envelope.clone()).await;
                        }
                        if is_shutdown {
                            info!(target: "events", "Consumers received shutdown signal");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        error!(target: "events", "Consumers lagged, {} messages were skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(target: "events", "Event channel closed");
                        break;
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!(target: "events", "Shutdown signalled, stopping consumers");
                    break;
                }
            }
        }
    }

    info!(target: "events", "Event consumers stopped");
}

/// Spawn [`run_consumers`] on the runtime
pub fn spawn_consumers(
    event_rx: broadcast::Receiver<EventEnvelope>,
    consumers: Vec<Box<dyn EventConsumer>>,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run_consumers(event_rx, consumers, shutdown_rx))
}
