mod event_consumer;
pub mod event_bus;
mod event_wrapper;
pub mod logging;
mod runner;
pub mod simulated_world;

pub use event_bus::{
    EventBus, EventContext, EventEnvelope, EventSender, EventSource, EventType, SessionEvent,
};
pub use event_consumer::{AutomationConsumer, EventConsumer, LoggingConsumer};
pub use event_wrapper::EventWrapper;
pub use logging::init_logging;
pub use runner::{run_consumers, spawn_consumers};
pub use simulated_world::{spawn_notification_feed, NotificationFeed, SimulatedWorld, WorldCounters};
