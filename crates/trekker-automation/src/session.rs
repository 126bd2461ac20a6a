use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};
use trekker_events::WorldNotification;

use crate::config::TrekkerConfig;
use crate::controller::{AutomationController, AutomationState};
use crate::dispatcher::{DispatchOutcome, EventDispatcher};
use crate::error::AutomationError;
use crate::gateway::ActionGateway;
use crate::policy::Policy;
use crate::timer::TimerService;

/// Top-level world session: owns the readiness flag and wires lifecycle hooks
/// to the controller and dispatcher.
///
/// Notifications can arrive before the character is in the world; until
/// [`Session::on_ready`] has run they are dropped.
pub struct Session {
    ready: AtomicBool,
    controller: AutomationController,
    dispatcher: EventDispatcher,
}

impl Session {
    pub fn new(config: &TrekkerConfig, gateway: Arc<dyn ActionGateway>) -> Self {
        Self::with_timers(config, gateway, TimerService::new())
    }

    pub fn with_timers(
        config: &TrekkerConfig,
        gateway: Arc<dyn ActionGateway>,
        timers: TimerService,
    ) -> Self {
        let controller =
            AutomationController::new(config.automation.clone(), gateway.clone(), timers);
        let policy = Arc::new(Policy::from_config(&config.policy));
        let dispatcher = EventDispatcher::new(controller.clone(), gateway, policy);

        Self {
            ready: AtomicBool::new(false),
            controller,
            dispatcher,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn controller(&self) -> &AutomationController {
        &self.controller
    }

    pub fn state(&self) -> AutomationState {
        self.controller.state()
    }

    /// The character entered the world: start autowalking
    pub fn on_ready(&self) -> Result<(), AutomationError> {
        self.ready.store(true, Ordering::SeqCst);
        info!(target: "session", "World ready, starting autowalk");
        self.controller.start()
    }

    /// Sole entry point for world notifications
    pub async fn on_notification(
        &self,
        notification: &WorldNotification,
    ) -> Result<DispatchOutcome, AutomationError> {
        if !self.is_ready() {
            debug!(
                target: "session",
                "World not ready, dropping {} {}",
                notification.kind(),
                notification.subject_id()
            );
            return Ok(DispatchOutcome::Ignored);
        }
        self.dispatcher.dispatch(notification).await
    }

    pub async fn on_shutdown(&self) {
        self.ready.store(false, Ordering::SeqCst);
        info!(target: "session", "Session shutting down");
        self.controller.stop().await;
    }
}
