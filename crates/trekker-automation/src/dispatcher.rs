use std::sync::Arc;

use tracing::{debug, info, warn};
use trekker_events::{ObjectId, WorldNotification};

use crate::controller::AutomationController;
use crate::error::{AutomationError, GatewayError};
use crate::gateway::ActionGateway;
use crate::policy::{CreatureClass, CurioClass, Policy, PlayerClass};

/// What a dispatch did with a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Benign or unclassified, or autowalk was not running; movement untouched
    Ignored,
    /// Autowalk was suspended and a reaction ran
    Reacted,
}

/// Classifies world notifications and turns the interesting ones into
/// suspend/react/resume cycles on the controller
#[derive(Clone)]
pub struct EventDispatcher {
    controller: AutomationController,
    gateway: Arc<dyn ActionGateway>,
    policy: Arc<Policy>,
}

impl EventDispatcher {
    pub fn new(
        controller: AutomationController,
        gateway: Arc<dyn ActionGateway>,
        policy: Arc<Policy>,
    ) -> Self {
        Self {
            controller,
            gateway,
            policy,
        }
    }

    pub async fn dispatch(
        &self,
        notification: &WorldNotification,
    ) -> Result<DispatchOutcome, AutomationError> {
        let result = match notification {
            WorldNotification::CurioFound { id, name, coord } => {
                info!(target: "dispatch", "Curio \"{}\" found at {}, trying to pick it", name, coord);
                let class = self.policy.classify_curio(name);
                let gateway = self.gateway.clone();
                self.controller
                    .suspend_for("curio found", || collect_curio(gateway, *id, name, class))
                    .await
            }
            WorldNotification::CreatureFound { name, coord, .. } => {
                match self.policy.classify_creature(name) {
                    CreatureClass::Benign => {
                        debug!(target: "dispatch", "Creature \"{}\" at {} is benign", name, coord);
                        return Ok(DispatchOutcome::Ignored);
                    }
                    CreatureClass::Hostile => {
                        info!(
                            target: "dispatch",
                            "Creature \"{}\" encountered at {}, retreating to safe point",
                            name,
                            coord
                        );
                        self.retreat("hostile creature").await
                    }
                }
            }
            WorldNotification::PlayerFound { id, is_kin, coord } => {
                match self.policy.classify_player(*is_kin) {
                    PlayerClass::Kin => {
                        debug!(target: "dispatch", "Kin player {} at {}", id, coord);
                        return Ok(DispatchOutcome::Ignored);
                    }
                    PlayerClass::Stranger => {
                        info!(
                            target: "dispatch",
                            "Non-kin player {} encountered at {}, retreating to safe point",
                            id,
                            coord
                        );
                        self.retreat("non-kin player").await
                    }
                }
            }
        };

        match result {
            Ok(()) => Ok(DispatchOutcome::Reacted),
            Err(AutomationError::NotRunning) => {
                debug!(
                    target: "dispatch",
                    "Autowalk not running, {} {} ignored",
                    notification.kind(),
                    notification.subject_id()
                );
                Ok(DispatchOutcome::Ignored)
            }
            Err(e) => Err(e),
        }
    }

    async fn retreat(&self, reason: &str) -> Result<(), AutomationError> {
        let gateway = self.gateway.clone();
        self.controller
            .suspend_for(reason, || async move { gateway.retreat_to_safe_point().await })
            .await
    }
}

/// Pick the curio, then commit it if policy says so and capacity allows
async fn collect_curio(
    gateway: Arc<dyn ActionGateway>,
    id: ObjectId,
    name: &str,
    class: CurioClass,
) -> Result<(), GatewayError> {
    if !gateway.pick_up(id).await? {
        warn!(target: "dispatch", "Curio \"{}\" ({}) is no longer there", name, id);
        return Ok(());
    }

    let CurioClass::Collectible { cost } = class else {
        return Ok(());
    };

    let capacity = gateway.query_capacity().await?;
    if !capacity.can_afford(cost) {
        info!(
            target: "dispatch",
            "Not enough capacity to commit \"{}\" (cost {}, free {})",
            name,
            cost,
            capacity.free()
        );
        return Ok(());
    }

    info!(target: "dispatch", "Committing curio \"{}\"", name);
    if !gateway.commit_item(name).await? {
        warn!(target: "dispatch", "Commit of \"{}\" was refused", name);
    }
    Ok(())
}
