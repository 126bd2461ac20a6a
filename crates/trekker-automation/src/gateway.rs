use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trekker_events::{Coordinate, ObjectId};

use crate::error::GatewayError;

/// Bounded resource consumed by committing curios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capacity {
    pub max: u32,
    pub used: u32,
}

impl Capacity {
    pub fn free(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }

    /// Whether `cost` more still fits, i.e. `used + cost <= max`
    pub fn can_afford(&self, cost: u32) -> bool {
        self.used
            .checked_add(cost)
            .is_some_and(|total| total <= self.max)
    }
}

/// Actions the automation core can perform against the game world.
///
/// Implemented by the bridge to the host client. Every call may fail, and a
/// failure says nothing about whether the world action partly happened.
#[async_trait]
pub trait ActionGateway: Send + Sync + 'static {
    /// Current position of the character
    async fn get_position(&self) -> Result<Coordinate, GatewayError>;

    /// Walk (with pathfinding) towards `target`
    async fn move_to(&self, target: Coordinate) -> Result<(), GatewayError>;

    /// Pick the forageable object `id`. Returns false if no such object exists.
    async fn pick_up(&self, id: ObjectId) -> Result<bool, GatewayError>;

    async fn query_capacity(&self) -> Result<Capacity, GatewayError>;

    /// Commit (study) the inventory item `name`
    async fn commit_item(&self, name: &str) -> Result<bool, GatewayError>;

    async fn retreat_to_safe_point(&self) -> Result<(), GatewayError>;
}
