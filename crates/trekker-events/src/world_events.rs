use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the game world assigns to an object (curio, creature, player)
pub type ObjectId = u64;

/// A position on the world map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`, clamping at the edges of the integer range
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Kind of a world notification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum NotificationKind {
    #[strum(serialize = "curio found")]
    CurioFound,
    #[strum(serialize = "creature found")]
    CreatureFound,
    #[strum(serialize = "player found")]
    PlayerFound,
}

/// Something the world told us about. Each one is delivered once per sighted object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldNotification {
    /// A forageable curio came into view
    CurioFound {
        id: ObjectId,
        name: String,
        coord: Coordinate,
    },
    /// A creature came into view
    CreatureFound {
        id: ObjectId,
        name: String,
        coord: Coordinate,
    },
    /// Another player came into view
    PlayerFound {
        id: ObjectId,
        is_kin: bool,
        coord: Coordinate,
    },
}

impl WorldNotification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            WorldNotification::CurioFound { .. } => NotificationKind::CurioFound,
            WorldNotification::CreatureFound { .. } => NotificationKind::CreatureFound,
            WorldNotification::PlayerFound { .. } => NotificationKind::PlayerFound,
        }
    }

    pub fn subject_id(&self) -> ObjectId {
        match self {
            WorldNotification::CurioFound { id, .. }
            | WorldNotification::CreatureFound { id, .. }
            | WorldNotification::PlayerFound { id, .. } => *id,
        }
    }

    /// Name of the sighted object. Players are reported without one.
    pub fn subject_name(&self) -> Option<&str> {
        match self {
            WorldNotification::CurioFound { name, .. }
            | WorldNotification::CreatureFound { name, .. } => Some(name),
            WorldNotification::PlayerFound { .. } => None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            WorldNotification::CurioFound { coord, .. }
            | WorldNotification::CreatureFound { coord, .. }
            | WorldNotification::PlayerFound { coord, .. } => *coord,
        }
    }
}
