use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Policy data for a single curio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurioEntry {
    /// Whether picked curios of this kind should also be committed
    #[serde(default)]
    pub collectible: bool,

    /// Capacity consumed by committing one of these
    #[serde(default)]
    pub cost: u32,
}

/// Classification tables, keyed by base resource name (e.g. "dandelion")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Creatures that trigger a retreat
    #[serde(default)]
    pub hostile_creatures: BTreeSet<String>,

    /// Known curios
    #[serde(default)]
    pub curios: BTreeMap<String, CurioEntry>,
}
