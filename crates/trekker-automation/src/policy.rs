use std::collections::{BTreeMap, BTreeSet};

use crate::config::{CurioEntry, PolicyConfig};

/// How a sighted creature should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CreatureClass {
    Hostile,
    Benign,
}

/// How a found curio should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurioClass {
    /// Pick it, then commit it if `cost` capacity is free
    Collectible { cost: u32 },
    /// Pick it and keep it
    Ordinary,
}

/// How a sighted player should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PlayerClass {
    Kin,
    Stranger,
}

/// Read-only classification of world subjects, built once from config
#[derive(Debug, Clone, Default)]
pub struct Policy {
    hostile_creatures: BTreeSet<String>,
    curios: BTreeMap<String, CurioEntry>,
}

impl Policy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            hostile_creatures: config.hostile_creatures.clone(),
            curios: config.curios.clone(),
        }
    }

    pub fn classify_creature(&self, name: &str) -> CreatureClass {
        if self.hostile_creatures.contains(name) {
            CreatureClass::Hostile
        } else {
            CreatureClass::Benign
        }
    }

    /// Unknown curios are treated as ordinary: picked, never committed
    pub fn classify_curio(&self, name: &str) -> CurioClass {
        match self.curios.get(name) {
            Some(entry) if entry.collectible => CurioClass::Collectible { cost: entry.cost },
            _ => CurioClass::Ordinary,
        }
    }

    pub fn classify_player(&self, is_kin: bool) -> PlayerClass {
        if is_kin {
            PlayerClass::Kin
        } else {
            PlayerClass::Stranger
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> Policy {
        let mut config = PolicyConfig::default();
        config.hostile_creatures.insert("lynx".to_string());
        config.curios.insert(
            "dandelion".to_string(),
            CurioEntry {
                collectible: true,
                cost: 1,
            },
        );
        config.curios.insert(
            "stick".to_string(),
            CurioEntry {
                collectible: false,
                cost: 4,
            },
        );
        Policy::from_config(&config)
    }

    #[test]
    fn test_creatures() {
        let policy = policy();
        assert_eq!(policy.classify_creature("lynx"), CreatureClass::Hostile);
        assert_eq!(policy.classify_creature("rabbit"), CreatureClass::Benign);
        // Names are base resource names and match exactly
        assert_eq!(policy.classify_creature("Lynx"), CreatureClass::Benign);
    }

    #[test]
    fn test_curios() {
        let policy = policy();
        assert_eq!(
            policy.classify_curio("dandelion"),
            CurioClass::Collectible { cost: 1 }
        );
        assert_eq!(policy.classify_curio("stick"), CurioClass::Ordinary);
        assert_eq!(policy.classify_curio("mystery"), CurioClass::Ordinary);
    }

    #[test]
    fn test_players() {
        let policy = Policy::default();
        assert_eq!(policy.classify_player(true), PlayerClass::Kin);
        assert_eq!(policy.classify_player(false), PlayerClass::Stranger);
    }
}
