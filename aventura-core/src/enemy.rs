//! The single opponent of an encounter.

use crate::character::clamp_stat;
use crate::turn::Encounter;
use serde::{Deserialize, Serialize};

/// A transient combat opponent. Exists only while combat is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub name: String,
    pub description: String,
    pub current_hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
}

impl Enemy {
    /// Create an enemy at full health from a narrator encounter.
    pub fn from_encounter(encounter: &Encounter) -> Self {
        let hp = clamp_stat(encounter.hp, u32::MAX);
        Self {
            name: encounter.name.clone(),
            description: encounter.description.clone(),
            current_hp: hp,
            max_hp: hp,
            attack: clamp_stat(encounter.attack, u32::MAX),
            defense: clamp_stat(encounter.defense, u32::MAX),
        }
    }

    /// Set HP, clamped to `[0, max_hp]`. Returns true if HP went down.
    pub fn set_hp(&mut self, value: i64) -> bool {
        let new_hp = clamp_stat(value, self.max_hp);
        let took_damage = new_hp < self.current_hp;
        self.current_hp = new_hp;
        took_damage
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin() -> Enemy {
        Enemy::from_encounter(&Encounter {
            name: "Goblin".to_string(),
            description: "Pequeño y rabioso.".to_string(),
            hp: 10,
            attack: 3,
            defense: 1,
        })
    }

    #[test]
    fn test_from_encounter_starts_at_full_health() {
        let goblin = goblin();
        assert_eq!(goblin.current_hp, 10);
        assert_eq!(goblin.max_hp, 10);
        assert_eq!((goblin.attack, goblin.defense), (3, 1));
    }

    #[test]
    fn test_negative_encounter_stats_clamp() {
        let enemy = Enemy::from_encounter(&Encounter {
            name: "Sombra".to_string(),
            description: String::new(),
            hp: -4,
            attack: -1,
            defense: 2,
        });
        assert_eq!(enemy.max_hp, 0);
        assert_eq!(enemy.attack, 0);
        assert!(enemy.is_defeated());
    }

    #[test]
    fn test_set_hp() {
        let mut goblin = goblin();
        assert!(goblin.set_hp(7));
        assert_eq!(goblin.current_hp, 7);
        assert!(!goblin.set_hp(50));
        assert_eq!(goblin.current_hp, 10);
        assert!(goblin.set_hp(-3));
        assert!(goblin.is_defeated());
    }
}
