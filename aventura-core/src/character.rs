//! The player character and the things it carries.
//!
//! Every mutation goes through a method that keeps the sheet inside its
//! bounds: HP and MP stay within `[0, max]`, xp never goes negative, and
//! items with no quantity left are dropped from the inventory.

use crate::class_data::CharacterClass;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// XP needed to go from level 1 to level 2.
pub const STARTING_XP_TO_NEXT_LEVEL: u32 = 100;

/// Stat increases granted by each level.
const LEVEL_UP_MAX_HP: u32 = 5;
const LEVEL_UP_MAX_MP: u32 = 3;
const LEVEL_UP_ATTACK: u32 = 1;
const LEVEL_UP_DEFENSE: u32 = 1;

/// An inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    pub description: String,
    pub quantity: u32,
}

impl Item {
    pub fn new(name: impl Into<String>, description: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            quantity,
        }
    }
}

/// A spell known by the character. Spells are fixed per class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub name: String,
    pub description: String,
    /// MP cost.
    pub cost: u32,
}

impl Spell {
    pub fn new(name: impl Into<String>, description: impl Into<String>, cost: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            cost,
        }
    }

    /// Whether the given MP pool covers this spell.
    pub fn affordable(&self, current_mp: u32) -> bool {
        current_mp >= self.cost
    }
}

/// A class skill with a cooldown measured in combat turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// Total cooldown in turns.
    pub cooldown: u32,
    /// Turns left before the skill can be used again.
    pub turns_until_ready: u32,
}

impl Skill {
    /// A skill that is ready to use.
    pub fn new(name: impl Into<String>, description: impl Into<String>, cooldown: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            cooldown,
            turns_until_ready: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.turns_until_ready == 0
    }

    /// Put the skill on cooldown. It stays unusable for the current turn
    /// and for `cooldown` turns after it.
    pub fn trigger(&mut self) {
        self.turns_until_ready = self.cooldown + 1;
    }

    /// Advance the cooldown by one combat turn.
    pub fn tick(&mut self) {
        self.turns_until_ready = self.turns_until_ready.saturating_sub(1);
    }
}

/// The player's persistent stat and progression record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub name: String,
    pub class: String,
    pub race: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub current_hp: u32,
    pub max_hp: u32,
    pub current_mp: u32,
    pub max_mp: u32,
    pub attack: u32,
    pub defense: u32,
    pub inventory: Vec<Item>,
    pub spells: Vec<Spell>,
    pub skills: Vec<Skill>,
}

impl Character {
    /// Build a fresh level 1 character from the defaults of its class.
    pub fn from_class(
        name: impl Into<String>,
        race: impl Into<String>,
        class: CharacterClass,
    ) -> Self {
        let data = class.data();
        Self {
            name: name.into(),
            class: class.name().to_string(),
            race: race.into(),
            level: 1,
            xp: 0,
            xp_to_next_level: STARTING_XP_TO_NEXT_LEVEL,
            current_hp: data.max_hp,
            max_hp: data.max_hp,
            current_mp: data.max_mp,
            max_mp: data.max_mp,
            attack: data.attack,
            defense: data.defense,
            inventory: data.inventory,
            spells: data.spells,
            skills: data.skills,
        }
    }

    /// Set HP, clamped to `[0, max_hp]`. Returns true if HP went down.
    pub fn set_hp(&mut self, value: i64) -> bool {
        let new_hp = clamp_stat(value, self.max_hp);
        let took_damage = new_hp < self.current_hp;
        self.current_hp = new_hp;
        took_damage
    }

    /// Set MP, clamped to `[0, max_mp]`.
    pub fn set_mp(&mut self, value: i64) {
        self.current_mp = clamp_stat(value, self.max_mp);
    }

    /// Add (or, if negative, remove) experience, leveling up as many times
    /// as the new total allows.
    ///
    /// Returns the level reached by each level-up, in order.
    pub fn gain_xp(&mut self, amount: i64) -> Vec<u32> {
        let total = i64::from(self.xp).saturating_add(amount);
        self.xp = total.clamp(0, i64::from(u32::MAX)) as u32;

        let mut reached = Vec::new();
        while self.xp_to_next_level > 0 && self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level_up();
            reached.push(self.level);
        }
        reached
    }

    fn level_up(&mut self) {
        self.level += 1;
        self.xp_to_next_level = (u64::from(self.xp_to_next_level) * 3 / 2)
            .clamp(1, u64::from(u32::MAX)) as u32;
        self.max_hp += LEVEL_UP_MAX_HP;
        self.max_mp += LEVEL_UP_MAX_MP;
        self.attack += LEVEL_UP_ATTACK;
        self.defense += LEVEL_UP_DEFENSE;
        self.current_hp = self.max_hp;
        self.current_mp = self.max_mp;
    }

    /// Advance every skill cooldown by one combat turn.
    pub fn tick_cooldowns(&mut self) {
        for skill in &mut self.skills {
            skill.tick();
        }
    }

    /// Put the named skill on cooldown.
    ///
    /// Fires on a name match even if the skill is already cooling down.
    /// Returns false when the character has no such skill.
    pub fn trigger_skill(&mut self, name: &str) -> bool {
        match self.skills.iter_mut().find(|s| s.name == name) {
            Some(skill) => {
                skill.trigger();
                true
            }
            None => false,
        }
    }

    /// Use up one unit of the named item, removing it once none are left.
    /// Returns false when the item is not in the inventory.
    pub fn consume_item(&mut self, name: &str) -> bool {
        let Some(index) = self.inventory.iter().position(|i| i.name == name) else {
            return false;
        };

        let item = &mut self.inventory[index];
        item.quantity = item.quantity.saturating_sub(1);
        if item.quantity == 0 {
            self.inventory.remove(index);
        }
        true
    }

    /// Merge found items into the inventory.
    ///
    /// Stacks with an existing entry of the same name; otherwise appends.
    /// Non-positive quantities never create an entry.
    pub fn add_loot(&mut self, name: &str, description: &str, quantity: i64) {
        let quantity = quantity.clamp(0, i64::from(u32::MAX)) as u32;
        if quantity == 0 {
            return;
        }

        match self.inventory.iter_mut().find(|i| i.name == name) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.inventory.push(Item::new(name, description, quantity)),
        }
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.inventory.iter().find(|i| i.name == name)
    }

    pub fn spell(&self, name: &str) -> Option<&Spell> {
        self.spells.iter().find(|s| s.name == name)
    }

    pub fn skill(&self, name: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.name == name)
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }

    /// Check the sheet invariants. Returns a description of the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.level == 0 {
            return Err("level must be at least 1".to_string());
        }
        if self.xp_to_next_level == 0 {
            return Err("xpToNextLevel must be positive".to_string());
        }
        if self.current_hp > self.max_hp {
            return Err(format!(
                "currentHp {} exceeds maxHp {}",
                self.current_hp, self.max_hp
            ));
        }
        if self.current_mp > self.max_mp {
            return Err(format!(
                "currentMp {} exceeds maxMp {}",
                self.current_mp, self.max_mp
            ));
        }
        if let Some(skill) = self
            .skills
            .iter()
            .find(|s| s.turns_until_ready > s.cooldown + 1)
        {
            return Err(format!("skill '{}' has an impossible cooldown", skill.name));
        }
        if let Some(item) = self.inventory.iter().find(|i| i.quantity == 0) {
            return Err(format!("item '{}' has no quantity left", item.name));
        }
        if let Some(name) = first_duplicate(self.inventory.iter().map(|i| i.name.as_str())) {
            return Err(format!("item '{name}' appears more than once"));
        }
        if let Some(name) = first_duplicate(self.spells.iter().map(|s| s.name.as_str())) {
            return Err(format!("spell '{name}' appears more than once"));
        }
        if let Some(name) = first_duplicate(self.skills.iter().map(|s| s.name.as_str())) {
            return Err(format!("skill '{name}' appears more than once"));
        }
        Ok(())
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}

/// Clamp an untrusted value into `[0, max]`.
pub(crate) fn clamp_stat(value: i64, max: u32) -> u32 {
    value.clamp(0, i64::from(max)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warrior() -> Character {
        Character::from_class("Aldric", "Humano", CharacterClass::Guerrero)
    }

    #[test]
    fn test_from_class_defaults() {
        let c = warrior();
        assert_eq!(c.level, 1);
        assert_eq!(c.xp, 0);
        assert_eq!(c.xp_to_next_level, 100);
        assert_eq!(c.class, "Guerrero");
        assert_eq!((c.current_hp, c.max_hp), (15, 15));
        assert_eq!((c.current_mp, c.max_mp), (0, 0));
        assert_eq!((c.attack, c.defense), (4, 4));
        assert_eq!(c.inventory, vec![Item::new("Poción de Salud", "Restaura 10 PS.", 1)]);
        assert_eq!(c.skills[0].name, "Golpe Poderoso");
        assert!(c.skills[0].is_ready());
    }

    #[test]
    fn test_set_hp_clamps_and_reports_damage() {
        let mut c = warrior();
        assert!(c.set_hp(10));
        assert_eq!(c.current_hp, 10);
        assert!(!c.set_hp(999));
        assert_eq!(c.current_hp, 15);
        assert!(c.set_hp(-20));
        assert_eq!(c.current_hp, 0);
        assert!(c.is_defeated());
    }

    #[test]
    fn test_set_mp_clamps() {
        let mut c = Character::from_class("Elira", "Elfo", CharacterClass::Mago);
        c.set_mp(-1);
        assert_eq!(c.current_mp, 0);
        c.set_mp(500);
        assert_eq!(c.current_mp, c.max_mp);
    }

    #[test]
    fn test_exact_threshold_levels_once() {
        let mut c = warrior();
        c.xp = 40;
        c.set_hp(3);
        let levels = c.gain_xp(60);
        assert_eq!(levels, vec![2]);
        assert_eq!(c.xp, 0);
        assert_eq!(c.xp_to_next_level, 150);
        assert_eq!((c.current_hp, c.max_hp), (20, 20));
        assert_eq!((c.current_mp, c.max_mp), (3, 3));
        assert_eq!((c.attack, c.defense), (5, 5));
    }

    #[test]
    fn test_large_award_levels_repeatedly() {
        let mut c = warrior();
        let levels = c.gain_xp(250);
        assert_eq!(levels, vec![2, 3]);
        assert_eq!(c.level, 3);
        assert_eq!(c.xp, 0);
        assert_eq!(c.xp_to_next_level, 225);
        assert_eq!(c.max_hp, 25);
    }

    #[test]
    fn test_negative_award_floors_at_zero() {
        let mut c = warrior();
        c.xp = 30;
        assert!(c.gain_xp(-100).is_empty());
        assert_eq!(c.xp, 0);
        assert_eq!(c.level, 1);
    }

    #[test]
    fn test_skill_cooldown_cycle() {
        let mut c = warrior();
        assert!(c.trigger_skill("Golpe Poderoso"));
        assert_eq!(c.skill("Golpe Poderoso").unwrap().turns_until_ready, 4);

        for expected in [3, 2, 1, 0] {
            c.tick_cooldowns();
            assert_eq!(c.skill("Golpe Poderoso").unwrap().turns_until_ready, expected);
        }
        assert!(c.skill("Golpe Poderoso").unwrap().is_ready());

        c.tick_cooldowns();
        assert_eq!(c.skill("Golpe Poderoso").unwrap().turns_until_ready, 0);
    }

    #[test]
    fn test_trigger_unknown_skill_is_noop() {
        let mut c = warrior();
        let before = c.clone();
        assert!(!c.trigger_skill("Bola de Fuego"));
        assert_eq!(c, before);
    }

    #[test]
    fn test_trigger_while_cooling_down_resets() {
        let mut c = warrior();
        c.trigger_skill("Golpe Poderoso");
        c.tick_cooldowns();
        c.trigger_skill("Golpe Poderoso");
        assert_eq!(c.skill("Golpe Poderoso").unwrap().turns_until_ready, 4);
    }

    #[test]
    fn test_consume_item() {
        let mut c = Character::from_class("Sombra", "Mediano", CharacterClass::Picaro);
        assert_eq!(c.item("Poción de Salud").unwrap().quantity, 2);

        assert!(c.consume_item("Poción de Salud"));
        assert_eq!(c.item("Poción de Salud").unwrap().quantity, 1);

        assert!(c.consume_item("Poción de Salud"));
        assert!(c.item("Poción de Salud").is_none());
        assert!(c.inventory.is_empty());

        assert!(!c.consume_item("Poción de Salud"));
    }

    #[test]
    fn test_loot_merges_by_name() {
        let mut c = warrior();
        c.add_loot("Poción de Salud", "Restaura 10 PS.", 2);
        c.add_loot("Llave Oxidada", "Abre algo.", 1);
        c.add_loot("Gema", "Brilla.", 0);
        c.add_loot("Gema Negra", "Absorbe la luz.", -3);

        assert_eq!(c.inventory.len(), 2);
        assert_eq!(c.inventory[0].name, "Poción de Salud");
        assert_eq!(c.inventory[0].quantity, 3);
        assert_eq!(c.inventory[1].name, "Llave Oxidada");
    }

    #[test]
    fn test_spell_affordable() {
        let c = Character::from_class("Elira", "Elfo", CharacterClass::Mago);
        let misil = c.spell("Misil Mágico").unwrap();
        assert!(misil.affordable(8));
        assert!(!misil.affordable(7));
    }

    #[test]
    fn test_check_invariants() {
        let mut c = warrior();
        assert!(c.check_invariants().is_ok());

        c.current_hp = c.max_hp + 1;
        assert!(c.check_invariants().is_err());

        let mut c = warrior();
        c.skills[0].turns_until_ready = 4;
        assert!(c.check_invariants().is_ok());
        c.skills[0].turns_until_ready = 5;
        assert!(c.check_invariants().is_err());
    }

    #[test]
    fn test_check_invariants_rejects_empty_and_duplicate_entries() {
        let mut c = warrior();
        c.inventory[0].quantity = 0;
        assert!(c.check_invariants().unwrap_err().contains("Poción de Salud"));

        let mut c = warrior();
        c.add_loot("Llave", "Abre algo.", 1);
        c.inventory.push(Item::new("Llave", "Otra llave.", 1));
        assert!(c.check_invariants().is_err());

        let mut c = warrior();
        c.spells.push(Spell::new("Curar", "Restaura 8 PS.", 8));
        assert!(c.check_invariants().is_ok());
        c.spells.push(Spell::new("Curar", "Restaura 8 PS.", 8));
        assert!(c.check_invariants().is_err());

        let mut c = warrior();
        let skill = c.skills[0].clone();
        c.skills.push(skill);
        assert!(c.check_invariants().unwrap_err().contains("Golpe Poderoso"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(warrior()).unwrap();
        assert_eq!(value["xpToNextLevel"], 100);
        assert_eq!(value["currentHp"], 15);
        assert_eq!(value["class"], "Guerrero");
        assert_eq!(value["skills"][0]["turnsUntilReady"], 0);
    }
}
