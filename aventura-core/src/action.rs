//! Player action vocabulary.
//!
//! Players type free text while exploring; combat menus produce fixed
//! commands. Matching is exact and case-sensitive, because the narrator is
//! told about these exact strings.

use std::fmt;

const ATTACK: &str = "ATACAR";
const DEFEND: &str = "DEFENDER";
const FLEE: &str = "HUIR";
const CAST_PREFIX: &str = "LANZAR ";
const USE_SKILL_PREFIX: &str = "USAR HABILIDAD ";
const USE_ITEM_PREFIX: &str = "USAR ";

/// A parsed player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Attack,
    Defend,
    Flee,
    CastSpell(String),
    UseItem(String),
    UseSkill(String),
    Explore(String),
}

impl PlayerAction {
    /// Classify a raw input line.
    pub fn parse(input: &str) -> Self {
        match input {
            ATTACK => return PlayerAction::Attack,
            DEFEND => return PlayerAction::Defend,
            FLEE => return PlayerAction::Flee,
            _ => {}
        }

        if let Some(spell) = input.strip_prefix(CAST_PREFIX) {
            PlayerAction::CastSpell(spell.to_string())
        } else if let Some(skill) = input.strip_prefix(USE_SKILL_PREFIX) {
            PlayerAction::UseSkill(skill.to_string())
        } else if let Some(item) = input.strip_prefix(USE_ITEM_PREFIX) {
            PlayerAction::UseItem(item.to_string())
        } else {
            PlayerAction::Explore(input.to_string())
        }
    }

    /// Attack, defend and flee only make sense against an enemy.
    pub fn is_combat_only(&self) -> bool {
        matches!(
            self,
            PlayerAction::Attack | PlayerAction::Defend | PlayerAction::Flee
        )
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerAction::Attack => f.write_str(ATTACK),
            PlayerAction::Defend => f.write_str(DEFEND),
            PlayerAction::Flee => f.write_str(FLEE),
            PlayerAction::CastSpell(name) => write!(f, "{CAST_PREFIX}{name}"),
            PlayerAction::UseItem(name) => write!(f, "{USE_ITEM_PREFIX}{name}"),
            PlayerAction::UseSkill(name) => write!(f, "{USE_SKILL_PREFIX}{name}"),
            PlayerAction::Explore(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combat_primitives() {
        assert_eq!(PlayerAction::parse("ATACAR"), PlayerAction::Attack);
        assert_eq!(PlayerAction::parse("DEFENDER"), PlayerAction::Defend);
        assert_eq!(PlayerAction::parse("HUIR"), PlayerAction::Flee);
        assert!(PlayerAction::Attack.is_combat_only());
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(
            PlayerAction::parse("atacar"),
            PlayerAction::Explore("atacar".to_string())
        );
        assert_eq!(
            PlayerAction::parse("ATACAR al goblin"),
            PlayerAction::Explore("ATACAR al goblin".to_string())
        );
    }

    #[test]
    fn test_named_actions() {
        assert_eq!(
            PlayerAction::parse("LANZAR Rayo de Fuego"),
            PlayerAction::CastSpell("Rayo de Fuego".to_string())
        );
        assert_eq!(
            PlayerAction::parse("USAR Poción de Salud"),
            PlayerAction::UseItem("Poción de Salud".to_string())
        );
        assert_eq!(
            PlayerAction::parse("USAR HABILIDAD Golpe Poderoso"),
            PlayerAction::UseSkill("Golpe Poderoso".to_string())
        );
    }

    #[test]
    fn test_free_text_is_exploration() {
        let action = PlayerAction::parse("mirar debajo de la cama");
        assert_eq!(
            action,
            PlayerAction::Explore("mirar debajo de la cama".to_string())
        );
        assert!(!action.is_combat_only());
    }

    #[test]
    fn test_display_is_parse_inverse() {
        for raw in [
            "ATACAR",
            "DEFENDER",
            "HUIR",
            "LANZAR Misil Mágico",
            "USAR Poción de Salud",
            "USAR HABILIDAD Ataque Furtivo",
            "abrir la puerta",
        ] {
            assert_eq!(PlayerAction::parse(raw).to_string(), raw);
        }
    }
}
