//! Class and race tables for character creation.
//!
//! Contains base stats, starting spells, items, and skills for the
//! twelve playable classes.

use crate::character::{Item, Skill, Spell};
use serde::{Deserialize, Serialize};

/// Races offered at character creation. Race is flavour only.
pub const RACES: [&str; 9] = [
    "Humano",
    "Elfo",
    "Enano",
    "Mediano",
    "Dracónido",
    "Gnomo",
    "Semielfo",
    "Semiorco",
    "Tiflin",
];

const HEALTH_POTION: &str = "Poción de Salud";
const HEALTH_POTION_DESCRIPTION: &str = "Restaura 10 PS.";

/// Playable classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Guerrero,
    Picaro,
    Mago,
    Clerigo,
    Explorador,
    Barbaro,
    Bardo,
    Druida,
    Monje,
    Paladin,
    Hechicero,
    Brujo,
}

/// Class-specific defaults for character creation.
#[derive(Debug, Clone)]
pub struct ClassData {
    pub attack: u32,
    pub defense: u32,
    pub max_hp: u32,
    pub max_mp: u32,
    pub spells: Vec<Spell>,
    pub inventory: Vec<Item>,
    pub skills: Vec<Skill>,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 12] = [
        CharacterClass::Guerrero,
        CharacterClass::Picaro,
        CharacterClass::Mago,
        CharacterClass::Clerigo,
        CharacterClass::Explorador,
        CharacterClass::Barbaro,
        CharacterClass::Bardo,
        CharacterClass::Druida,
        CharacterClass::Monje,
        CharacterClass::Paladin,
        CharacterClass::Hechicero,
        CharacterClass::Brujo,
    ];

    /// Display name, as stored on the character sheet.
    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Guerrero => "Guerrero",
            CharacterClass::Picaro => "Pícaro",
            CharacterClass::Mago => "Mago",
            CharacterClass::Clerigo => "Clérigo",
            CharacterClass::Explorador => "Explorador",
            CharacterClass::Barbaro => "Bárbaro",
            CharacterClass::Bardo => "Bardo",
            CharacterClass::Druida => "Druida",
            CharacterClass::Monje => "Monje",
            CharacterClass::Paladin => "Paladín",
            CharacterClass::Hechicero => "Hechicero",
            CharacterClass::Brujo => "Brujo",
        }
    }

    /// Look a class up by display name. Case-insensitive, and accents may
    /// be omitted ("picaro" finds Pícaro).
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = fold(name.trim());
        Self::ALL.into_iter().find(|c| fold(c.name()) == wanted)
    }

    /// Get the creation defaults for this class.
    pub fn data(&self) -> ClassData {
        match self {
            CharacterClass::Guerrero => ClassData {
                attack: 4,
                defense: 4,
                max_hp: 15,
                max_mp: 0,
                spells: vec![],
                inventory: vec![potions(1)],
                skills: vec![Skill::new(
                    "Golpe Poderoso",
                    "Un ataque devastador que inflige daño adicional.",
                    3,
                )],
            },
            CharacterClass::Picaro => ClassData {
                attack: 3,
                defense: 2,
                max_hp: 12,
                max_mp: 5,
                spells: vec![],
                inventory: vec![potions(2)],
                skills: vec![Skill::new(
                    "Ataque Furtivo",
                    "Un ataque preciso que ignora la defensa del enemigo.",
                    4,
                )],
            },
            CharacterClass::Mago => ClassData {
                attack: 1,
                defense: 1,
                max_hp: 8,
                max_mp: 20,
                spells: vec![
                    Spell::new(
                        "Rayo de Fuego",
                        "Lanza una mota de fuego que inflige daño.",
                        5,
                    ),
                    Spell::new("Misil Mágico", "Dispara dardos de fuerza infalibles.", 8),
                ],
                inventory: vec![],
                skills: vec![Skill::new("Meditación Arcana", "Recupera 10 PM.", 2)],
            },
            CharacterClass::Clerigo => ClassData {
                attack: 3,
                defense: 3,
                max_hp: 12,
                max_mp: 15,
                spells: vec![Spell::new("Curar", "Restaura 8 PS.", 8)],
                inventory: vec![potions(1)],
                skills: vec![Skill::new(
                    "Protección Divina",
                    "Aumenta tu defensa durante 2 turnos.",
                    4,
                )],
            },
            CharacterClass::Explorador => ClassData {
                attack: 3,
                defense: 2,
                max_hp: 12,
                max_mp: 5,
                spells: vec![],
                inventory: vec![potions(1)],
                skills: vec![Skill::new(
                    "Disparo Preciso",
                    "Un disparo certero que nunca falla e inflige daño extra.",
                    3,
                )],
            },
            CharacterClass::Barbaro => ClassData {
                attack: 5,
                defense: 2,
                max_hp: 18,
                max_mp: 0,
                spells: vec![],
                inventory: vec![potions(1)],
                skills: vec![Skill::new(
                    "Furia Incontrolable",
                    "Aumenta tu ataque durante 2 turnos.",
                    3,
                )],
            },
            CharacterClass::Bardo => ClassData {
                attack: 2,
                defense: 2,
                max_hp: 10,
                max_mp: 12,
                spells: vec![Spell::new(
                    "Burla Hiriente",
                    "Insulta a un enemigo, causando daño psíquico.",
                    4,
                )],
                inventory: vec![],
                skills: vec![Skill::new(
                    "Canción de Cuna",
                    "El enemigo pierde su próximo turno.",
                    5,
                )],
            },
            CharacterClass::Druida => ClassData {
                attack: 2,
                defense: 3,
                max_hp: 12,
                max_mp: 15,
                spells: vec![Spell::new(
                    "Enmarañar",
                    "Lianas brotan del suelo para sujetar a un enemigo.",
                    7,
                )],
                inventory: vec![],
                skills: vec![Skill::new(
                    "Piel de Corteza",
                    "Aumenta mucho tu defensa para el próximo ataque.",
                    3,
                )],
            },
            CharacterClass::Monje => ClassData {
                attack: 3,
                defense: 3,
                max_hp: 12,
                max_mp: 10,
                spells: vec![],
                inventory: vec![],
                skills: vec![Skill::new(
                    "Ráfaga de Golpes",
                    "Realiza dos ataques rápidos en un turno.",
                    3,
                )],
            },
            CharacterClass::Paladin => ClassData {
                attack: 4,
                defense: 5,
                max_hp: 15,
                max_mp: 10,
                spells: vec![Spell::new(
                    "Castigo Divino",
                    "Canaliza energía divina en un golpe poderoso.",
                    6,
                )],
                inventory: vec![],
                skills: vec![Skill::new(
                    "Imposición de Manos",
                    "Restaura una cantidad moderada de tus PS.",
                    5,
                )],
            },
            CharacterClass::Hechicero => ClassData {
                attack: 1,
                defense: 1,
                max_hp: 8,
                max_mp: 20,
                spells: vec![Spell::new(
                    "Toque Eléctrico",
                    "Un relámpago brota de tu mano.",
                    5,
                )],
                inventory: vec![],
                skills: vec![Skill::new(
                    "Potenciar Magia",
                    "Tu próximo hechizo inflige el doble de daño.",
                    4,
                )],
            },
            CharacterClass::Brujo => ClassData {
                attack: 2,
                defense: 2,
                max_hp: 10,
                max_mp: 15,
                spells: vec![Spell::new(
                    "Explosión Sobrenatural",
                    "Un rayo de energía crepitante.",
                    0,
                )],
                inventory: vec![],
                skills: vec![Skill::new(
                    "Maldición Debilitadora",
                    "Reduce el ataque del enemigo durante 2 turnos.",
                    3,
                )],
            },
        }
    }
}

impl std::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn potions(quantity: u32) -> Item {
    Item::new(HEALTH_POTION, HEALTH_POTION_DESCRIPTION, quantity)
}

/// Lowercase and strip the Spanish accents used in class names.
fn fold(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}
