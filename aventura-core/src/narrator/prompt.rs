//! Grounding text for the narrator.
//!
//! The system prompt carries the full character sheet and the rules of
//! play. The engine is authoritative for inventory and cooldowns, so the
//! narrator is told not to track them.

use crate::character::Character;
use crate::enemy::Enemy;
use std::fmt::Write;

/// The message that asks for the opening scene.
pub const OPENING_TRIGGER: &str = "Comienza la aventura.";

/// Build the system prompt for a session with this character.
pub fn system_prompt(character: &Character) -> String {
    let skills = bullet_list(character.skills.iter().map(|s| {
        format!(
            "{} (Enfriamiento: {} turnos): {}",
            s.name, s.cooldown, s.description
        )
    }))
    .unwrap_or_else(|| "Ninguna".to_string());
    let spells = bullet_list(
        character
            .spells
            .iter()
            .map(|s| format!("{} (Coste: {} PM): {}", s.name, s.cost, s.description)),
    )
    .unwrap_or_else(|| "Ninguno".to_string());
    let inventory = bullet_list(
        character
            .inventory
            .iter()
            .map(|i| format!("{} (x{}): {}", i.name, i.quantity, i.description)),
    )
    .unwrap_or_else(|| "Ninguno".to_string());

    format!(
        r#"Eres un maestro narrador y Dungeon Master para una partida de Dungeons and Dragons.
Tu rol es crear un mundo cautivador de fantasía oscura para un jugador, narrando todo en español.

PERSONAJE DEL JUGADOR:
- Nombre: {name}
- Raza: {race}
- Clase: {class}
- Nivel: {level}
- Experiencia: {xp}/{xp_next}
- Estadísticas: PS: {hp}/{max_hp}, PM: {mp}/{max_mp}, Ataque: {attack}, Defensa: {defense}
- Habilidades:
{skills}
- Hechizos:
{spells}
- Inventario:
{inventory}

Debes controlar la narración y responder SIEMPRE llamando a la herramienta 'registrar_turno' con el esquema proporcionado.

FLUJO DEL JUEGO:
1. NARRATIVA: Comienza presentando una escena de apertura donde el jugador despierta en una celda de piedra tenuemente iluminada. Describe el entorno con gran detalle. Espera la entrada del jugador. Cuando el jugador encuentre objetos, usa el objeto 'loot'.
2. COMBATE: Cuando decidas que aparece un enemigo, DEBES iniciar el combate incluyendo un objeto 'encounter'. Solo hay un enemigo a la vez.
3. RECOMPENSAS: Después de que el jugador gane un combate o complete un hito importante, DEBES recompensarlo con experiencia usando el campo 'xpAward'. También puedes dar objetos con el campo 'loot'.

ACCIONES DEL JUGADOR:
- Exploración: El jugador describirá sus acciones con texto (ej., "mirar debajo de la cama", "intentar abrir la puerta").
- Combate: El jugador usará comandos específicos: "ATACAR", "DEFENDER", "HUIR", "LANZAR [Nombre del Hechizo]", "USAR [Nombre del Objeto]", "USAR HABILIDAD [Nombre de la Habilidad]".

REGLAS DE COMBATE Y ACCIÓN:
- El combate es por turnos. El jugador actúa primero.
- Tu respuesta DEBE narrar los resultados del turno e incluir 'playerUpdate' con cualquier cambio en los PS o PM del jugador y 'enemyUpdate' con cualquier cambio en los PS del enemigo.
- Cálculo de daño: max(1, ataque del atacante - defensa del defensor). Todo golpe que acierta inflige al menos 1 de daño.
- "DEFENDER": La defensa del jugador se duplica por un turno.
- "USAR HABILIDAD [Nombre de la Habilidad]": Se activa el efecto de la habilidad. La aplicación gestiona el enfriamiento, así que solo tienes que narrar el efecto.
- "LANZAR [Nombre del Hechizo]": Debes reducir el PM del jugador por el coste del hechizo en 'playerUpdate'. Si el PM es demasiado bajo, narra el fallo. Tú decides el daño o efecto del hechizo; un hechizo de daño simple inflige el Ataque del jugador más una pequeña bonificación.
- "USAR [Nombre del Objeto]": Se activa el efecto del objeto. Tú decides la curación exacta (una 'Poción de Salud' debería restaurar 10 PS) y la reflejas en 'playerUpdate'.
- El enemigo siempre ataca después del jugador, a menos que el jugador huya.
- Cuando los PS de cualquiera de los combatientes lleguen a 0, o el jugador huya, DEBES establecer 'combatOver' en true. Después de ganar, DEBES otorgar XP usando 'xpAward'.

IMPORTANTE:
- La aplicación es la única responsable del inventario y de los enfriamientos de las habilidades. NO los rastrees ni los modifiques; solo narra sus efectos.
- Nunca rompas el personaje. Eres el Dungeon Master.
- Tu 'storyText' debe ser solo la historia, sin frases introductorias.
- Actualiza las estadísticas del jugador ÚNICAMENTE a través de 'playerUpdate'. Las del enemigo a través de 'enemyUpdate'."#,
        name = character.name,
        race = character.race,
        class = character.class,
        level = character.level,
        xp = character.xp,
        xp_next = character.xp_to_next_level,
        hp = character.current_hp,
        max_hp = character.max_hp,
        mp = character.current_mp,
        max_mp = character.max_mp,
        attack = character.attack,
        defense = character.defense,
    )
}

/// Build the user message for one player action.
///
/// While an enemy is present the current pools are restated so the
/// narrator can do the combat math from fresh numbers.
pub fn action_prompt(action: &str, character: &Character, enemy: Option<&Enemy>) -> String {
    let mut prompt = format!("Acción del jugador: {action}.");
    if let Some(enemy) = enemy {
        let _ = write!(
            prompt,
            " Estado actual: Jugador PS={}, Jugador PM={}, Jugador Ataque={}, Jugador Defensa={}, Enemigo ({}) PS={}, Enemigo Ataque={}, Enemigo Defensa={}.",
            character.current_hp,
            character.current_mp,
            character.attack,
            character.defense,
            enemy.name,
            enemy.current_hp,
            enemy.attack,
            enemy.defense,
        );
    }
    prompt
}

fn bullet_list(lines: impl Iterator<Item = String>) -> Option<String> {
    let list = lines
        .map(|line| format!("  - {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    (!list.is_empty()).then_some(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_data::CharacterClass;
    use crate::turn::Encounter;

    #[test]
    fn test_system_prompt_contains_sheet() {
        let c = Character::from_class("Elira", "Elfo", CharacterClass::Mago);
        let prompt = system_prompt(&c);
        assert!(prompt.contains("- Nombre: Elira"));
        assert!(prompt.contains("- Clase: Mago"));
        assert!(prompt.contains("PS: 8/8, PM: 20/20, Ataque: 1, Defensa: 1"));
        assert!(prompt.contains("Misil Mágico (Coste: 8 PM)"));
        assert!(prompt.contains("Meditación Arcana (Enfriamiento: 2 turnos)"));
        assert!(prompt.contains("- Inventario:\nNinguno"));
    }

    #[test]
    fn test_system_prompt_states_rules() {
        let c = Character::from_class("Aldric", "Humano", CharacterClass::Guerrero);
        let prompt = system_prompt(&c);
        assert!(prompt.contains("max(1, ataque del atacante - defensa del defensor)"));
        assert!(prompt.contains("\"DEFENDER\": La defensa del jugador se duplica"));
        assert!(prompt.contains("única responsable del inventario"));
        assert!(prompt.contains("Poción de Salud (x1)"));
    }

    #[test]
    fn test_action_prompt_exploring() {
        let c = Character::from_class("Aldric", "Humano", CharacterClass::Guerrero);
        assert_eq!(
            action_prompt("abrir la puerta", &c, None),
            "Acción del jugador: abrir la puerta."
        );
    }

    #[test]
    fn test_action_prompt_in_combat_restates_pools() {
        let c = Character::from_class("Aldric", "Humano", CharacterClass::Guerrero);
        let goblin = Enemy::from_encounter(&Encounter {
            name: "Goblin".to_string(),
            description: String::new(),
            hp: 10,
            attack: 3,
            defense: 1,
        });
        let prompt = action_prompt("ATACAR", &c, Some(&goblin));
        assert!(prompt.starts_with("Acción del jugador: ATACAR."));
        assert!(prompt.contains("Jugador PS=15"));
        assert!(prompt.contains("Enemigo (Goblin) PS=10"));
        assert!(prompt.contains("Enemigo Defensa=1"));
    }
}
