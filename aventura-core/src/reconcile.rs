//! Turn reconciliation.
//!
//! Folds one [`TurnResult`] into the character and enemy. The steps run in
//! a fixed order because later ones depend on earlier ones:
//!
//! 1. the story text becomes a narrative event
//! 2. an encounter creates (or replaces) the enemy and starts combat
//! 3. the enemy's HP is updated
//! 4. the character's HP/MP, experience and level are updated, and skill
//!    cooldowns advance if the turn was a combat turn
//! 5. loot is merged into the inventory
//! 6. `combatOver` ends combat and discards the enemy
//!
//! Reconciliation never fails: every number from the narrator is clamped.

use crate::character::Character;
use crate::enemy::Enemy;
use crate::log::Message;
use crate::turn::TurnResult;

/// Something the story log should record as a result of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeEvent {
    /// The narrator's text for the turn.
    Story(String),
    /// The character reached a new level.
    LevelUp { level: u32 },
}

impl NarrativeEvent {
    /// The DM log line for this event.
    pub fn to_message(&self) -> Message {
        match self {
            NarrativeEvent::Story(text) => Message::dm(text.clone()),
            NarrativeEvent::LevelUp { level } => Message::dm(format!(
                "¡Has subido de nivel! Ahora eres nivel {level}. Tus estadísticas han mejorado."
            )),
        }
    }
}

/// What a reconciliation did, for the caller and the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Events to append to the story log, in order.
    pub events: Vec<NarrativeEvent>,
    pub leveled_up: bool,
    pub combat_started: bool,
    pub combat_ended: bool,
    pub player_damaged: bool,
    pub enemy_damaged: bool,
}

/// Apply a narrator reply to the game state.
pub fn reconcile(
    result: &TurnResult,
    character: &mut Character,
    enemy: &mut Option<Enemy>,
    in_combat: &mut bool,
) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    // Cooldowns follow whether this turn was taken in combat, not whether
    // the reply starts one.
    let combat_turn = *in_combat;

    outcome
        .events
        .push(NarrativeEvent::Story(result.story_text.clone()));

    if let Some(encounter) = &result.encounter {
        *enemy = Some(Enemy::from_encounter(encounter));
        *in_combat = true;
        outcome.combat_started = true;
    }

    if let Some(hp) = result.enemy_update.as_ref().and_then(|u| u.current_hp) {
        if let Some(enemy) = enemy.as_mut() {
            outcome.enemy_damaged = enemy.set_hp(hp);
        }
    }

    if result.player_update.is_some() || result.xp_award.is_some() || combat_turn {
        if let Some(update) = &result.player_update {
            if let Some(hp) = update.current_hp {
                outcome.player_damaged = character.set_hp(hp);
            }
            if let Some(mp) = update.current_mp {
                character.set_mp(mp);
            }
        }

        if let Some(xp) = result.xp_award {
            for level in character.gain_xp(xp) {
                outcome.leveled_up = true;
                outcome.events.push(NarrativeEvent::LevelUp { level });
            }
        }

        if combat_turn {
            character.tick_cooldowns();
        }
    }

    if let Some(loot) = &result.loot {
        for item in &loot.items {
            character.add_loot(&item.name, &item.description, item.quantity);
        }
    }

    if result.combat_over == Some(true) {
        *in_combat = false;
        *enemy = None;
        outcome.combat_ended = true;
    }

    tracing::debug!(
        leveled_up = outcome.leveled_up,
        combat_started = outcome.combat_started,
        combat_ended = outcome.combat_ended,
        hp = character.current_hp,
        mp = character.current_mp,
        "Turn reconciled"
    );

    outcome
}
