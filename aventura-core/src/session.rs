//! GameSession - the primary public API for playing.
//!
//! A session owns all game state (character, story log, combat flag and
//! enemy) and runs the turn protocol: record the action, apply its local
//! effects, ask the narrator, reconcile the reply, then save.

use crate::action::PlayerAction;
use crate::character::Character;
use crate::class_data::CharacterClass;
use crate::enemy::Enemy;
use crate::log::{Message, StoryLog};
use crate::narrator::{Narrator, NarratorError};
use crate::persist::{load_snapshot, save_snapshot, GameSnapshot, PersistError, SaveStore};
use crate::reconcile::{reconcile, NarrativeEvent};
use crate::speech::SpeechSynthesizer;
use crate::turn::TurnResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Opening line when the narrator cannot be reached at game start.
pub const OPENING_FAILURE_TEXT: &str = "El mundo no logra materializarse...";

/// Log line when a turn's narrator call fails.
pub const INTERRUPTED_TEXT: &str = "Una fuerza extraña interrumpe tu acción...";

/// Reported when a snapshot could not be written.
pub const SAVE_FAILED_MESSAGE: &str = "No se pudo guardar la partida.";

/// Confirmation shown after a manual save.
pub const SAVED_MESSAGE: &str = "Partida guardada.";

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("La sesión de juego no ha sido inicializada.")]
    NotPlaying,

    #[error("El Dungeon Master todavía está narrando el turno anterior.")]
    TurnInProgress,

    #[error("Primero hay que empezar una nueva partida.")]
    NotCreatingCharacter,

    #[error("{0}")]
    InvalidCharacter(String),

    #[error("Clase desconocida: {0}")]
    UnknownClass(String),

    #[error("No se encontró ninguna partida guardada.")]
    NoSavedGame,

    #[error("La partida guardada está corrupta y no se pudo cargar. Por favor, empieza una nueva partida.")]
    CorruptedSave,

    #[error("Error de almacenamiento: {0}")]
    Persist(#[from] PersistError),
}

/// Top-level phase of the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GamePhase {
    #[default]
    Title,
    CharacterCreation,
    Playing,
}

/// Which action menu is shown during combat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombatMenu {
    #[default]
    Main,
    Magic,
    Inventory,
    Skills,
}

/// Outcome of asking for a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewGame {
    /// A saved game exists and would be erased. Ask again with confirmation.
    NeedsConfirmation,
    /// The session is now in character creation.
    Ready,
}

/// Choices made on the character creation screen.
#[derive(Debug, Clone)]
pub struct NewCharacter {
    pub name: String,
    pub race: String,
    /// Class display name, e.g. "Pícaro". Accents are optional.
    pub class: String,
}

impl NewCharacter {
    pub fn new(name: impl Into<String>, race: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            race: race.into(),
            class: class.into(),
        }
    }
}

/// Tracks whether a turn is waiting on the narrator.
///
/// Clones share the same flag, so a front end can hold one and refuse input
/// while a turn is pending.
#[derive(Debug, Clone, Default)]
pub struct TurnGate {
    pending: Arc<AtomicBool>,
}

impl TurnGate {
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Mark a turn as pending. Returns `None` if one already is.
    ///
    /// The flag is cleared when the guard drops, including when the turn's
    /// future is abandoned mid-await.
    pub fn try_begin(&self) -> Option<TurnGuard> {
        self.pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| TurnGuard {
                pending: Arc::clone(&self.pending),
            })
    }
}

/// Holds a [`TurnGate`] pending until dropped.
#[derive(Debug)]
pub struct TurnGuard {
    pending: Arc<AtomicBool>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.pending.store(false, Ordering::SeqCst);
    }
}

/// What happened during one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnReport {
    /// The parsed player action. `None` for the opening narration.
    pub action: Option<PlayerAction>,

    /// Narrative lines added to the story log, in order.
    pub events: Vec<NarrativeEvent>,

    pub leveled_up: bool,
    pub combat_started: bool,
    pub combat_ended: bool,
    pub player_damaged: bool,
    pub enemy_damaged: bool,

    /// The narrator's reply could not be understood and was replaced.
    pub degraded: bool,

    /// User-facing error for a narrator that could not be reached.
    pub error: Option<String>,

    /// User-facing error for a snapshot that could not be written.
    pub save_error: Option<String>,

    /// Spoken narration, when speech is enabled and synthesis succeeded.
    pub audio: Option<Vec<u8>>,
}

/// A game session.
///
/// This is the main entry point for gameplay. It manages:
/// - The game phase and combat menu
/// - The character, enemy and story log
/// - The narrator conversation
/// - Saving after every turn
pub struct GameSession<N: Narrator, S: SaveStore> {
    narrator: N,
    store: S,
    speech: Option<Box<dyn SpeechSynthesizer>>,
    speech_enabled: bool,

    phase: GamePhase,
    menu: CombatMenu,
    character: Option<Character>,
    story_log: StoryLog,
    in_combat: bool,
    enemy: Option<Enemy>,

    gate: TurnGate,
}

impl<N: Narrator, S: SaveStore> GameSession<N, S> {
    /// Create a session at the title screen.
    pub fn new(narrator: N, store: S) -> Self {
        Self {
            narrator,
            store,
            speech: None,
            speech_enabled: false,
            phase: GamePhase::Title,
            menu: CombatMenu::Main,
            character: None,
            story_log: StoryLog::new(),
            in_combat: false,
            enemy: None,
            gate: TurnGate::default(),
        }
    }

    /// Attach a speech synthesizer. Speech starts disabled.
    pub fn with_speech(mut self, speech: impl SpeechSynthesizer + 'static) -> Self {
        self.speech = Some(Box::new(speech));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn enemy(&self) -> Option<&Enemy> {
        self.enemy.as_ref()
    }

    pub fn story_log(&self) -> &StoryLog {
        &self.story_log
    }

    pub fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    pub fn combat_menu(&self) -> CombatMenu {
        self.menu
    }

    /// A handle on the pending-turn flag.
    pub fn turn_gate(&self) -> TurnGate {
        self.gate.clone()
    }

    /// Whether a turn is waiting on the narrator.
    pub fn is_awaiting_narrator(&self) -> bool {
        self.gate.is_pending()
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech_enabled
    }

    /// Enable or disable spoken narration. Has no effect on a session
    /// without a synthesizer.
    pub fn set_speech_enabled(&mut self, enabled: bool) {
        self.speech_enabled = enabled && self.speech.is_some();
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The current game as it would be saved.
    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.character.as_ref().map(|character| GameSnapshot {
            character: character.clone(),
            story_log: self.story_log.clone(),
            is_in_combat: self.in_combat,
            enemy: self.enemy.clone(),
        })
    }

    // ========================================================================
    // Title screen
    // ========================================================================

    pub async fn has_saved_game(&self) -> bool {
        self.store.exists().await
    }

    /// Move to character creation.
    ///
    /// Starting over erases the saved game, so when one exists this only
    /// proceeds with `confirmed` set.
    pub async fn request_new_game(&mut self, confirmed: bool) -> Result<NewGame, SessionError> {
        if self.gate.is_pending() {
            return Err(SessionError::TurnInProgress);
        }

        if self.store.exists().await {
            if !confirmed {
                return Ok(NewGame::NeedsConfirmation);
            }
            if let Err(e) = self.store.delete().await {
                tracing::warn!(error = %e, "Could not delete saved game");
            }
        }

        self.clear_game();
        self.phase = GamePhase::CharacterCreation;
        Ok(NewGame::Ready)
    }

    /// Create the character and ask the narrator for the opening scene.
    ///
    /// Only valid during character creation, which is reached through
    /// [`request_new_game`](Self::request_new_game).
    ///
    /// A narrator failure does not abort the game: the session is left
    /// playable with a fallback opening line and the error in the report.
    pub async fn start_game(&mut self, new: NewCharacter) -> Result<TurnReport, SessionError> {
        if self.phase != GamePhase::CharacterCreation {
            return Err(SessionError::NotCreatingCharacter);
        }
        let name = new.name.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidCharacter(
                "Un héroe debe tener un nombre.".to_string(),
            ));
        }
        let class = CharacterClass::from_name(&new.class)
            .ok_or_else(|| SessionError::UnknownClass(new.class.clone()))?;

        let guard = self.gate.try_begin().ok_or(SessionError::TurnInProgress)?;

        self.clear_game();
        let character = self
            .character
            .insert(Character::from_class(name, new.race.trim(), class));
        self.phase = GamePhase::Playing;
        tracing::info!(name = %character.name, class = %class, "Starting new game");

        self.narrator.start_session(character);
        let opening = self.narrator.begin(character).await;

        let mut report = TurnReport::default();
        match opening {
            Ok(result) => self.apply_result(&result, &mut report),
            Err(e) => {
                tracing::warn!(error = %e, "Opening narration failed");
                self.story_log = StoryLog::new();
                self.story_log.push(Message::dm(OPENING_FAILURE_TEXT));
                report.error = Some(format!("No se pudo iniciar el juego. Detalles: {e}"));
            }
        }
        drop(guard);

        self.finish_turn(&mut report).await;
        Ok(report)
    }

    /// Resume the saved game.
    ///
    /// A corrupted save is deleted and the session returns to the title
    /// screen.
    pub async fn load_game(&mut self) -> Result<(), SessionError> {
        if self.gate.is_pending() {
            return Err(SessionError::TurnInProgress);
        }

        let snapshot = match load_snapshot(&self.store).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Err(SessionError::NoSavedGame),
            Err(PersistError::Corrupted(reason)) => {
                tracing::warn!(%reason, "Saved game is corrupted, deleting it");
                if let Err(e) = self.store.delete().await {
                    tracing::warn!(error = %e, "Could not delete corrupted save");
                }
                self.clear_game();
                self.phase = GamePhase::Title;
                return Err(SessionError::CorruptedSave);
            }
            Err(e) => return Err(e.into()),
        };

        let GameSnapshot {
            character,
            story_log,
            is_in_combat,
            enemy,
        } = snapshot;

        self.narrator.start_session(&character);
        tracing::info!(name = %character.name, level = character.level, "Loaded saved game");

        self.character = Some(character);
        self.story_log = story_log;
        self.in_combat = is_in_combat;
        self.enemy = enemy;
        self.menu = CombatMenu::Main;
        self.phase = GamePhase::Playing;
        Ok(())
    }

    // ========================================================================
    // Playing
    // ========================================================================

    /// Show a combat submenu. Menus only exist during combat; returns
    /// false otherwise.
    pub fn open_menu(&mut self, menu: CombatMenu) -> bool {
        if self.phase != GamePhase::Playing || !self.in_combat {
            return false;
        }
        self.menu = menu;
        true
    }

    /// Run one turn for a player action.
    pub async fn player_action(&mut self, input: &str) -> Result<TurnReport, SessionError> {
        if self.phase != GamePhase::Playing || self.character.is_none() {
            return Err(SessionError::NotPlaying);
        }
        let guard = self.gate.try_begin().ok_or(SessionError::TurnInProgress)?;

        let action = PlayerAction::parse(input);
        tracing::debug!(%action, in_combat = self.in_combat, "Player action");

        self.story_log.push(Message::player(input));
        self.apply_local_effects(&action);

        let Some(character) = self.character.as_ref() else {
            return Err(SessionError::NotPlaying);
        };
        let reply = self
            .narrator
            .send(input, character, self.enemy.as_ref())
            .await;

        let mut report = TurnReport {
            action: Some(action),
            ..TurnReport::default()
        };
        match reply {
            Ok(result) => self.apply_result(&result, &mut report),
            Err(NarratorError::Transport(reason)) => {
                tracing::warn!(%reason, "Narrator call failed");
                self.story_log.push(Message::dm(INTERRUPTED_TEXT));
                report.error = Some(format!(
                    "El Dungeon Master está confundido. Detalles: {reason}"
                ));
            }
        }
        drop(guard);

        if self.in_combat {
            self.menu = CombatMenu::Main;
        }

        self.finish_turn(&mut report).await;
        Ok(report)
    }

    /// Save the current game.
    pub async fn save(&self) -> Result<(), SessionError> {
        if self.phase != GamePhase::Playing {
            return Err(SessionError::NotPlaying);
        }
        let snapshot = self.snapshot().ok_or(SessionError::NotPlaying)?;
        save_snapshot(&self.store, &snapshot).await?;
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn clear_game(&mut self) {
        self.character = None;
        self.story_log = StoryLog::new();
        self.in_combat = false;
        self.enemy = None;
        self.menu = CombatMenu::Main;
    }

    /// Inventory and cooldown bookkeeping that happens before the narrator
    /// is asked, whatever it answers.
    fn apply_local_effects(&mut self, action: &PlayerAction) {
        let Some(character) = self.character.as_mut() else {
            return;
        };
        match action {
            PlayerAction::UseItem(name) => {
                if !character.consume_item(name) {
                    tracing::debug!(item = %name, "Used an item that is not in the inventory");
                }
            }
            PlayerAction::UseSkill(name) => {
                if !character.trigger_skill(name) {
                    tracing::debug!(skill = %name, "Used an unknown skill");
                }
            }
            _ => {}
        }
    }

    fn apply_result(&mut self, result: &TurnResult, report: &mut TurnReport) {
        let Some(character) = self.character.as_mut() else {
            return;
        };

        let outcome = reconcile(result, character, &mut self.enemy, &mut self.in_combat);
        self.story_log
            .extend(outcome.events.iter().map(NarrativeEvent::to_message));

        if outcome.combat_ended {
            self.menu = CombatMenu::Main;
        }

        report.events = outcome.events;
        report.leveled_up = outcome.leveled_up;
        report.combat_started = outcome.combat_started;
        report.combat_ended = outcome.combat_ended;
        report.player_damaged = outcome.player_damaged;
        report.enemy_damaged = outcome.enemy_damaged;
        report.degraded = result.degraded;
    }

    /// Save, then speak the turn's narration.
    async fn finish_turn(&self, report: &mut TurnReport) {
        report.save_error = self.autosave().await;

        if !self.speech_enabled {
            return;
        }
        let Some(speech) = self.speech.as_ref() else {
            return;
        };
        let Some(NarrativeEvent::Story(text)) = report.events.first() else {
            return;
        };
        report.audio = speech.synthesize(text).await;
    }

    async fn autosave(&self) -> Option<String> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        let snapshot = self.snapshot()?;
        match save_snapshot(&self.store, &snapshot).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Autosave failed");
                Some(SAVE_FAILED_MESSAGE.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_gate_is_exclusive() {
        let gate = TurnGate::default();
        assert!(!gate.is_pending());

        let guard = gate.try_begin().unwrap();
        assert!(gate.is_pending());
        assert!(gate.clone().try_begin().is_none());

        drop(guard);
        assert!(!gate.is_pending());
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn test_new_character_constructor() {
        let new = NewCharacter::new("Aldric", "Humano", "Guerrero");
        assert_eq!(new.name, "Aldric");
        assert_eq!(new.class, "Guerrero");
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(
            SessionError::NoSavedGame.to_string(),
            "No se encontró ninguna partida guardada."
        );
        assert_eq!(
            SessionError::InvalidCharacter("Un héroe debe tener un nombre.".into()).to_string(),
            "Un héroe debe tener un nombre."
        );
    }
}
