//! Text adventure engine with an AI Dungeon Master.
//!
//! The narrator (Claude) writes the story; this crate owns the game state:
//! - Character sheet, inventory, spells, skill cooldowns and leveling
//! - The single combat opponent and the combat lifecycle
//! - Reconciliation of each structured narrator reply into that state
//! - Save/load of the whole game as one snapshot
//!
//! # Quick Start
//!
//! ```ignore
//! use aventura_core::{ClaudeNarrator, FileStore, GameSession, NewCharacter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let narrator = ClaudeNarrator::from_env()?;
//!     let mut session = GameSession::new(narrator, FileStore::new("partidas"));
//!
//!     session.request_new_game(true).await?;
//!     session.start_game(NewCharacter::new("Aldric", "Humano", "Guerrero")).await?;
//!
//!     let report = session.player_action("abrir la puerta").await?;
//!     for event in &report.events {
//!         println!("{}", event.to_message().text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod character;
pub mod class_data;
pub mod enemy;
pub mod log;
pub mod narrator;
pub mod persist;
pub mod reconcile;
pub mod session;
pub mod speech;
pub mod testing;
pub mod turn;

// Primary public API
pub use action::PlayerAction;
pub use character::{Character, Item, Skill, Spell};
pub use class_data::{CharacterClass, RACES};
pub use enemy::Enemy;
pub use log::{Message, Speaker, StoryLog};
pub use narrator::{ClaudeNarrator, Narrator, NarratorConfig, NarratorError};
pub use persist::{FileStore, GameSnapshot, MemoryStore, PersistError, SaveStore};
pub use reconcile::{reconcile, NarrativeEvent, Reconciliation};
pub use session::{
    CombatMenu, GamePhase, GameSession, NewCharacter, NewGame, SessionError, TurnGate, TurnReport,
};
pub use speech::{OpenAiSpeech, SpeechConfig, SpeechSynthesizer};
pub use testing::{ScriptedNarrator, ScriptedReply};
pub use turn::{MalformedResponse, TurnResult};
