//! The external narrator.
//!
//! The narrator writes the story and proposes what each turn does to the
//! game state. It is untrusted: replies are validated into a
//! [`TurnResult`], and a reply that cannot be understood degrades into
//! [`TurnResult::fallback`] inside the narrator. Only failures to reach the
//! narrator at all cross this boundary, as [`NarratorError::Transport`].

mod anthropic;
pub mod prompt;

pub use anthropic::ClaudeNarrator;

use crate::character::Character;
use crate::enemy::Enemy;
use crate::turn::TurnResult;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that escape the narrator.
#[derive(Debug, Error)]
pub enum NarratorError {
    /// The narrator could not be reached (network, auth, quota).
    #[error("{0}")]
    Transport(String),
}

/// Configuration for a narrator session.
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    /// The model to use (defaults to the client's model).
    pub model: Option<String>,

    /// Maximum tokens per reply.
    pub max_tokens: usize,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Player/narrator exchanges kept in the conversation sent with each
    /// turn. Older ones are dropped; the system prompt is always sent.
    pub max_exchanges: usize,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 2048,
            temperature: Some(0.9),
            max_exchanges: 40,
        }
    }
}

impl NarratorConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_exchanges(mut self, exchanges: usize) -> Self {
        self.max_exchanges = exchanges;
        self
    }
}

/// A story narrator bound to one character's adventure.
#[async_trait]
pub trait Narrator: Send {
    /// Start a fresh conversation grounded on this character's sheet.
    /// Any previous conversation is discarded.
    fn start_session(&mut self, character: &Character);

    /// Ask for the opening scene.
    async fn begin(&mut self, character: &Character) -> Result<TurnResult, NarratorError>;

    /// Narrate the outcome of a player action.
    async fn send(
        &mut self,
        action: &str,
        character: &Character,
        enemy: Option<&Enemy>,
    ) -> Result<TurnResult, NarratorError>;
}
