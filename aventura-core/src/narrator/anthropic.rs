//! Narrator backed by the Claude Messages API.
//!
//! Structured replies are obtained by forcing a single tool whose input
//! schema is the turn result schema. The conversation is kept for the
//! lifetime of a session so the story stays coherent.

use super::prompt::{action_prompt, system_prompt, OPENING_TRIGGER};
use super::{Narrator, NarratorConfig, NarratorError};
use crate::character::Character;
use crate::enemy::Enemy;
use crate::turn::TurnResult;
use async_trait::async_trait;
use claude::{Claude, Message, Request, Response, Tool};

/// Name of the tool the narrator must answer through.
const TURN_TOOL: &str = "registrar_turno";

/// A conversation with Claude acting as Dungeon Master.
pub struct ClaudeNarrator {
    client: Claude,
    config: NarratorConfig,
    system: Option<String>,
    history: Vec<Message>,
}

impl ClaudeNarrator {
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            config: NarratorConfig::default(),
            system: None,
            history: Vec::new(),
        }
    }

    /// Create a narrator from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, NarratorError> {
        let client = Claude::from_env().map_err(|e| NarratorError::Transport(e.to_string()))?;
        Ok(Self::new(client))
    }

    pub fn with_config(mut self, config: NarratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of messages exchanged in the current session.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn turn_tool() -> Tool {
        Tool {
            name: TURN_TOOL.to_string(),
            description: "Registra el resultado de este turno: la narración y cualquier cambio en el combate, las estadísticas, el botín o la experiencia.".to_string(),
            input_schema: TurnResult::schema(),
        }
    }

    fn build_request(&self) -> Request {
        let mut request = Request::new(self.history.clone())
            .with_max_tokens(self.config.max_tokens)
            .forcing_tool(Self::turn_tool());

        if let Some(system) = &self.system {
            request = request.with_system(system);
        }
        if let Some(model) = &self.config.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    async fn exchange(&mut self, user_text: String) -> Result<TurnResult, NarratorError> {
        self.history.push(Message::user(user_text));

        let result = match self.client.complete(self.build_request()).await {
            Ok(response) => {
                tracing::debug!(
                    id = %response.id,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Narrator replied"
                );
                turn_from_response(&response)
            }
            Err(e) if e.is_transport() => {
                // Keep the conversation alternating for the next attempt.
                self.history.pop();
                tracing::warn!(error = %e, "Narrator unreachable");
                return Err(NarratorError::Transport(e.to_string()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Narrator envelope unreadable, using fallback");
                TurnResult::fallback()
            }
        };

        let recorded =
            serde_json::to_string(&result).unwrap_or_else(|_| result.story_text.clone());
        self.history.push(Message::assistant(recorded));
        self.trim_history();

        Ok(result)
    }

    /// Drop the oldest exchanges beyond the configured window. History is
    /// made of user/assistant pairs, so it still starts with a user turn.
    fn trim_history(&mut self) {
        let limit = self.config.max_exchanges.max(1) * 2;
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }
}

#[async_trait]
impl Narrator for ClaudeNarrator {
    fn start_session(&mut self, character: &Character) {
        self.system = Some(system_prompt(character));
        self.history.clear();
        tracing::debug!(character = %character.name, "Narrator session started");
    }

    async fn begin(&mut self, character: &Character) -> Result<TurnResult, NarratorError> {
        if self.system.is_none() {
            self.start_session(character);
        }
        self.exchange(OPENING_TRIGGER.to_string()).await
    }

    async fn send(
        &mut self,
        action: &str,
        character: &Character,
        enemy: Option<&Enemy>,
    ) -> Result<TurnResult, NarratorError> {
        if self.system.is_none() {
            self.start_session(character);
        }
        self.exchange(action_prompt(action, character, enemy)).await
    }
}

/// Pull the turn result out of a Claude reply.
///
/// Prefers the forced tool call; falls back to JSON in the text; degrades to
/// the fallback result when neither decodes.
fn turn_from_response(response: &Response) -> TurnResult {
    match response.tool_input(TURN_TOOL) {
        Some(input) => TurnResult::from_value(input.clone()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Narrator tool input malformed, using fallback");
            TurnResult::fallback()
        }),
        None => TurnResult::decode_or_fallback(&response.text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_data::CharacterClass;
    use claude::{ContentBlock, StopReason, Usage};
    use serde_json::json;

    fn response(content: Vec<ContentBlock>) -> Response {
        Response {
            id: "msg_test".to_string(),
            model: "test".to_string(),
            content,
            stop_reason: StopReason::ToolUse,
            usage: Usage {
                input_tokens: 0,
                output_tokens: 0,
            },
        }
    }

    #[test]
    fn test_tool_input_is_decoded() {
        let reply = response(vec![ContentBlock::ToolUse {
            id: "tu_1".to_string(),
            name: TURN_TOOL.to_string(),
            input: json!({"storyText": "Despiertas.", "xpAward": 5}),
        }]);
        let result = turn_from_response(&reply);
        assert_eq!(result.story_text, "Despiertas.");
        assert_eq!(result.xp_award, Some(5));
        assert!(!result.degraded);
    }

    #[test]
    fn test_malformed_tool_input_degrades() {
        let reply = response(vec![ContentBlock::ToolUse {
            id: "tu_1".to_string(),
            name: TURN_TOOL.to_string(),
            input: json!({"xpAward": "muchos"}),
        }]);
        assert!(turn_from_response(&reply).degraded);
    }

    #[test]
    fn test_text_reply_is_decoded_or_degrades() {
        let reply = response(vec![ContentBlock::Text {
            text: "```json\n{\"storyText\": \"Una voz susurra.\"}\n```".to_string(),
        }]);
        assert_eq!(turn_from_response(&reply).story_text, "Una voz susurra.");

        let reply = response(vec![ContentBlock::Text {
            text: "Lo siento, no puedo continuar.".to_string(),
        }]);
        assert!(turn_from_response(&reply).degraded);
    }

    #[test]
    fn test_start_session_resets_history() {
        let mut narrator = ClaudeNarrator::new(Claude::new("test-key"));
        narrator.history.push(Message::user("viejo"));

        let c = Character::from_class("Aldric", "Humano", CharacterClass::Guerrero);
        narrator.start_session(&c);
        assert_eq!(narrator.history_len(), 0);
        assert!(narrator.system.as_deref().unwrap().contains("Aldric"));
    }

    #[test]
    fn test_history_keeps_latest_exchanges() {
        let mut narrator = ClaudeNarrator::new(Claude::new("test-key"))
            .with_config(NarratorConfig::default().with_max_exchanges(2));
        for turn in 0..5 {
            narrator.history.push(Message::user(format!("acción {turn}")));
            narrator.history.push(Message::assistant(format!("respuesta {turn}")));
            narrator.trim_history();
        }

        assert_eq!(narrator.history_len(), 4);
        assert_eq!(narrator.history[0].role, claude::Role::User);
        assert_eq!(narrator.history[0].content[0].as_text(), Some("acción 3"));
        assert_eq!(narrator.history[3].content[0].as_text(), Some("respuesta 4"));
    }

    #[test]
    fn test_request_forces_turn_tool() {
        let mut narrator = ClaudeNarrator::new(Claude::new("test-key"))
            .with_config(NarratorConfig::default().with_model("claude-test"));
        let c = Character::from_class("Aldric", "Humano", CharacterClass::Guerrero);
        narrator.start_session(&c);

        let request = narrator.build_request();
        assert_eq!(request.model.as_deref(), Some("claude-test"));
        assert_eq!(request.temperature, Some(0.9));
        assert_eq!(request.tools.as_ref().unwrap()[0].name, TURN_TOOL);
        assert!(request.system.is_some());
    }
}
