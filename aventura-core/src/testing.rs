//! Testing utilities.
//!
//! - `ScriptedNarrator` replays queued narrator replies without API calls
//! - `ScriptedReply` is one queued reply: a raw payload or a transport failure
//!
//! Raw payloads go through the same decoder as real replies, so invalid
//! payloads exercise the malformed-reply fallback.

use crate::character::Character;
use crate::enemy::Enemy;
use crate::narrator::prompt::OPENING_TRIGGER;
use crate::narrator::{Narrator, NarratorError};
use crate::turn::TurnResult;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Narration returned once the script runs out.
pub const SCRIPT_EXHAUSTED_TEXT: &str = "El Dungeon Master guarda silencio.";

/// One queued narrator reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Reply text, decoded as if it came from the narrator.
    Raw(String),
    /// The narrator cannot be reached.
    TransportFailure(String),
}

/// A narrator that returns scripted replies in order.
#[derive(Debug, Default)]
pub struct ScriptedNarrator {
    replies: VecDeque<ScriptedReply>,
    received: Vec<String>,
    sessions: Vec<String>,
}

impl ScriptedNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a well-formed reply.
    pub fn reply(mut self, result: TurnResult) -> Self {
        self.push(result);
        self
    }

    /// Queue a reply given as JSON.
    pub fn reply_json(self, value: serde_json::Value) -> Self {
        self.reply_raw(value.to_string())
    }

    /// Queue a raw reply, which may be malformed.
    pub fn reply_raw(mut self, raw: impl Into<String>) -> Self {
        self.replies.push_back(ScriptedReply::Raw(raw.into()));
        self
    }

    /// Queue a transport failure.
    pub fn fail(mut self, reason: impl Into<String>) -> Self {
        self.push_failure(reason);
        self
    }

    /// Queue a well-formed reply on a narrator already in use.
    pub fn push(&mut self, result: TurnResult) {
        let raw = serde_json::to_string(&result).unwrap_or_default();
        self.replies.push_back(ScriptedReply::Raw(raw));
    }

    pub fn push_raw(&mut self, raw: impl Into<String>) {
        self.replies.push_back(ScriptedReply::Raw(raw.into()));
    }

    pub fn push_failure(&mut self, reason: impl Into<String>) {
        self.replies
            .push_back(ScriptedReply::TransportFailure(reason.into()));
    }

    /// Every prompt sent so far: the opening trigger for `begin`, the raw
    /// action for `send`.
    pub fn received(&self) -> &[String] {
        &self.received
    }

    /// Names of the characters each session was started for.
    pub fn sessions(&self) -> &[String] {
        &self.sessions
    }

    /// Replies still queued.
    pub fn remaining(&self) -> usize {
        self.replies.len()
    }

    fn next_reply(&mut self) -> Result<TurnResult, NarratorError> {
        match self.replies.pop_front() {
            Some(ScriptedReply::Raw(raw)) => Ok(TurnResult::decode_or_fallback(&raw)),
            Some(ScriptedReply::TransportFailure(reason)) => Err(NarratorError::Transport(reason)),
            None => Ok(TurnResult::narration(SCRIPT_EXHAUSTED_TEXT)),
        }
    }
}

#[async_trait]
impl Narrator for ScriptedNarrator {
    fn start_session(&mut self, character: &Character) {
        self.sessions.push(character.name.clone());
    }

    async fn begin(&mut self, _character: &Character) -> Result<TurnResult, NarratorError> {
        self.received.push(OPENING_TRIGGER.to_string());
        self.next_reply()
    }

    async fn send(
        &mut self,
        action: &str,
        _character: &Character,
        _enemy: Option<&Enemy>,
    ) -> Result<TurnResult, NarratorError> {
        self.received.push(action.to_string());
        self.next_reply()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_data::CharacterClass;
    use crate::turn::FALLBACK_STORY_TEXT;
    use serde_json::json;

    fn hero() -> Character {
        Character::from_class("Aldric", "Humano", CharacterClass::Guerrero)
    }

    #[tokio::test]
    async fn test_replies_in_order() {
        let mut narrator = ScriptedNarrator::new()
            .reply(TurnResult::narration("Primero"))
            .reply_json(json!({"storyText": "Segundo", "xpAward": 10}))
            .reply_raw("basura")
            .fail("sin conexión");

        let c = hero();
        assert_eq!(narrator.begin(&c).await.unwrap().story_text, "Primero");
        assert_eq!(narrator.send("a", &c, None).await.unwrap().xp_award, Some(10));

        let degraded = narrator.send("b", &c, None).await.unwrap();
        assert!(degraded.degraded);
        assert_eq!(degraded.story_text, FALLBACK_STORY_TEXT);

        assert!(narrator.send("c", &c, None).await.is_err());
        assert_eq!(
            narrator.send("d", &c, None).await.unwrap().story_text,
            SCRIPT_EXHAUSTED_TEXT
        );
        assert_eq!(narrator.received(), &[OPENING_TRIGGER, "a", "b", "c", "d"]);
    }
}
