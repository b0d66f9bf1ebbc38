//! The structured reply the narrator gives for each turn.
//!
//! A `TurnResult` is a *proposal*: the reconciler decides what it does to
//! the game state. Numbers are kept as `i64` so that out-of-range values
//! survive decoding and get clamped later instead of being rejected here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Story line used when the narrator's reply cannot be understood.
pub const FALLBACK_STORY_TEXT: &str =
    "Una fuerza misteriosa perturba la realidad, y el mundo parece detenerse... (Respuesta inválida del DM)";

/// The narrator replied, but not in the expected shape.
#[derive(Debug, Error)]
#[error("malformed narrator response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,
}

/// Start of a new combat encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub hp: i64,
    pub attack: i64,
    pub defense: i64,
}

/// New values for the player's pools. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_mp: Option<i64>,
}

/// New values for the enemy. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i64>,
}

/// A found item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootItem {
    pub name: String,
    pub description: String,
    pub quantity: i64,
}

/// Items found this turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loot {
    #[serde(default)]
    pub items: Vec<LootItem>,
}

/// One structured narrator reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub story_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Encounter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_update: Option<PlayerUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enemy_update: Option<EnemyUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loot: Option<Loot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combat_over: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_award: Option<i64>,

    /// Set on the synthetic result produced from an unreadable reply.
    #[serde(skip)]
    pub degraded: bool,
}

impl TurnResult {
    /// A plain narration with no mechanical effects.
    pub fn narration(text: impl Into<String>) -> Self {
        Self {
            story_text: text.into(),
            ..Self::default()
        }
    }

    /// The stand-in result for a reply that could not be decoded.
    pub fn fallback() -> Self {
        Self {
            story_text: FALLBACK_STORY_TEXT.to_string(),
            degraded: true,
            ..Self::default()
        }
    }

    /// Decode a raw narrator reply.
    ///
    /// Markdown code fences around the JSON are tolerated.
    pub fn decode(raw: &str) -> Result<Self, MalformedResponse> {
        let cleaned = raw.trim().replace("```json", "").replace("```", "");
        serde_json::from_str(cleaned.trim()).map_err(|e| MalformedResponse {
            reason: e.to_string(),
        })
    }

    /// Decode an already-parsed reply, such as a tool call input.
    pub fn from_value(value: Value) -> Result<Self, MalformedResponse> {
        serde_json::from_value(value).map_err(|e| MalformedResponse {
            reason: e.to_string(),
        })
    }

    /// Decode a raw reply, degrading to [`TurnResult::fallback`] when it is
    /// malformed.
    pub fn decode_or_fallback(raw: &str) -> Self {
        Self::decode(raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, raw = %raw, "Narrator reply unreadable, using fallback");
            Self::fallback()
        })
    }

    /// JSON Schema of a turn result, given to the narrator as the shape its
    /// replies must follow.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "storyText": {
                    "type": "string",
                    "description": "La descripción narrativa de lo que está sucediendo. Esto siempre es obligatorio."
                },
                "encounter": {
                    "type": "object",
                    "description": "Señala el inicio de un nuevo encuentro de combate. Incluir solo cuando comienza el combate.",
                    "properties": {
                        "name": { "type": "string" },
                        "description": { "type": "string" },
                        "hp": { "type": "integer" },
                        "attack": { "type": "integer" },
                        "defense": { "type": "integer" }
                    },
                    "required": ["name", "hp", "attack", "defense"]
                },
                "playerUpdate": {
                    "type": "object",
                    "description": "Proporciona actualizaciones a las estadísticas del jugador (PS, PM). Solo incluye lo que ha cambiado.",
                    "properties": {
                        "currentHp": { "type": "integer" },
                        "currentMp": { "type": "integer" }
                    }
                },
                "enemyUpdate": {
                    "type": "object",
                    "description": "Proporciona actualizaciones a las estadísticas del enemigo (PS). Solo incluye si ha cambiado.",
                    "properties": {
                        "currentHp": { "type": "integer" }
                    }
                },
                "loot": {
                    "type": "object",
                    "description": "Especifica los objetos que el jugador ha encontrado.",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "name": { "type": "string" },
                                    "description": { "type": "string" },
                                    "quantity": { "type": "integer" }
                                },
                                "required": ["name", "description", "quantity"]
                            }
                        }
                    }
                },
                "combatOver": {
                    "type": "boolean",
                    "description": "Establecer en true si el combate ha terminado (el jugador ganó, perdió o huyó)."
                },
                "xpAward": {
                    "type": "integer",
                    "description": "La cantidad de puntos de experiencia (XP) otorgados al jugador por ganar un combate o completar una tarea."
                }
            },
            "required": ["storyText"]
        })
    }
}
