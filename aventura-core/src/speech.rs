//! Optional spoken narration.
//!
//! Speech is a side channel: a synthesizer never fails a turn, it just
//! produces no audio.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Turns narration text into audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`. Returns `None` on any failure.
    async fn synthesize(&self, text: &str) -> Option<Vec<u8>>;
}

/// Settings for an OpenAI-compatible speech endpoint.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub base_url: String,
    pub model: String,
    pub voice: String,
    /// Audio container requested from the endpoint.
    pub format: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "tts-1".to_string(),
            voice: "onyx".to_string(),
            format: "mp3".to_string(),
        }
    }
}

impl SpeechConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Speech through the OpenAI `/v1/audio/speech` API, or any server that
/// speaks it.
#[derive(Clone)]
pub struct OpenAiSpeech {
    client: reqwest::Client,
    api_key: String,
    config: SpeechConfig,
}

impl OpenAiSpeech {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key: api_key.into(),
            config: SpeechConfig::default(),
        }
    }

    /// Create from the OPENAI_API_KEY environment variable, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("OPENAI_API_KEY").ok().map(Self::new)
    }

    pub fn with_config(mut self, config: SpeechConfig) -> Self {
        self.config = config;
        self
    }

    async fn request_audio(&self, text: &str) -> Result<Vec<u8>, reqwest::Error> {
        let body = SpeechRequest {
            model: &self.config.model,
            voice: &self.config.voice,
            input: text,
            response_format: &self.config.format,
        };

        let bytes = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Option<Vec<u8>> {
        if text.trim().is_empty() {
            return None;
        }

        match self.request_audio(text).await {
            Ok(audio) if !audio.is_empty() => Some(audio),
            Ok(_) => {
                tracing::warn!("Speech endpoint returned no audio");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Speech synthesis failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SpeechConfig::default()
            .with_base_url("http://localhost:8880/v1/")
            .with_voice("nova");
        assert_eq!(config.endpoint(), "http://localhost:8880/v1/audio/speech");
        assert_eq!(config.voice, "nova");
        assert_eq!(config.format, "mp3");
    }

    #[test]
    fn test_request_body() {
        let body = SpeechRequest {
            model: "tts-1",
            voice: "onyx",
            input: "Despiertas.",
            response_format: "mp3",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["input"], "Despiertas.");
        assert_eq!(value["response_format"], "mp3");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_none() {
        let speech = OpenAiSpeech::new("test-key")
            .with_config(SpeechConfig::default().with_base_url("http://127.0.0.1:9"));
        assert!(speech.synthesize("Hola").await.is_none());
        assert!(speech.synthesize("   ").await.is_none());
    }
}
