//! ElevenLabs text-to-speech client.
//!
//! The pipeline only needs one operation from a synthesis backend, so it is
//! modeled as the [`SpeechSynthesizer`] trait and the HTTP client lives behind
//! it. Authentication failures and unknown voice IDs map to distinguishable
//! error variants; everything else propagates unchanged.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{PodcastError, Result};

/// Default API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";

/// Multilingual model used for all synthesis.
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// MP3 output format requested from the API.
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Text-to-speech backend used by the podcast generator.
#[cfg_attr(test, mockall::automock)]
pub trait SpeechSynthesizer {
    /// Synthesize `text` with the given voice, returning encoded audio bytes.
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;
}

/// An available TTS voice.
#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    /// Opaque voice identifier
    pub voice_id: String,
    /// Human-readable voice name
    pub name: String,
    /// Descriptive labels (accent, age, gender, ...)
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<Voice>,
}

/// Blocking HTTP client for the ElevenLabs API.
pub struct ElevenLabsClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsClient {
    /// Create a client with default model and output format.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    /// Create a client against a custom API base (used by tests).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        })
    }

    /// Override the synthesis model.
    pub fn set_model_id(&mut self, model_id: &str) {
        self.model_id = model_id.to_string();
    }

    /// Override the requested audio output format.
    pub fn set_output_format(&mut self, output_format: &str) {
        self.output_format = output_format.to_string();
    }

    /// Search available voices, optionally filtered by name.
    pub fn search_voices(&self, query: &str) -> Result<Vec<Voice>> {
        let mut request = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .header("xi-api-key", &self.api_key);
        if !query.is_empty() {
            request = request.query(&[("search", query)]);
        }

        let response = request.send()?;
        let response = Self::check_status(response, "voice search")?;
        let parsed: VoicesResponse = response.json()?;
        Ok(parsed.voices)
    }

    /// Fetch a single voice by ID, failing with `VoiceNotFound` if unknown.
    pub fn get_voice(&self, voice_id: &str) -> Result<Voice> {
        let response = self
            .client
            .get(format!("{}/v1/voices/{voice_id}", self.base_url))
            .header("xi-api-key", &self.api_key)
            .send()?;
        let response = Self::check_status(response, voice_id)?;
        Ok(response.json()?)
    }

    fn check_status(
        response: reqwest::blocking::Response,
        context: &str,
    ) -> Result<reqwest::blocking::Response> {
        match response.status().as_u16() {
            200..=299 => Ok(response),
            401 | 403 => Err(PodcastError::TtsAuth(format!(
                "API key rejected during {context}"
            ))),
            400 | 404 => Err(PodcastError::VoiceNotFound(context.to_string())),
            status => Err(PodcastError::Tts(format!(
                "unexpected status {status} during {context}"
            ))),
        }
    }
}

impl SpeechSynthesizer for ElevenLabsClient {
    fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        debug!(voice_id, chars = text.len(), "Synthesizing utterance");
        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{voice_id}",
                self.base_url
            ))
            .header("xi-api-key", &self.api_key)
            .query(&[("output_format", self.output_format.as_str())])
            .json(&json!({
                "text": text,
                "model_id": self.model_id,
            }))
            .send()?;

        let response = Self::check_status(response, voice_id)?;
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_deserializes_without_labels() {
        let voice: Voice = serde_json::from_str(r#"{"voice_id": "v1", "name": "Rachel"}"#)
            .expect("Failed to parse voice");
        assert_eq!(voice.voice_id, "v1");
        assert!(voice.labels.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ElevenLabsClient::with_base_url("key", "https://api.example.com/")
            .expect("Failed to build client");
        assert_eq!(client.base_url, "https://api.example.com");
    }
}
