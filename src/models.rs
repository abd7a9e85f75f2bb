//! Data models for chat extraction and podcast generation.
//!
//! This module contains the data structures used throughout the pipeline:
//! group chats, raw database rows, transcript utterances, voice assignments,
//! and cost estimates.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved voice-map key used when no sender-specific voice was assigned
pub const DEFAULT_VOICE_KEY: &str = "_default";

/// Sender identifier for messages sent by the local user
pub const SELF_SENDER: &str = "Me";

/// An iMessage group chat
#[derive(Debug, Clone)]
pub struct GroupChat {
    /// chat table ROWID
    pub chat_id: i64,
    /// Display name, or "Unnamed Group"
    pub display_name: String,
    /// Number of distinct participants (excluding the local user)
    pub participant_count: usize,
    /// Raw participant handles (phone numbers or emails)
    pub participants: Vec<String>,
    /// Local timestamp of the most recent message, used for sort order
    pub last_message_date: Option<NaiveDateTime>,
}

/// One raw row from the message table, joined with sender and attachment info
#[derive(Debug, Clone)]
pub struct RawMessageRow {
    /// Globally unique message identifier
    pub guid: String,
    /// Primary plain-text field
    pub text: Option<String>,
    /// Rich-text blob used when `text` is NULL
    pub attributed_body: Option<Vec<u8>>,
    /// Mac-epoch nanosecond timestamp
    pub date: i64,
    /// Resolved sender: the self sentinel or a raw handle
    pub sender: String,
    /// True if the message carries attachments
    pub has_attachment: bool,
    /// MIME type of the first attachment, if any
    pub attachment_mime_type: Option<String>,
    /// Parent message guid for thread replies
    pub thread_originator_guid: Option<String>,
}

/// One speakable unit in the transcript
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Resolved sender handle or the self sentinel
    pub sender: String,
    /// Speakable text; `None` when the row had neither text nor attachment
    pub text: Option<String>,
    /// Local civil timestamp
    pub timestamp: NaiveDateTime,
    /// Originating message guid
    pub guid: String,
    /// Parent message guid for thread replies
    pub thread_originator_guid: Option<String>,
    /// True if any constituent message carried an attachment
    pub has_attachment: bool,
    /// MIME type of the first attachment, if any
    pub attachment_type: Option<String>,
}

impl Utterance {
    /// True when the utterance has non-whitespace text to speak.
    #[must_use]
    pub fn has_speakable_text(&self) -> bool {
        self.text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// Mapping from raw participant handles to TTS voice identifiers.
///
/// Keys are raw handles exactly as extracted; display-name resolution never
/// affects voice lookup. The reserved [`DEFAULT_VOICE_KEY`] entry is the
/// fallback for unmapped senders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceMap {
    voices: HashMap<String, String>,
}

impl VoiceMap {
    /// Create an empty voice map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a voice to a sender handle.
    pub fn assign(&mut self, sender: &str, voice_id: &str) {
        self.voices.insert(sender.to_string(), voice_id.to_string());
    }

    /// Resolve the voice for a sender: the sender-specific entry, else the
    /// reserved default entry, else `None`.
    #[must_use]
    pub fn resolve(&self, sender: &str) -> Option<&str> {
        self.voices
            .get(sender)
            .or_else(|| self.voices.get(DEFAULT_VOICE_KEY))
            .map(String::as_str)
    }

    /// True when no voices have been assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

/// Cost estimate for a generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Number of utterances that would be synthesized
    pub message_count: usize,
    /// Total normalized character count
    pub characters: usize,
    /// Estimated cost in USD
    pub estimated_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_map_resolution_order() {
        let mut map = VoiceMap::new();
        map.assign("+15551234567", "voice-a");
        map.assign(DEFAULT_VOICE_KEY, "voice-fallback");

        assert_eq!(map.resolve("+15551234567"), Some("voice-a"));
        assert_eq!(map.resolve("unknown@example.com"), Some("voice-fallback"));
    }

    #[test]
    fn test_voice_map_without_default() {
        let mut map = VoiceMap::new();
        map.assign("Me", "voice-me");
        assert_eq!(map.resolve("someone-else"), None);
    }

    #[test]
    fn test_voice_map_json_round_trip() {
        let json = r#"{"Me": "v1", "_default": "v2"}"#;
        let map: VoiceMap = serde_json::from_str(json).expect("Failed to parse voice map");
        assert_eq!(map.resolve("Me"), Some("v1"));
        assert_eq!(map.resolve("anyone"), Some("v2"));
    }

    #[test]
    fn test_has_speakable_text() {
        let base = Utterance {
            sender: "Me".to_string(),
            text: None,
            timestamp: chrono::NaiveDateTime::default(),
            guid: "g1".to_string(),
            thread_originator_guid: None,
            has_attachment: false,
            attachment_type: None,
        };
        assert!(!base.has_speakable_text());

        let mut blank = base.clone();
        blank.text = Some("   ".to_string());
        assert!(!blank.has_speakable_text());

        let mut spoken = base;
        spoken.text = Some("hi".to_string());
        assert!(spoken.has_speakable_text());
    }
}
