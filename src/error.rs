//! Error types for the groupchat-podcast library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the groupchat-podcast application.
#[derive(Error, Debug)]
pub enum PodcastError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Error connecting to or querying the iMessage database
    #[error("iMessage database error: {0}")]
    IMessageDatabase(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The TTS service rejected the API key
    #[error("TTS authentication failed: {0}")]
    TtsAuth(String),

    /// The requested voice ID does not exist
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Any other TTS service failure
    #[error("TTS error: {0}")]
    Tts(String),

    /// Extraction produced no speakable utterances
    #[error("No messages to generate podcast from: {0}")]
    EmptyTranscript(String),

    /// Every utterance was skipped for lack of a resolvable voice
    #[error("No audio segments generated: {0}")]
    NoAudioSegments(String),

    /// Audio stitching failure
    #[error("Audio stitching error: {0}")]
    Stitch(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with PodcastError
pub type Result<T> = std::result::Result<T, PodcastError>;

impl From<anyhow::Error> for PodcastError {
    fn from(err: anyhow::Error) -> Self {
        PodcastError::Other(err.to_string())
    }
}
