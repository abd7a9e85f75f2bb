//! Groupchat Podcast - iMessage to Multi-Voice Audio
//!
//! A Rust library for converting iMessage group chat conversations into
//! podcast-style audio narration with a distinct synthesized voice per
//! participant.
//!
//! # Pipeline
//!
//! - Extract messages from the iMessage database for a date range
//! - Decode rich-text blobs, filter reactions, reorder thread replies
//! - Merge rapid-fire same-sender messages
//! - Normalize text for speech (emoji, slang, caps, punctuation, URLs)
//! - Synthesize each utterance with its sender's voice and stitch the result

/// Audio segment stitching
pub mod audio;
/// Configuration management
pub mod config;
/// macOS Contacts resolution
pub mod contacts;
/// Read-only chat.db access
pub mod db;
/// Error types
pub mod error;
/// Message extraction pipeline
pub mod extract;
/// Logging setup and utilities
pub mod logging;
/// Consecutive-message merging
pub mod merge;
/// Data models and structures
pub mod models;
/// Text normalization for speech
pub mod normalize;
/// Podcast orchestration
pub mod podcast;
/// Preflight prerequisite checks
pub mod preflight;
/// Thread reply reordering
pub mod threads;
/// Mac-epoch timestamp conversion
pub mod timestamp;
/// ElevenLabs TTS client
pub mod tts;
/// attributedBody blob decoding
pub mod typedstream;
/// URL dereferencing for speech
pub mod urls;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use db::ChatDb;
pub use error::{PodcastError, Result};
pub use models::{CostEstimate, GroupChat, Utterance, VoiceMap};
pub use normalize::TextNormalizer;
pub use podcast::PodcastGenerator;
