//! Configuration management.

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// iMessage database settings
    pub imessage: IMessageConfig,
    /// ElevenLabs TTS settings
    pub tts: TtsConfig,
    /// Pipeline tuning
    pub podcast: PodcastConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// iMessage database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IMessageConfig {
    /// Path to chat.db
    pub database_path: String,
}

/// ElevenLabs TTS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    /// API base URL
    pub api_base: String,
    /// Synthesis model identifier
    pub model_id: String,
    /// Requested audio output format
    pub output_format: String,
}

/// Pipeline tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastConfig {
    /// Silence between stitched segments, in milliseconds
    pub pause_ms: u32,
    /// Maximum gap for merging consecutive same-sender messages, in seconds
    pub merge_gap_secs: i64,
    /// Synthesis cost per character, in USD
    pub cost_per_char: f64,
    /// Per-request timeout for URL title fetches, in seconds
    pub url_fetch_timeout_secs: u64,
    /// Capacity of the URL title cache
    pub url_cache_capacity: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Optional log file path
    pub file_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
        Self {
            imessage: IMessageConfig {
                database_path: format!("{home}/Library/Messages/chat.db"),
            },
            tts: TtsConfig {
                api_base: crate::tts::DEFAULT_API_BASE.to_string(),
                model_id: crate::tts::DEFAULT_MODEL_ID.to_string(),
                output_format: crate::tts::DEFAULT_OUTPUT_FORMAT.to_string(),
            },
            podcast: PodcastConfig {
                pause_ms: crate::audio::DEFAULT_PAUSE_MS,
                merge_gap_secs: crate::merge::DEFAULT_MERGE_GAP_SECS,
                // Roughly the ElevenLabs Creator plan rate per character
                cost_per_char: 0.30 / 1000.0,
                url_fetch_timeout_secs: 5,
                url_cache_capacity: 256,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();
        // Start with default values
        for (key, value) in AppConfig::default() {
            builder = builder.set_default(key, value)?;
        }
        let config = builder
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("PODCAST").separator("_"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.imessage.database_path.is_empty() {
            return Err(anyhow::anyhow!("database_path must not be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        if self.podcast.merge_gap_secs < 0 {
            return Err(anyhow::anyhow!("merge_gap_secs must not be negative"));
        }

        if self.podcast.cost_per_char < 0.0 {
            return Err(anyhow::anyhow!("cost_per_char must not be negative"));
        }

        if self.podcast.url_fetch_timeout_secs == 0 {
            return Err(anyhow::anyhow!("url_fetch_timeout_secs must be greater than 0"));
        }

        if self.podcast.url_cache_capacity == 0 {
            return Err(anyhow::anyhow!("url_cache_capacity must be greater than 0"));
        }

        if self.tts.model_id.is_empty() {
            return Err(anyhow::anyhow!("model_id must not be empty"));
        }

        Ok(())
    }

    /// Get iMessage database path from environment or config
    #[must_use]
    pub fn get_imessage_db_path(&self) -> String {
        std::env::var("IMESSAGE_DB_PATH").unwrap_or_else(|_| self.imessage.database_path.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert(
            "imessage.database_path".to_string(),
            config::Value::from(self.imessage.database_path),
        );

        map.insert("tts.api_base".to_string(), config::Value::from(self.tts.api_base));
        map.insert("tts.model_id".to_string(), config::Value::from(self.tts.model_id));
        map.insert(
            "tts.output_format".to_string(),
            config::Value::from(self.tts.output_format),
        );

        map.insert("podcast.pause_ms".to_string(), config::Value::from(self.podcast.pause_ms));
        map.insert(
            "podcast.merge_gap_secs".to_string(),
            config::Value::from(self.podcast.merge_gap_secs),
        );
        map.insert(
            "podcast.cost_per_char".to_string(),
            config::Value::from(self.podcast.cost_per_char),
        );
        map.insert(
            "podcast.url_fetch_timeout_secs".to_string(),
            config::Value::from(self.podcast.url_fetch_timeout_secs),
        );
        map.insert(
            "podcast.url_cache_capacity".to_string(),
            config::Value::from(self.podcast.url_cache_capacity as u64),
        );

        map.insert("logging.level".to_string(), config::Value::from(self.logging.level));
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }

        map.into_iter()
    }
}
