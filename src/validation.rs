//! Input validation for CLI arguments.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{PodcastError, Result};
use crate::models::VoiceMap;

/// Parse a date or datetime argument.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM`, and `YYYY-MM-DD HH:MM:SS`.
/// A date-only end bound defaults to the end of that day.
pub fn parse_datetime_input(input: &str, is_end: bool) -> Result<NaiveDateTime> {
    let input = input.trim();

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }

    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        PodcastError::InvalidDate(format!(
            "{input}: use YYYY-MM-DD or YYYY-MM-DD HH:MM"
        ))
    })?;

    let time = if is_end { (23, 59, 59) } else { (0, 0, 0) };
    date.and_hms_opt(time.0, time.1, time.2)
        .ok_or_else(|| PodcastError::InvalidDate(input.to_string()))
}

/// Ensure an output path carries the `.mp3` extension.
#[must_use]
pub fn ensure_mp3_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "mp3") {
        path
    } else {
        path.with_extension("mp3")
    }
}

/// Load a voice map from a JSON file mapping sender handles to voice IDs.
pub fn load_voice_map(path: &Path) -> Result<VoiceMap> {
    let contents = std::fs::read_to_string(path)?;
    let map: VoiceMap = serde_json::from_str(&contents)?;
    if map.is_empty() {
        return Err(PodcastError::InvalidConfig(format!(
            "voice map {} has no entries",
            path.display()
        )));
    }
    Ok(map)
}
