//! Preflight prerequisite checks.
//!
//! Run before any real work to catch the usual setup problems: missing
//! ffmpeg, an unreadable chat.db (Full Disk Access), a missing API key.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;

/// Environment variable holding the ElevenLabs API key.
pub const API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Short check name
    pub name: String,
    /// True if the check passed
    pub passed: bool,
    /// Human-readable outcome
    pub message: String,
    /// How to fix a failed check
    pub fix_instruction: Option<String>,
}

impl CheckResult {
    fn pass(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message,
            fix_instruction: None,
        }
    }

    fn fail(name: &str, message: String, fix: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message,
            fix_instruction: Some(fix.to_string()),
        }
    }
}

/// Check that ffmpeg is installed and reachable.
#[must_use]
pub fn check_ffmpeg() -> CheckResult {
    if let Some(path) = find_ffmpeg() {
        return CheckResult::pass("ffmpeg", format!("Found at {}", path.display()));
    }
    CheckResult::fail(
        "ffmpeg",
        "ffmpeg not found; audio stitching requires it".to_string(),
        "Install it with: brew install ffmpeg (macOS)",
    )
}

/// Locate ffmpeg on PATH, falling back to the usual Homebrew locations.
fn find_ffmpeg() -> Option<PathBuf> {
    if let Ok(path_var) = std::env::var("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join("ffmpeg");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    // Homebrew may not be on PATH in a fresh terminal
    for candidate in ["/opt/homebrew/bin/ffmpeg", "/usr/local/bin/ffmpeg"] {
        let path = PathBuf::from(candidate);
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

/// Check that the iMessage database exists and is readable.
#[must_use]
pub fn check_chat_db(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::fail(
            "chat.db",
            format!("iMessage database not found at {}", path.display()),
            "Grant Full Disk Access to your terminal: System Preferences > \
             Security & Privacy > Privacy > Full Disk Access",
        );
    }
    match std::fs::File::open(path) {
        Ok(_) => CheckResult::pass("chat.db", format!("Readable at {}", path.display())),
        Err(e) => CheckResult::fail(
            "chat.db",
            format!("Cannot read {}: {e}", path.display()),
            "Grant Full Disk Access to your terminal: System Preferences > \
             Security & Privacy > Privacy > Full Disk Access",
        ),
    }
}

/// Check that the ElevenLabs API key environment variable is set.
#[must_use]
pub fn check_api_key() -> CheckResult {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => {
            CheckResult::pass("API key", format!("{API_KEY_ENV} is set"))
        }
        _ => CheckResult::fail(
            "API key",
            format!("{API_KEY_ENV} is not set"),
            "Export your ElevenLabs API key: export ELEVENLABS_API_KEY=...",
        ),
    }
}

/// Run every preflight check against the loaded configuration.
#[must_use]
pub fn run_checks(config: &AppConfig) -> Vec<CheckResult> {
    vec![
        check_ffmpeg(),
        check_chat_db(Path::new(&config.get_imessage_db_path())),
        check_api_key(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_chat_db_fails_with_fix() {
        let result = check_chat_db(Path::new("/nonexistent/chat.db"));
        assert!(!result.passed);
        assert!(result.fix_instruction.is_some());
    }

    #[test]
    fn test_readable_chat_db_passes() {
        let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let result = check_chat_db(file.path());
        assert!(result.passed);
    }

    #[test]
    fn test_ffmpeg_check_does_not_panic() {
        let result = check_ffmpeg();
        assert_eq!(result.name, "ffmpeg");
    }
}
