//! Audio segment stitching.
//!
//! Concatenates per-utterance MP3 segments into one file with a fixed silence
//! gap between consecutive segments (none before the first or after the
//! last). The heavy lifting is delegated to ffmpeg, which the preflight
//! checks already require; a single segment skips ffmpeg entirely.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{PodcastError, Result};

/// Default silence between segments, in milliseconds.
pub const DEFAULT_PAUSE_MS: u32 = 500;

/// Stitch ordered audio segments into `output_path`.
///
/// Fails with `Stitch` when given an empty segment list.
pub fn stitch_audio(segments: &[PathBuf], output_path: &Path, pause_ms: u32) -> Result<()> {
    if segments.is_empty() {
        return Err(PodcastError::Stitch(
            "cannot stitch empty segment list".to_string(),
        ));
    }

    // One segment needs no gaps; copy the bytes straight through
    if segments.len() == 1 {
        fs::copy(&segments[0], output_path)?;
        info!(output = %output_path.display(), "Wrote single-segment audio");
        return Ok(());
    }

    let scratch = tempfile::tempdir()?;
    let silence_path = scratch.path().join("silence.mp3");
    if pause_ms > 0 {
        make_silence(&silence_path, pause_ms)?;
    }

    // ffmpeg concat demuxer: segment, silence, segment, ..., segment
    let list_path = scratch.path().join("concat.txt");
    let mut list = String::new();
    for (i, segment) in segments.iter().enumerate() {
        list.push_str(&format!("file '{}'\n", segment.display()));
        if pause_ms > 0 && i < segments.len() - 1 {
            list.push_str(&format!("file '{}'\n", silence_path.display()));
        }
    }
    fs::write(&list_path, list)?;

    let output = Command::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(&list_path)
        .args(["-c:a", "libmp3lame", "-q:a", "4"])
        .arg(output_path)
        .output()
        .map_err(|e| PodcastError::Stitch(format!("failed to run ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(PodcastError::Stitch(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    info!(
        segments = segments.len(),
        pause_ms,
        output = %output_path.display(),
        "Stitched audio segments"
    );
    Ok(())
}

/// Render a silence MP3 of the given duration.
fn make_silence(path: &Path, pause_ms: u32) -> Result<()> {
    let duration_secs = f64::from(pause_ms) / 1000.0;
    debug!(pause_ms, "Rendering silence gap");
    let output = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            "anullsrc=r=44100:cl=mono",
            "-t",
        ])
        .arg(format!("{duration_secs:.3}"))
        .args(["-c:a", "libmp3lame", "-q:a", "4"])
        .arg(path)
        .output()
        .map_err(|e| PodcastError::Stitch(format!("failed to run ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(PodcastError::Stitch(format!(
            "ffmpeg silence render exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}
