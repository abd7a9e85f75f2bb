//! Consecutive-message merging.
//!
//! Group chats are full of rapid-fire bursts from one sender. Synthesizing
//! each fragment separately produces choppy audio with a pause after every
//! line, so same-sender runs within a time gap are coalesced into a single
//! utterance using a punctuation-aware joiner.

use chrono::Duration;
use tracing::debug;

use crate::models::Utterance;

/// Default maximum gap between merged messages, in seconds.
pub const DEFAULT_MERGE_GAP_SECS: i64 = 300;

/// Coalesce runs of consecutive same-sender utterances.
///
/// A run accumulates while the sender stays the same and each entry follows
/// the previous one within `max_gap_secs`. The merged utterance carries the
/// first member's sender, timestamp, guid, and thread reference; the
/// attachment flag is the OR across the run; text is the ordered smart-join.
#[must_use]
pub fn merge_consecutive(utterances: Vec<Utterance>, max_gap_secs: i64) -> Vec<Utterance> {
    let max_gap = Duration::seconds(max_gap_secs);
    let mut result: Vec<Utterance> = Vec::new();
    let mut run: Option<Utterance> = None;
    let mut last_timestamp = None;

    let input_len = utterances.len();
    for utterance in utterances {
        let continues_run = run.as_ref().is_some_and(|current| {
            current.sender == utterance.sender
                && last_timestamp
                    .is_some_and(|prev| utterance.timestamp - prev <= max_gap)
        });

        last_timestamp = Some(utterance.timestamp);
        if continues_run {
            if let Some(current) = run.as_mut() {
                current.has_attachment = current.has_attachment || utterance.has_attachment;
                let joined = smart_join(
                    current.text.as_deref().unwrap_or(""),
                    utterance.text.as_deref().unwrap_or(""),
                );
                current.text = Some(joined);
            }
        } else {
            if let Some(finished) = run.take() {
                result.push(finished);
            }
            run = Some(utterance);
        }
    }

    // A trailing run always closes at end of input
    if let Some(finished) = run.take() {
        result.push(finished);
    }

    debug!(before = input_len, after = result.len(), "Merged consecutive messages");
    result
}

/// Punctuation-aware concatenation for merged message text.
///
/// An empty accumulator takes the next piece verbatim. Otherwise text ending
/// in sentence punctuation joins with a space, and anything else joins with
/// ", ".
#[must_use]
pub fn smart_join(accumulated: &str, next: &str) -> String {
    if accumulated.is_empty() {
        return next.to_string();
    }
    if next.is_empty() {
        return accumulated.to_string();
    }
    match accumulated.chars().last() {
        Some('.' | '!' | '?') => format!("{accumulated} {next}"),
        _ => format!("{accumulated}, {next}"),
    }
}
