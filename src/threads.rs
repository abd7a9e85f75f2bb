//! Thread reply reordering.
//!
//! Extraction returns rows in strict chronological order, but a reply posted
//! hours after its parent reads as a non sequitur. This pass re-sequences the
//! transcript so each reply group renders immediately after its parent.

use std::collections::{HashMap, HashSet};

use crate::models::Utterance;

/// Reorder utterances so thread replies appear immediately after their parent.
///
/// Utterances are partitioned into the main sequence (no parent, or a parent
/// that was filtered out upstream) and replies. Reply groups are sorted by
/// timestamp and emitted right after their parent; main-sequence order is
/// otherwise preserved.
#[must_use]
pub fn reorder_threads(utterances: Vec<Utterance>) -> Vec<Utterance> {
    let known_guids: HashSet<String> = utterances.iter().map(|u| u.guid.clone()).collect();

    let mut replies_by_parent: HashMap<String, Vec<Utterance>> = HashMap::new();
    let mut main_sequence: Vec<Utterance> = Vec::new();

    for utterance in utterances {
        match &utterance.thread_originator_guid {
            // A reply whose parent survived extraction nests under it;
            // orphaned replies stay in the main sequence.
            Some(parent) if known_guids.contains(parent) => {
                replies_by_parent
                    .entry(parent.clone())
                    .or_default()
                    .push(utterance);
            }
            _ => main_sequence.push(utterance),
        }
    }

    for group in replies_by_parent.values_mut() {
        group.sort_by_key(|u| u.timestamp);
    }

    let mut result = Vec::with_capacity(main_sequence.len());
    for utterance in main_sequence {
        let guid = utterance.guid.clone();
        result.push(utterance);
        if let Some(group) = replies_by_parent.remove(&guid) {
            result.extend(group);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utterance(guid: &str, minute: u32, parent: Option<&str>) -> Utterance {
        Utterance {
            sender: "Me".to_string(),
            text: Some(format!("message {guid}")),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(12, minute, 0))
                .expect("valid datetime"),
            guid: guid.to_string(),
            thread_originator_guid: parent.map(ToString::to_string),
            has_attachment: false,
            attachment_type: None,
        }
    }

    fn guids(utterances: &[Utterance]) -> Vec<&str> {
        utterances.iter().map(|u| u.guid.as_str()).collect()
    }

    #[test]
    fn test_no_threads_preserves_order() {
        let input = vec![utterance("a", 0, None), utterance("b", 1, None)];
        assert_eq!(guids(&reorder_threads(input)), vec!["a", "b"]);
    }

    #[test]
    fn test_reply_moves_next_to_parent() {
        // Reply "r" arrives chronologically last but belongs under "a"
        let input = vec![
            utterance("a", 0, None),
            utterance("b", 1, None),
            utterance("r", 30, Some("a")),
        ];
        assert_eq!(guids(&reorder_threads(input)), vec!["a", "r", "b"]);
    }

    #[test]
    fn test_reply_group_sorted_by_timestamp() {
        let input = vec![
            utterance("a", 0, None),
            utterance("r2", 20, Some("a")),
            utterance("r1", 10, Some("a")),
            utterance("b", 5, None),
        ];
        assert_eq!(guids(&reorder_threads(input)), vec!["a", "r1", "r2", "b"]);
    }

    #[test]
    fn test_orphaned_reply_stays_mainline() {
        // Parent guid was filtered upstream (e.g. it was a reaction)
        let input = vec![
            utterance("a", 0, None),
            utterance("r", 1, Some("missing")),
            utterance("b", 2, None),
        ];
        assert_eq!(guids(&reorder_threads(input)), vec!["a", "r", "b"]);
    }
}
