//! Message extraction: chat.db rows to an ordered transcript.
//!
//! Pulls a conversation's plain-message rows for a local date range, recovers
//! text from the rich-text blob when the primary field is empty, substitutes
//! attachment placeholder phrases, rewrites URLs for speech, and reorders
//! thread replies next to their parents.

use chrono::NaiveDateTime;
use tracing::info;

use crate::db::ChatDb;
use crate::error::Result;
use crate::models::Utterance;
use crate::threads::reorder_threads;
use crate::timestamp;
use crate::typedstream::decode_attributed_body;
use crate::urls::{TitleResolver, UrlRewriter};

/// Placeholder phrase for an attachment, keyed by MIME-type family.
#[must_use]
pub fn attachment_placeholder(mime_type: Option<&str>) -> &'static str {
    match mime_type {
        Some(mime) if mime.starts_with("image/") => "Look at this photo",
        Some(mime) if mime.starts_with("video/") => "Look at this video",
        Some(mime) if mime.starts_with("audio/") => "Listen to this audio",
        _ => "Look at this file",
    }
}

/// Extract a conversation's utterances for the local civil range
/// `[start, end)`.
///
/// Rows are queried by vendor timestamp so the window spans UTC-midnight and
/// DST boundaries correctly. Reaction rows never appear; rows with neither
/// text nor attachment are still emitted (filtering them is the
/// orchestrator's job). The returned transcript is thread-reordered.
pub fn extract_messages<R: TitleResolver>(
    db: &ChatDb,
    url_rewriter: &mut UrlRewriter<R>,
    chat_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Utterance>> {
    let start_ts = timestamp::to_mac_timestamp(start);
    let end_ts = timestamp::to_mac_timestamp(end);

    let rows = db.fetch_messages(chat_id, start_ts, end_ts)?;

    let mut utterances = Vec::with_capacity(rows.len());
    for row in rows {
        // Primary text field wins; fall back to the rich-text blob
        let mut text = match row.text {
            Some(ref t) if !t.is_empty() => Some(t.clone()),
            _ => {
                let decoded = decode_attributed_body(row.attributed_body.as_deref());
                if decoded.is_empty() { None } else { Some(decoded) }
            }
        };

        if row.has_attachment {
            let placeholder = attachment_placeholder(row.attachment_mime_type.as_deref());
            text = match text {
                None => Some(placeholder.to_string()),
                Some(existing) => {
                    // Suffix uses the last word of the placeholder phrase
                    let noun = placeholder.split_whitespace().last().unwrap_or("file");
                    Some(format!("{existing}... and here's a {noun}"))
                }
            };
        }

        if let Some(ref t) = text {
            text = Some(url_rewriter.rewrite(t));
        }

        utterances.push(Utterance {
            sender: row.sender,
            text,
            timestamp: timestamp::to_local_datetime(row.date),
            guid: row.guid,
            thread_originator_guid: row.thread_originator_guid,
            has_attachment: row.has_attachment,
            attachment_type: row.attachment_mime_type,
        });
    }

    info!(chat_id, count = utterances.len(), "Extracted messages");
    Ok(reorder_threads(utterances))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_placeholder_families() {
        assert_eq!(attachment_placeholder(Some("image/jpeg")), "Look at this photo");
        assert_eq!(attachment_placeholder(Some("video/mp4")), "Look at this video");
        assert_eq!(attachment_placeholder(Some("audio/m4a")), "Listen to this audio");
        assert_eq!(attachment_placeholder(Some("application/pdf")), "Look at this file");
        assert_eq!(attachment_placeholder(None), "Look at this file");
    }
}
