//! Read-only access to the iMessage chat.db.
//!
//! The database is opened read-only per invocation and never held across the
//! full pipeline. Queries return rows already joined with resolved sender
//! identifiers and a single first-matching attachment MIME type, and exclude
//! tapback/reaction rows (`associated_message_type != 0`).

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, Row};
use tracing::debug;

use crate::error::Result;
use crate::models::{GroupChat, RawMessageRow, SELF_SENDER};
use crate::timestamp;

/// Association type of a plain message; anything else is a tapback/reaction.
const PLAIN_MESSAGE_TYPE: i64 = 0;

/// Read-only handle to an iMessage chat database.
pub struct ChatDb {
    conn: Connection,
}

impl ChatDb {
    /// Open a chat.db for reading. Fails if the file is missing or unreadable.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "Opened iMessage database");
        Ok(Self { conn })
    }

    /// List all group chats (more than one distinct participant), sorted by
    /// most recent message first with never-used chats last.
    pub fn list_group_chats(&self) -> Result<Vec<GroupChat>> {
        let chat_query = "
            SELECT
                c.ROWID as chat_id,
                COALESCE(c.display_name, 'Unnamed Group') as display_name,
                GROUP_CONCAT(h.id, '; ') as participants,
                COUNT(DISTINCT h.ROWID) as participant_count
            FROM chat c
            JOIN chat_handle_join chj ON chj.chat_id = c.ROWID
            JOIN handle h ON h.ROWID = chj.handle_id
            GROUP BY c.ROWID
            HAVING COUNT(DISTINCT h.ROWID) > 1
        ";

        let mut stmt = self.conn.prepare(chat_query)?;
        let chat_iter = stmt.query_map(params![], |row| {
            let chat_id: i64 = row.get("chat_id")?;
            let display_name: String = row.get("display_name")?;
            let participants_str: Option<String> = row.get("participants")?;
            let participant_count: i64 = row.get("participant_count")?;
            Ok((chat_id, display_name, participants_str, participant_count))
        })?;

        let mut chats = Vec::new();
        for chat in chat_iter {
            let (chat_id, display_name, participants_str, participant_count) = chat?;
            let participants = participants_str
                .map(|s| s.split("; ").map(ToString::to_string).collect())
                .unwrap_or_default();
            let participant_count = usize::try_from(participant_count).unwrap_or(0);
            chats.push(GroupChat {
                chat_id,
                display_name,
                participant_count,
                participants,
                last_message_date: None,
            });
        }

        // Last message dates live in a separate join table; tolerate its
        // absence in stripped-down test databases.
        let last_msg_query = "
            SELECT cmj.chat_id, MAX(m.date) as last_date
            FROM chat_message_join cmj
            JOIN message m ON m.ROWID = cmj.message_id
            GROUP BY cmj.chat_id
        ";
        if let Ok(mut stmt) = self.conn.prepare(last_msg_query) {
            let date_iter = stmt.query_map(params![], |row| {
                let chat_id: i64 = row.get(0)?;
                let last_date: Option<i64> = row.get(1)?;
                Ok((chat_id, last_date))
            });
            if let Ok(dates) = date_iter {
                for entry in dates.flatten() {
                    let (chat_id, last_date) = entry;
                    if let Some(chat) = chats.iter_mut().find(|c| c.chat_id == chat_id) {
                        chat.last_message_date = last_date.map(timestamp::to_local_datetime);
                    }
                }
            }
        }

        chats.sort_by(|a, b| match (&a.last_message_date, &b.last_message_date) {
            (Some(da), Some(db)) => db.cmp(da),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        Ok(chats)
    }

    /// Fetch a chat's plain-message rows whose vendor timestamp falls in the
    /// half-open range `[start_ts, end_ts)`, ordered chronologically.
    pub fn fetch_messages(
        &self,
        chat_id: i64,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<Vec<RawMessageRow>> {
        let query = "
            SELECT
                m.guid,
                m.text,
                m.attributedBody,
                m.date,
                m.cache_has_attachments,
                m.thread_originator_guid,
                CASE
                    WHEN m.is_from_me = 1 THEN ?1
                    ELSE COALESCE(h.id, 'Unknown')
                END as sender,
                (SELECT a.mime_type
                 FROM attachment a
                 JOIN message_attachment_join maj ON maj.attachment_id = a.ROWID
                 WHERE maj.message_id = m.ROWID
                 LIMIT 1) as attachment_mime_type
            FROM message m
            JOIN chat_message_join cmj ON cmj.message_id = m.ROWID
            LEFT JOIN handle h ON h.ROWID = m.handle_id
            WHERE cmj.chat_id = ?2
              AND m.associated_message_type = ?3
              AND m.date >= ?4
              AND m.date < ?5
            ORDER BY m.date ASC
        ";

        let mut stmt = self.conn.prepare(query)?;
        let row_iter = stmt.query_map(
            params![SELF_SENDER, chat_id, PLAIN_MESSAGE_TYPE, start_ts, end_ts],
            Self::map_raw_row,
        )?;

        let mut rows = Vec::new();
        for row in row_iter {
            rows.push(row?);
        }
        debug!(chat_id, count = rows.len(), "Fetched message rows");
        Ok(rows)
    }

    /// Map a database row to a `RawMessageRow`
    fn map_raw_row(row: &Row) -> rusqlite::Result<RawMessageRow> {
        let has_attachment: Option<i64> = row.get("cache_has_attachments")?;
        Ok(RawMessageRow {
            guid: row.get("guid")?,
            text: row.get("text")?,
            attributed_body: row.get("attributedBody")?,
            date: row.get("date")?,
            sender: row.get("sender")?,
            has_attachment: has_attachment.unwrap_or(0) != 0,
            attachment_mime_type: row.get("attachment_mime_type")?,
            thread_originator_guid: row.get("thread_originator_guid")?,
        })
    }
}
