//! Shared test fixtures: a minimal on-disk chat.db replica.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use groupchat_podcast::timestamp;

/// Subset of the iMessage schema exercised by the extraction queries.
const SCHEMA: &str = "
    CREATE TABLE handle (
        ROWID INTEGER PRIMARY KEY,
        id TEXT NOT NULL
    );
    CREATE TABLE chat (
        ROWID INTEGER PRIMARY KEY,
        display_name TEXT
    );
    CREATE TABLE chat_handle_join (
        chat_id INTEGER NOT NULL,
        handle_id INTEGER NOT NULL
    );
    CREATE TABLE message (
        ROWID INTEGER PRIMARY KEY,
        guid TEXT NOT NULL,
        text TEXT,
        attributedBody BLOB,
        date INTEGER NOT NULL,
        is_from_me INTEGER NOT NULL DEFAULT 0,
        handle_id INTEGER,
        cache_has_attachments INTEGER NOT NULL DEFAULT 0,
        associated_message_type INTEGER NOT NULL DEFAULT 0,
        thread_originator_guid TEXT
    );
    CREATE TABLE chat_message_join (
        chat_id INTEGER NOT NULL,
        message_id INTEGER NOT NULL
    );
    CREATE TABLE attachment (
        ROWID INTEGER PRIMARY KEY,
        mime_type TEXT
    );
    CREATE TABLE message_attachment_join (
        message_id INTEGER NOT NULL,
        attachment_id INTEGER NOT NULL
    );
";

/// A throwaway chat.db populated through helper methods.
pub struct FixtureDb {
    conn: Connection,
    path: PathBuf,
    // Held for its Drop; the directory outlives the test body
    _dir: tempfile::TempDir,
}

impl FixtureDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("chat.db");
        let conn = Connection::open(&path).expect("Failed to create fixture database");
        conn.execute_batch(SCHEMA).expect("Failed to create schema");
        Self {
            conn,
            path,
            _dir: dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add_handle(&self, id: &str) -> i64 {
        self.conn
            .execute("INSERT INTO handle (id) VALUES (?1)", params![id])
            .expect("Failed to insert handle");
        self.conn.last_insert_rowid()
    }

    pub fn add_chat(&self, display_name: Option<&str>, handle_ids: &[i64]) -> i64 {
        self.conn
            .execute(
                "INSERT INTO chat (display_name) VALUES (?1)",
                params![display_name],
            )
            .expect("Failed to insert chat");
        let chat_id = self.conn.last_insert_rowid();
        for handle_id in handle_ids {
            self.conn
                .execute(
                    "INSERT INTO chat_handle_join (chat_id, handle_id) VALUES (?1, ?2)",
                    params![chat_id, handle_id],
                )
                .expect("Failed to join handle to chat");
        }
        chat_id
    }

    pub fn add_message(&self, message: &MessageFixture) -> i64 {
        let date = timestamp::to_mac_timestamp(message.sent_at);
        self.conn
            .execute(
                "INSERT INTO message
                    (guid, text, attributedBody, date, is_from_me, handle_id,
                     associated_message_type, thread_originator_guid)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    message.guid,
                    message.text,
                    message.attributed_body,
                    date,
                    i64::from(message.handle_id.is_none()),
                    message.handle_id,
                    message.associated_message_type,
                    message.thread_originator_guid,
                ],
            )
            .expect("Failed to insert message");
        let message_id = self.conn.last_insert_rowid();
        self.conn
            .execute(
                "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?1, ?2)",
                params![message.chat_id, message_id],
            )
            .expect("Failed to join message to chat");
        message_id
    }

    /// Attach a file of the given MIME type and flip the attachment cache flag.
    pub fn attach(&self, message_id: i64, mime_type: Option<&str>) {
        self.conn
            .execute(
                "INSERT INTO attachment (mime_type) VALUES (?1)",
                params![mime_type],
            )
            .expect("Failed to insert attachment");
        let attachment_id = self.conn.last_insert_rowid();
        self.conn
            .execute(
                "INSERT INTO message_attachment_join (message_id, attachment_id)
                 VALUES (?1, ?2)",
                params![message_id, attachment_id],
            )
            .expect("Failed to join attachment");
        self.conn
            .execute(
                "UPDATE message SET cache_has_attachments = 1 WHERE ROWID = ?1",
                params![message_id],
            )
            .expect("Failed to set attachment flag");
    }
}

/// One message row to insert; `handle_id = None` means sent by the local user.
pub struct MessageFixture {
    pub chat_id: i64,
    pub guid: String,
    pub text: Option<String>,
    pub attributed_body: Option<Vec<u8>>,
    pub sent_at: NaiveDateTime,
    pub handle_id: Option<i64>,
    pub associated_message_type: i64,
    pub thread_originator_guid: Option<String>,
}

impl MessageFixture {
    pub fn new(
        chat_id: i64,
        guid: &str,
        text: Option<&str>,
        sent_at: NaiveDateTime,
        handle_id: Option<i64>,
    ) -> Self {
        Self {
            chat_id,
            guid: guid.to_string(),
            text: text.map(ToString::to_string),
            attributed_body: None,
            sent_at,
            handle_id,
            associated_message_type: 0,
            thread_originator_guid: None,
        }
    }

    pub fn reaction(mut self) -> Self {
        // 2000 is the "loved" tapback
        self.associated_message_type = 2000;
        self
    }

    pub fn reply_to(mut self, parent_guid: &str) -> Self {
        self.thread_originator_guid = Some(parent_guid.to_string());
        self
    }

    pub fn with_attributed_body(mut self, blob: Vec<u8>) -> Self {
        self.attributed_body = Some(blob);
        self
    }
}

/// Title resolver that never finds anything; URL rewriting falls back to the
/// domain name.
pub struct NoTitles;

impl groupchat_podcast::urls::TitleResolver for NoTitles {
    fn resolve(&self, _url: &str) -> Option<String> {
        None
    }
}

/// Local datetime helper for fixture rows.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid datetime")
}
