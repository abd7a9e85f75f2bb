mod common;

use common::{at, FixtureDb, MessageFixture, NoTitles};
use groupchat_podcast::db::ChatDb;
use groupchat_podcast::extract::extract_messages;
use groupchat_podcast::urls::UrlRewriter;

/// Wrap `text` in a synthetic typedstream blob the way chat.db stores
/// rich-text messages.
fn attributed_body(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    assert!(bytes.len() < 128, "single-byte length only");
    let mut blob = Vec::new();
    blob.extend_from_slice(b"\x04\x0bstreamtyped");
    blob.extend_from_slice(b"NSString");
    blob.push(0x01);
    blob.push(0x2B);
    blob.push(u8::try_from(bytes.len()).expect("short payload"));
    blob.extend_from_slice(bytes);
    blob
}

/// Populate a group chat with nine rows spanning two months: a reaction, an
/// attachment-only message, a self-sent message, a thread reply, and a
/// rich-text-only message among them.
fn populated_fixture() -> (FixtureDb, i64) {
    let fixture = FixtureDb::new();
    let alice = fixture.add_handle("+15550001111");
    let bob = fixture.add_handle("+15550002222");
    let chat_id = fixture.add_chat(Some("Weekend Plans"), &[alice, bob]);

    fixture.add_message(&MessageFixture::new(
        chat_id,
        "jan-1",
        Some("Hey everyone"),
        at(2024, 1, 5, 10, 0),
        Some(alice),
    ));
    fixture.add_message(&MessageFixture::new(
        chat_id,
        "jan-2",
        Some("What's the plan"),
        at(2024, 1, 5, 10, 2),
        Some(bob),
    ));
    fixture.add_message(
        &MessageFixture::new(
            chat_id,
            "jan-3",
            Some("Loved \u{201c}Hey everyone\u{201d}"),
            at(2024, 1, 5, 10, 3),
            Some(bob),
        )
        .reaction(),
    );
    let photo_only = fixture.add_message(&MessageFixture::new(
        chat_id,
        "jan-4",
        None,
        at(2024, 1, 10, 9, 0),
        Some(alice),
    ));
    fixture.attach(photo_only, Some("image/jpeg"));
    fixture.add_message(&MessageFixture::new(
        chat_id,
        "jan-5",
        Some("On my way"),
        at(2024, 1, 12, 18, 30),
        None,
    ));
    fixture.add_message(
        &MessageFixture::new(
            chat_id,
            "jan-6",
            Some("Late reply to the greeting"),
            at(2024, 1, 20, 11, 0),
            Some(bob),
        )
        .reply_to("jan-1"),
    );
    fixture.add_message(
        &MessageFixture::new(chat_id, "jan-7", None, at(2024, 1, 25, 14, 0), Some(alice))
            .with_attributed_body(attributed_body("From the rich text")),
    );
    fixture.add_message(&MessageFixture::new(
        chat_id,
        "feb-1",
        Some("New month"),
        at(2024, 2, 2, 8, 0),
        Some(bob),
    ));
    fixture.add_message(&MessageFixture::new(
        chat_id,
        "feb-2",
        Some("Still here"),
        at(2024, 2, 10, 12, 0),
        Some(alice),
    ));

    (fixture, chat_id)
}

#[test]
fn test_extraction_filters_range_and_reactions_and_reorders_threads() {
    let (fixture, chat_id) = populated_fixture();
    let db = ChatDb::open(fixture.path()).expect("Failed to open fixture database");
    let mut rewriter = UrlRewriter::new(NoTitles, 16).expect("Failed to build rewriter");

    let utterances = extract_messages(
        &db,
        &mut rewriter,
        chat_id,
        at(2024, 1, 1, 0, 0),
        at(2024, 1, 31, 23, 59),
    )
    .expect("Failed to extract messages");

    // January only, reaction excluded
    assert_eq!(utterances.len(), 6);

    // The thread reply is pulled up next to its parent; everything else keeps
    // chronological order
    let guids: Vec<&str> = utterances.iter().map(|u| u.guid.as_str()).collect();
    assert_eq!(guids, vec!["jan-1", "jan-6", "jan-2", "jan-4", "jan-5", "jan-7"]);
}

#[test]
fn test_attachment_only_row_gets_placeholder_text() {
    let (fixture, chat_id) = populated_fixture();
    let db = ChatDb::open(fixture.path()).expect("Failed to open fixture database");
    let mut rewriter = UrlRewriter::new(NoTitles, 16).expect("Failed to build rewriter");

    let utterances = extract_messages(
        &db,
        &mut rewriter,
        chat_id,
        at(2024, 1, 10, 0, 0),
        at(2024, 1, 11, 0, 0),
    )
    .expect("Failed to extract messages");

    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].text.as_deref(), Some("Look at this photo"));
    assert!(utterances[0].has_attachment);
    assert_eq!(utterances[0].attachment_type.as_deref(), Some("image/jpeg"));
}

#[test]
fn test_self_sent_row_resolves_to_me() {
    let (fixture, chat_id) = populated_fixture();
    let db = ChatDb::open(fixture.path()).expect("Failed to open fixture database");
    let mut rewriter = UrlRewriter::new(NoTitles, 16).expect("Failed to build rewriter");

    let utterances = extract_messages(
        &db,
        &mut rewriter,
        chat_id,
        at(2024, 1, 12, 0, 0),
        at(2024, 1, 13, 0, 0),
    )
    .expect("Failed to extract messages");

    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].sender, "Me");
}

#[test]
fn test_rich_text_fallback_decodes_attributed_body() {
    let (fixture, chat_id) = populated_fixture();
    let db = ChatDb::open(fixture.path()).expect("Failed to open fixture database");
    let mut rewriter = UrlRewriter::new(NoTitles, 16).expect("Failed to build rewriter");

    let utterances = extract_messages(
        &db,
        &mut rewriter,
        chat_id,
        at(2024, 1, 25, 0, 0),
        at(2024, 1, 26, 0, 0),
    )
    .expect("Failed to extract messages");

    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].text.as_deref(), Some("From the rich text"));
}

#[test]
fn test_url_only_message_falls_back_to_domain() {
    let fixture = FixtureDb::new();
    let alice = fixture.add_handle("+15550001111");
    let bob = fixture.add_handle("+15550002222");
    let chat_id = fixture.add_chat(None, &[alice, bob]);
    fixture.add_message(&MessageFixture::new(
        chat_id,
        "link-1",
        Some("https://www.example.com/article?id=7"),
        at(2024, 3, 1, 12, 0),
        Some(alice),
    ));

    let db = ChatDb::open(fixture.path()).expect("Failed to open fixture database");
    let mut rewriter = UrlRewriter::new(NoTitles, 16).expect("Failed to build rewriter");
    let utterances = extract_messages(
        &db,
        &mut rewriter,
        chat_id,
        at(2024, 3, 1, 0, 0),
        at(2024, 3, 2, 0, 0),
    )
    .expect("Failed to extract messages");

    assert_eq!(
        utterances[0].text.as_deref(),
        Some("Check out this link: example.com")
    );
}

#[test]
fn test_end_bound_is_exclusive() {
    let fixture = FixtureDb::new();
    let alice = fixture.add_handle("+15550001111");
    let bob = fixture.add_handle("+15550002222");
    let chat_id = fixture.add_chat(None, &[alice, bob]);
    fixture.add_message(&MessageFixture::new(
        chat_id,
        "boundary",
        Some("right on the line"),
        at(2024, 4, 2, 0, 0),
        Some(alice),
    ));

    let db = ChatDb::open(fixture.path()).expect("Failed to open fixture database");
    let mut rewriter = UrlRewriter::new(NoTitles, 16).expect("Failed to build rewriter");
    let utterances = extract_messages(
        &db,
        &mut rewriter,
        chat_id,
        at(2024, 4, 1, 0, 0),
        at(2024, 4, 2, 0, 0),
    )
    .expect("Failed to extract messages");

    assert!(utterances.is_empty());
}
