//! Plain-text recovery from the `attributedBody` blob.
//!
//! Messages composed with rich text leave `message.text` NULL and carry an
//! `NSAttributedString` archived in Apple's typedstream format. The plain
//! content follows the `NSString` marker, introduced by a `+` (0x2B) control
//! byte and a variable-width length field. Decoding is strictly best-effort:
//! every malformed or truncated input yields an empty string.

/// Marker sequence that introduces the string-typed field.
const NSSTRING_MARKER: &[u8] = b"NSString";

/// Control byte preceding the length field.
const LENGTH_INTRODUCER: u8 = 0x2B;

/// Varint marker meaning "length in the next two bytes, little-endian".
const TWO_BYTE_LENGTH: u8 = 0x81;

/// Extract the plain text from an `attributedBody` blob.
///
/// Returns an empty string for missing/empty input and on any parse failure.
/// The length field is a byte count; multi-byte UTF-8 sequences are sliced by
/// byte offset and decoded lossily.
#[must_use]
pub fn decode_attributed_body(blob: Option<&[u8]>) -> String {
    let Some(blob) = blob else {
        return String::new();
    };
    if blob.is_empty() {
        return String::new();
    }

    // Everything after the first NSString occurrence
    let Some(marker_pos) = find_subsequence(blob, NSSTRING_MARKER) else {
        return String::new();
    };
    let content = &blob[marker_pos + NSSTRING_MARKER.len()..];

    let Some(plus_pos) = content.iter().position(|&b| b == LENGTH_INTRODUCER) else {
        return String::new();
    };

    let length_start = plus_pos + 1;
    let Some(&marker) = content.get(length_start) else {
        return String::new();
    };

    let (length, text_start) = if marker == TWO_BYTE_LENGTH {
        let Some(bytes) = content.get(length_start + 1..length_start + 3) else {
            return String::new();
        };
        let length = usize::from(u16::from_le_bytes([bytes[0], bytes[1]]));
        (length, length_start + 3)
    } else if marker < 128 {
        (usize::from(marker), length_start + 1)
    } else {
        // Unknown varint marker
        return String::new();
    };

    if length == 0 {
        return String::new();
    }

    // Truncation guard: declared length must fit in the buffer
    let Some(text_bytes) = content.get(text_start..text_start + length) else {
        return String::new();
    };

    String::from_utf8_lossy(text_bytes).into_owned()
}

/// Locate the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
