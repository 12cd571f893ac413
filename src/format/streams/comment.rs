//! `CommentStreamA` and `CommentStreamW` - free-form producer comments.

use crate::format::strings::decode_utf16le;

/// Decode an ANSI comment stream. Trailing NUL terminators are stripped.
#[must_use]
pub fn parse_comment_a(payload: &[u8]) -> String {
    let trimmed = match payload.iter().position(|&byte| byte == 0) {
        Some(end) => &payload[..end],
        None => payload,
    };
    String::from_utf8_lossy(trimmed).into_owned()
}

/// Decode a UTF-16 comment stream. Trailing NUL terminators are stripped.
#[must_use]
pub fn parse_comment_w(payload: &[u8]) -> String {
    let decoded = decode_utf16le(payload);
    decoded.trim_end_matches('\0').to_string()
}
