//! Helpers for the raw response text.
//!
//! Responses are kept as one opaque buffer. The only structure recognised is
//! the blank line that separates the header block from the body.

use bytes::{BufMut, BytesMut};

/// Replaces every non-ASCII byte of a response.
pub const PLACEHOLDER: u8 = b'@';

/// Separates the header block from the body.
pub const HEADERS_END: &[u8] = b"\r\n\r\n";

/// Appends `chunk` to `out`, replacing non-ASCII bytes with [`PLACEHOLDER`].
pub fn sanitize_into(chunk: &[u8], out: &mut BytesMut) {
    out.reserve(chunk.len());
    for &b in chunk {
        out.put_u8(if b.is_ascii() { b } else { PLACEHOLDER });
    }
}

/// Converts a sanitized buffer to text. Bytes are taken as ASCII.
pub fn into_text(buf: &[u8]) -> String {
    buf.iter().map(|&b| char::from(b)).collect()
}

/// Position of the header/body separator, if any.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADERS_END.len())
        .position(|w| w == HEADERS_END)
}

/// Returns everything after the first blank line, or `""` when the response
/// has none (malformed or truncated).
///
/// # Example
///
/// ```
/// # use sockline::http::response::body;
/// assert_eq!(body("HTTP/1.1 200 OK\r\n\r\nhello"), "hello");
/// assert_eq!(body("HTTP/1.1 200 OK\r\n"), "");
/// ```
pub fn body(response: &str) -> &str {
    match find_headers_end(response.as_bytes()) {
        Some(pos) => &response[pos + HEADERS_END.len()..],
        None => "",
    }
}
