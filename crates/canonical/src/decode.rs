//! Byte-to-text decoding for scanned documents.
//!
//! Documents arrive as raw bytes of unknown encoding. Decoding tries, in
//! order:
//!
//! 1. UTF-16 with a byte-order mark
//! 2. UTF-8 (a leading BOM is dropped)
//! 3. Latin-1, which maps every byte to a char and therefore never fails
//!
//! Content that looks like binary data (NUL bytes, or a high share of
//! control bytes near the start) is rejected with
//! [`CanonicalError::NoTextContent`] instead of being decoded into garbage.

use std::borrow::Cow;

use crate::error::{CanonicalError, NoTextReason};

/// How many leading bytes are inspected for the binary heuristic.
const SNIFF_LEN: usize = 8 * 1024;

/// Decode document bytes into text.
pub fn decode_bytes(bytes: &[u8]) -> Result<Cow<'_, str>, CanonicalError> {
    if bytes.is_empty() {
        return Err(CanonicalError::NoTextContent(NoTextReason::Empty));
    }

    if let Some(text) = decode_utf16_with_bom(bytes) {
        return Ok(Cow::Owned(text));
    }

    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if looks_binary(bytes) {
        return Err(CanonicalError::NoTextContent(NoTextReason::Binary));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(_) => Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
    }
}

fn decode_utf16_with_bom(bytes: &[u8]) -> Option<String> {
    let (big_endian, body) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        _ => return None,
    };
    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });
    Some(
        char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
    )
}

fn looks_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if head.contains(&0) {
        return true;
    }
    let control = head
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0C))
        .count();
    // More than 10% control bytes is not prose.
    control * 10 > head.len()
}
