//! UTF-16 string decoding.
//!
//! Strings referenced from stream records (module paths, thread names, comments) are
//! stored as `MINIDUMP_STRING`: a `u32` byte length followed by that many bytes of
//! UTF-16LE text, without a terminator. Decoding is lossy so that a dump with a
//! corrupted name still yields the surrounding record.

use widestring::U16String;

use crate::{file::parser::Parser, Result};

/// Decode a `MINIDUMP_STRING` located at `rva` within `data`.
///
/// The length prefix counts bytes, not UTF-16 units. An odd length is rejected as
/// malformed.
pub fn read_string_at(data: &[u8], rva: u32) -> Result<String> {
    let mut parser = Parser::new(data);
    parser.seek(rva as usize)?;

    let byte_length = parser.read_le::<u32>()? as usize;
    if byte_length % 2 != 0 {
        return Err(malformed_error!(
            "String at {:#010x} has odd byte length {}",
            rva,
            byte_length
        ));
    }

    let raw = parser.bytes(byte_length)?;
    Ok(decode_utf16le(raw))
}

/// Decode raw UTF-16LE bytes, replacing unpaired surrogates. A trailing odd byte is
/// dropped.
#[must_use]
pub fn decode_utf16le(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    U16String::from_vec(units).to_string_lossy()
}
