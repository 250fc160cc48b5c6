//! UTF-16LE string decoding for prefetch sections.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use crate::error::{PrefetchError, Result};

/// Decode little-endian UTF-16 bytes. An odd trailing byte is ignored.
pub fn utf16_le(raw: &[u8], what: &'static str, offset: usize) -> Result<String> {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| PrefetchError::Encoding { what, offset })
}

/// Decode the filename strings section: NUL separated UTF-16 strings.
///
/// Empty segments (trailing or repeated NULs) are dropped. A region with an
/// odd byte count is truncated to its even prefix.
pub fn decode_filename_table(region: &[u8], offset: usize) -> Result<Vec<String>> {
    let even = region.len() & !1;
    if even != region.len() {
        warn!(
            "Filename strings at 0x{:X} have an odd size ({}), dropping the last byte.",
            offset,
            region.len()
        );
    }
    let text = utf16_le(&region[..even], "filename strings", offset)?;
    Ok(text
        .split('\0')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Decode `count` length-prefixed directory strings starting at `start`.
///
/// Each entry is a u16 character count followed by `count * 2 + 2` bytes of
/// UTF-16 (payload plus terminating NUL). Returns the strings and the number
/// of bytes consumed. The cursor arithmetic decides how far to read; any
/// read that would leave `raw` is a `Bounds` error.
pub fn decode_length_prefixed(
    raw: &[u8],
    start: usize,
    count: usize,
) -> Result<(Vec<String>, usize)> {
    let mut names = Vec::with_capacity(count.min(1024));
    let mut cursor = start;

    for _ in 0..count {
        if cursor + 2 > raw.len() {
            return Err(PrefetchError::Bounds {
                what: "directory string length",
                offset: cursor as i64,
                len: raw.len(),
            });
        }
        let chars = LittleEndian::read_u16(&raw[cursor..cursor + 2]) as usize;
        cursor += 2;

        let byte_len = chars * 2 + 2;
        if cursor + byte_len > raw.len() {
            return Err(PrefetchError::Bounds {
                what: "directory string",
                offset: cursor as i64,
                len: raw.len(),
            });
        }
        let name = utf16_le(&raw[cursor..cursor + byte_len], "directory string", cursor)?;
        names.push(name.trim_matches('\0').to_string());
        cursor += byte_len;
    }

    debug!(
        "Decoded {} directory strings from 0x{:X} ({} bytes).",
        names.len(),
        start,
        cursor - start
    );
    Ok((names, cursor - start))
}
