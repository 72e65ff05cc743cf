//! Rune decoding over raw bytes.
//!
//! The buffer stores the file exactly as it was read, so its bytes are not
//! guaranteed to be valid UTF-8. These helpers decode one rune at a time
//! from either end of a byte slice. A malformed or truncated sequence decodes
//! as U+FFFD with a length of **one byte**, which keeps every byte reachable
//! by cursor movement and keeps removal byte-exact: deleting a "replacement
//! rune" removes exactly the single bad byte, nothing else.

/// The rune reported for bytes that do not form a valid sequence.
pub const REPLACEMENT: char = '\u{fffd}';

/// Expected length of a UTF-8 sequence from its lead byte. Zero for bytes
/// that can never start a sequence (continuation bytes, `0xc0`, `0xc1`,
/// `0xf5..`).
#[inline]
const fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 0,
    }
}

/// True for `10xxxxxx` bytes.
#[inline]
#[must_use]
pub const fn is_continuation(byte: u8) -> bool {
    byte & 0xc0 == 0x80
}

/// Decode the rune at the start of `bytes`.
///
/// Returns the rune and its encoded length, or `None` for an empty slice.
#[must_use]
pub fn decode_first(bytes: &[u8]) -> Option<(char, usize)> {
    let &lead = bytes.first()?;
    let len = sequence_len(lead);
    if len == 0 || bytes.len() < len {
        return Some((REPLACEMENT, 1));
    }
    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => s.chars().next().map(|ch| (ch, len)),
        Err(_) => Some((REPLACEMENT, 1)),
    }
}

/// Decode the rune at the end of `bytes`.
///
/// Walks back over at most three continuation bytes to find the lead byte.
/// If the sequence found there does not end exactly at the slice end, the
/// last byte alone is reported as a replacement rune.
#[must_use]
pub fn decode_last(bytes: &[u8]) -> Option<(char, usize)> {
    let end = bytes.len();
    if end == 0 {
        return None;
    }
    let floor = end.saturating_sub(4);
    let mut start = end - 1;
    while start > floor && is_continuation(bytes[start]) {
        start -= 1;
    }
    match decode_first(&bytes[start..]) {
        Some((ch, len)) if start + len == end => Some((ch, len)),
        _ => Some((REPLACEMENT, 1)),
    }
}

/// Iterate the runes of `bytes` as `(byte_offset, rune, encoded_len)`.
#[must_use]
pub const fn chars(bytes: &[u8]) -> Chars<'_> {
    Chars { bytes, offset: 0 }
}

/// Iterator returned by [`chars`].
#[derive(Debug, Clone)]
pub struct Chars<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Iterator for Chars<'_> {
    type Item = (usize, char, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (ch, len) = decode_first(&self.bytes[self.offset..])?;
        let at = self.offset;
        self.offset += len;
        Some((at, ch, len))
    }
}

/// Number of runes in `bytes`, counting each malformed byte as one rune.
#[must_use]
pub fn rune_count(bytes: &[u8]) -> usize {
    chars(bytes).count()
}
