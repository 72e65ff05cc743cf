//! Visual column arithmetic.
//!
//! A line's byte offsets and its on-screen columns differ in two ways:
//!
//! - **Tabs** expand to a fixed `tab_width` columns each, wherever they sit.
//!   `"ab\tcd"` with a tab width of 4 puts the tab on columns 2..=5 and `c`
//!   on column 6.
//! - **Wide runes** (East-Asian wide glyphs, most emoji) take two columns
//!   while occupying three or four bytes. Zero-width and control runes take
//!   none.
//!
//! The conversions here are the single source of truth for both the cursor's
//! cached visual column and for keeping the visual column stable across
//! vertical moves.

use unicode_width::UnicodeWidthChar;

use crate::utf8;

/// Columns taken by one rune.
#[inline]
#[must_use]
pub fn char_width(ch: char, tab_width: usize) -> usize {
    if ch == '\t' {
        tab_width
    } else {
        ch.width().unwrap_or(0)
    }
}

/// Total visual width of `bytes`.
#[must_use]
pub fn visual_len(bytes: &[u8], tab_width: usize) -> usize {
    utf8::chars(bytes)
        .map(|(_, ch, _)| char_width(ch, tab_width))
        .sum()
}

/// Visual column of the rune starting at `byte` in `line`.
///
/// Offsets past the end of the line report the width of the whole line.
#[must_use]
pub fn visual_col(line: &[u8], byte: usize, tab_width: usize) -> usize {
    visual_len(&line[..byte.min(line.len())], tab_width)
}

/// Byte offset of the rune whose columns cover `col`.
///
/// Landing inside a tab or a wide rune snaps to its start. A target beyond
/// the line's width returns the line's length (the end-of-line position).
#[must_use]
pub fn byte_at_visual(line: &[u8], col: usize, tab_width: usize) -> usize {
    let mut visual = 0;
    for (at, ch, _) in utf8::chars(line) {
        let w = char_width(ch, tab_width);
        if visual + w > col {
            return at;
        }
        visual += w;
    }
    line.len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
