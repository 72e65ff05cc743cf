//! Word boundaries — rune classification and the bow/eow motions.
//!
//! A **boundary** is an offset where the rune before and the rune after
//! belong to different classes and at least one of them is a word or
//! punctuation rune. Runs of blanks and newlines never contain a boundary,
//! so the motions stop at the beginning and at the end of every word
//! (`bow`/`eow`) and every punctuation group:
//!
//! ```text
//! let x = foo.bar;
//! ^  ^^ ^ ^  ^^  ^^
//! ```
//!
//! The start and the end of the document are always stops. Both motions
//! move at least one rune before looking for a boundary, so calling one
//! repeatedly never stalls.

use crate::buffer::Buffer;

// ---------------------------------------------------------------------------
// Character classification
// ---------------------------------------------------------------------------

/// Character class for boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Letters, digits, underscore.
    Word,
    /// Non-blank, non-word characters (operators, brackets, etc.).
    Punctuation,
    /// Whitespace within a line (space, tab).
    Blank,
    /// Line ending (`\n`, `\r`).
    Newline,
}

impl CharClass {
    /// True for classes that form tokens (word or punctuation).
    #[inline]
    #[must_use]
    pub const fn is_token(self) -> bool {
        matches!(self, Self::Word | Self::Punctuation)
    }
}

/// Classify a character.
#[must_use]
pub fn classify(ch: char) -> CharClass {
    if ch == '\n' || ch == '\r' {
        CharClass::Newline
    } else if ch.is_whitespace() {
        CharClass::Blank
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Punctuation
    }
}

/// True for letters, digits and underscore.
#[inline]
#[must_use]
pub fn is_word_char(ch: char) -> bool {
    classify(ch) == CharClass::Word
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

/// True when `offset` sits on a boundary. Document edges are boundaries.
#[must_use]
pub fn is_boundary(buf: &Buffer, offset: usize) -> bool {
    let (Some((before, _)), Some((after, _))) = (buf.char_before(offset), buf.char_after(offset))
    else {
        return true;
    };
    let (a, b) = (classify(before), classify(after));
    a != b && (a.is_token() || b.is_token())
}

/// The next boundary strictly after `offset`.
#[must_use]
pub fn next_bow_eow(buf: &Buffer, offset: usize) -> usize {
    let mut at = offset;
    while let Some((_, len)) = buf.char_after(at) {
        at += len;
        if is_boundary(buf, at) {
            break;
        }
    }
    at
}

/// The previous boundary strictly before `offset`.
#[must_use]
pub fn prev_bow_eow(buf: &Buffer, offset: usize) -> usize {
    let mut at = offset;
    while let Some((_, len)) = buf.char_before(at) {
        at -= len;
        if is_boundary(buf, at) {
            break;
        }
    }
    at
}

// ---------------------------------------------------------------------------
// Word under cursor
// ---------------------------------------------------------------------------

/// Byte span of the word touching `offset`.
///
/// The word after the cursor wins; otherwise the word ending at the cursor.
/// `None` when neither neighbor is a word rune.
#[must_use]
pub fn word_bounds(buf: &Buffer, offset: usize) -> Option<(usize, usize)> {
    let after = buf.char_after(offset).is_some_and(|(ch, _)| is_word_char(ch));
    let before = buf.char_before(offset).is_some_and(|(ch, _)| is_word_char(ch));
    if !after && !before {
        return None;
    }

    let mut start = offset;
    while let Some((ch, len)) = buf.char_before(start) {
        if !is_word_char(ch) {
            break;
        }
        start -= len;
    }
    let mut end = offset;
    while let Some((ch, len)) = buf.char_after(end) {
        if !is_word_char(ch) {
            break;
        }
        end += len;
    }
    Some((start, end))
}

/// True when `[start, end)` is not glued to word runes on either side.
#[must_use]
pub fn is_whole_word(buf: &Buffer, start: usize, end: usize) -> bool {
    let glued_before = buf.char_before(start).is_some_and(|(ch, _)| is_word_char(ch));
    let glued_after = buf.char_after(end).is_some_and(|(ch, _)| is_word_char(ch));
    !glued_before && !glued_after
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
