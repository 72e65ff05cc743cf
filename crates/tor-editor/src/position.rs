//! Text position and range types.
//!
//! All coordinates are **0-indexed**. Line 0 is the first line, byte 0 is the
//! first byte of a line. The column is a byte offset into the line's raw
//! content, never a char index and never a visual column: visual columns are
//! derived on demand by [`crate::width`] because they depend on the tab width.
//!
//! Display layers (status line, goto prompt) convert to 1-indexed for the
//! user; that conversion never belongs here.

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in the document: (line, byte offset within the line).
///
/// For the line `"café\n"`, byte 3 is the start of `'é'` and byte 5 sits just
/// past it, before the newline.
///
/// # Ordering
///
/// Lexicographic: line first, then byte. `Position { line: 0, byte: 9 }` is
/// before `Position { line: 1, byte: 0 }`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub byte: usize,
}

impl Position {
    /// The origin: line 0, byte 0.
    pub const ZERO: Self = Self { line: 0, byte: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }
}

impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.byte.cmp(&other.byte))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.byte)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Lines are 1-indexed for humans; byte offsets stay raw.
        write!(f, "({}, {})", self.line + 1, self.byte)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open range `[start, end)` between two positions.
///
/// Always normalized so that `start <= end`. Build one from an anchor and a
/// live end with [`Range::ordered`]; the direction the user selected in does
/// not matter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range from two arbitrary positions, swapping if needed.
    #[inline]
    #[must_use]
    pub fn ordered(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A zero-width range at `pos`.
    #[inline]
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// True when the range covers nothing.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.line == self.end.line && self.start.byte == self.end.byte
    }

    /// True when `pos` lies in `[start, end)`.
    #[inline]
    #[must_use]
    pub fn contains(self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }

    /// The lines this range touches, for line-wise operations.
    ///
    /// A range whose end sits at byte 0 of a later line does not touch that
    /// line: selecting a whole line from its start to the start of the next
    /// one touches one line, not two.
    #[must_use]
    pub fn touched_lines(self) -> std::ops::RangeInclusive<usize> {
        let last = if self.end.byte == 0 && self.end.line > self.start.line {
            self.end.line - 1
        } else {
            self.end.line
        };
        self.start.line..=last
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range({}:{} .. {}:{})",
            self.start.line, self.start.byte, self.end.line, self.end.byte
        )
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
