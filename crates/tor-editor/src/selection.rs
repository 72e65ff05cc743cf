//! Selection — an anchor and a live end over `(line, byte)` positions.
//!
//! The selection does not own either position's meaning: both ends are
//! captured from a [`Cursor`] and compared as plain [`Position`]s. While it
//! is on, the session moves the live end along with the cursor after every
//! request.

use std::fmt;

use crate::cursor::Cursor;
use crate::position::{Position, Range};

/// The selection state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    on: bool,
    start: Position,
    end: Position,
}

impl Selection {
    /// An inactive selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            on: false,
            start: Position::ZERO,
            end: Position::ZERO,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// The anchor.
    #[inline]
    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    /// The live end.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Position {
        self.end
    }

    /// Turn on with both ends at the cursor. Does nothing if already on, so
    /// an existing anchor is kept.
    pub const fn turn_on(&mut self, cursor: &Cursor) {
        if !self.on {
            self.on = true;
            self.set_start(cursor);
            self.set_end(cursor);
        }
    }

    pub const fn turn_off(&mut self) {
        self.on = false;
    }

    /// Capture the anchor from `cursor`.
    pub const fn set_start(&mut self, cursor: &Cursor) {
        self.start = cursor.position();
    }

    /// Capture the live end from `cursor`.
    pub const fn set_end(&mut self, cursor: &Cursor) {
        self.end = cursor.position();
    }

    /// `(min, max)` regardless of the direction the selection was made in.
    #[must_use]
    pub fn min_max(&self) -> (Position, Position) {
        let range = self.range();
        (range.start, range.end)
    }

    /// The normalized half-open range.
    #[must_use]
    pub fn range(&self) -> Range {
        Range::ordered(self.start, self.end)
    }

    /// True when the selection is on and `pos` lies in `[min, max)`.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.on && self.range().contains(pos)
    }

    /// Move every end sitting on `line` by `delta` bytes, stopping at byte
    /// 0. Used when an indent is added to or removed from that line.
    pub const fn shift_line(&mut self, line: usize, delta: isize) {
        if self.start.line == line {
            self.start.byte = self.start.byte.saturating_add_signed(delta);
        }
        if self.end.line == line {
            self.end.byte = self.end.byte.saturating_add_signed(delta);
        }
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.on {
            write!(f, "Selection({:?} -> {:?})", self.start, self.end)
        } else {
            f.write_str("Selection(off)")
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
