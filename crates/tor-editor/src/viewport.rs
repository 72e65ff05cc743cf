//! Viewport — which part of the document is on screen.
//!
//! A `Viewport` holds only scroll state and size. It never owns the buffer
//! or cursor: the cursor is passed to [`follow`](Viewport::follow) and
//! [`position_in_viewport`](Viewport::position_in_viewport) as a parameter,
//! so one viewport can track whatever cursor the session currently has.
//!
//! Rows are document lines. Columns are visual columns, so tabs and wide
//! glyphs are already expanded by the cursor's own cache.
//!
//! ```text
//!          left
//!           │◀──── width ────▶│
//!   top ──▶ ┌─────────────────┐  ▲
//!           │                 │  │
//!           │     cursor ▮    │  height
//!           │                 │  │
//!           └─────────────────┘  ▼
//! ```

use crate::cursor::Cursor;

/// A rectangular window over `(line, visual column)` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible line (0-indexed).
    top: usize,
    /// First visible visual column.
    left: usize,
    height: usize,
    width: usize,
}

impl Viewport {
    #[must_use]
    pub const fn new(height: usize, width: usize) -> Self {
        Self {
            top: 0,
            left: 0,
            height,
            width,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn top(&self) -> usize {
        self.top
    }

    #[inline]
    #[must_use]
    pub const fn left(&self) -> usize {
        self.left
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    // -- Scrolling ----------------------------------------------------------

    /// Scroll so the cursor stays `margin` lines away from the top and
    /// bottom edges and its visual column stays inside the visible span.
    ///
    /// The margin shrinks on viewports too short to honor it. A zero-sized
    /// viewport never scrolls.
    pub const fn follow(&mut self, cursor: &Cursor, margin: usize) {
        if self.height == 0 || self.width == 0 {
            return;
        }
        let margin = if margin * 2 < self.height {
            margin
        } else {
            (self.height - 1) / 2
        };

        let line = cursor.line();
        if line < self.top + margin {
            self.top = line.saturating_sub(margin);
        } else if line + margin >= self.top + self.height {
            self.top = line + margin + 1 - self.height;
        }

        let col = cursor.visual_col();
        if col < self.left {
            self.left = col;
        } else if col >= self.left + self.width {
            self.left = col + 1 - self.width;
        }
    }

    /// The cursor's `(row, col)` inside the viewport, or `None` when it is
    /// scrolled out of view.
    #[must_use]
    pub const fn position_in_viewport(&self, cursor: &Cursor) -> Option<(usize, usize)> {
        let line = cursor.line();
        let col = cursor.visual_col();
        if line < self.top
            || line >= self.top + self.height
            || col < self.left
            || col >= self.left + self.width
        {
            return None;
        }
        Some((line - self.top, col - self.left))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
