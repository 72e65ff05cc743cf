//! Register — the in-memory clipboard.
//!
//! Copy stores raw bytes; paste inserts them back unchanged. Nothing is
//! persisted between runs and the system clipboard is never touched.

use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::error::EditResult;
use crate::selection::Selection;

/// The single clipboard slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    content: Vec<u8>,
}

impl Register {
    /// An empty register.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            content: Vec::new(),
        }
    }

    /// Replace the content.
    pub fn set(&mut self, bytes: Vec<u8>) {
        self.content = bytes;
    }

    /// Copy from the document: the selected text when the selection is on,
    /// otherwise the rune after the cursor (nothing at the end of the
    /// document).
    ///
    /// # Errors
    ///
    /// Fails if the selection names a position missing from `buf`.
    pub fn copy(&mut self, buf: &Buffer, cursor: &Cursor, sel: &Selection) -> EditResult<()> {
        let bytes = if sel.is_on() {
            let (min, max) = sel.min_max();
            buf.slice(buf.resolve(min)?, buf.resolve(max)?)
        } else {
            buf.char_after(cursor.offset())
                .map(|(_, len)| buf.slice(cursor.offset(), cursor.offset() + len))
                .unwrap_or_default()
        };
        self.set(bytes);
        Ok(())
    }

    /// The stored bytes. Empty if nothing has been copied.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn new_is_empty() {
        assert!(Register::new().is_empty());
    }

    #[test]
    fn copy_selection() {
        let buf = Buffer::from_text("hello\nworld");
        let mut cursor = Cursor::at(&buf, 3, 4);
        let mut sel = Selection::new();
        sel.turn_on(&cursor);
        cursor.seek_position(&buf, Position::new(1, 2)).unwrap();
        sel.set_end(&cursor);

        let mut reg = Register::new();
        reg.copy(&buf, &cursor, &sel).unwrap();
        assert_eq!(reg.content(), b"lo\nwo");
    }

    #[test]
    fn copy_without_selection_takes_rune_after() {
        let buf = Buffer::from_text("a中b");
        let cursor = Cursor::at(&buf, 1, 4);
        let mut reg = Register::new();
        reg.copy(&buf, &cursor, &Selection::new()).unwrap();
        assert_eq!(reg.content(), "中".as_bytes());
    }

    #[test]
    fn copy_at_end_clears() {
        let buf = Buffer::from_text("ab");
        let cursor = Cursor::at(&buf, 2, 4);
        let mut reg = Register::new();
        reg.set(b"old".to_vec());
        reg.copy(&buf, &cursor, &Selection::new()).unwrap();
        assert!(reg.is_empty());
    }
}
