//! Cursor — a position in the buffer plus every navigation and edit that
//! moves it.
//!
//! The cursor's primary coordinate is the clip-space pair `(clip index,
//! clip offset)`, normalized forward like [`Buffer::locate`]. Alongside it
//! the cursor caches the absolute offset, the line, the byte within the line
//! and the visual column. The caches are refreshed on every move, so readers
//! (rendering, movement, history snapshots) never recompute them.
//!
//! # Sticky column
//!
//! Vertical movement targets the **visual** column the cursor had when it
//! last moved horizontally, so moving down from column 6 through a line that
//! starts with a tab lands under the same screen cell, not the same byte.
//!
//! # Append session
//!
//! The first insertion at a fresh location splices a new clip into the
//! buffer and opens an append session on it. While the session is open,
//! further insertions extend that clip in place instead of splitting the
//! buffer again. Any other cursor operation closes the session.
//!
//! The cursor never owns the buffer. Every operation takes it as a
//! parameter.

use tracing::trace;

use crate::buffer::{Buffer, ClipId};
use crate::clip::Clip;
use crate::error::{EditError, EditResult};
use crate::position::Position;
use crate::selection::Selection;
use crate::width;
use crate::word;

/// The part of a cursor that history snapshots keep.
///
/// Stores the absolute offset rather than clip coordinates, which later
/// splices would invalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CursorState {
    pub offset: usize,
    pub sticky_col: usize,
}

/// A cursor in a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    clip: usize,
    clip_offset: usize,
    offset: usize,
    line: usize,
    byte: usize,
    visual: usize,
    sticky_col: usize,

    /// The clip an open append session extends.
    append: Option<ClipId>,

    tab_width: usize,
}

impl Cursor {
    /// A cursor at the start of the document.
    #[must_use]
    pub const fn new(tab_width: usize) -> Self {
        Self {
            clip: 0,
            clip_offset: 0,
            offset: 0,
            line: 0,
            byte: 0,
            visual: 0,
            sticky_col: 0,
            append: None,
            tab_width: if tab_width == 0 { 1 } else { tab_width },
        }
    }

    /// A cursor at `offset` (clamped to the document).
    #[must_use]
    pub fn at(buf: &Buffer, offset: usize, tab_width: usize) -> Self {
        let mut cursor = Self::new(tab_width);
        cursor.seek(buf, offset);
        cursor
    }

    // -- Accessors ----------------------------------------------------------

    /// Absolute byte offset.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Index of the clip the cursor sits in (clip count at end of document).
    #[inline]
    #[must_use]
    pub const fn clip_index(&self) -> usize {
        self.clip
    }

    /// Byte offset inside the current clip.
    #[inline]
    #[must_use]
    pub const fn clip_offset(&self) -> usize {
        self.clip_offset
    }

    /// Current line (0-indexed).
    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Byte offset within the current line.
    #[inline]
    #[must_use]
    pub const fn byte(&self) -> usize {
        self.byte
    }

    /// Visual column within the current line.
    #[inline]
    #[must_use]
    pub const fn visual_col(&self) -> usize {
        self.visual
    }

    /// The visual column vertical moves aim for.
    #[inline]
    #[must_use]
    pub const fn sticky_col(&self) -> usize {
        self.sticky_col
    }

    /// `(line, byte)` position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.line, self.byte)
    }

    #[inline]
    #[must_use]
    pub const fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// True while an append session is open.
    #[inline]
    #[must_use]
    pub const fn is_appending(&self) -> bool {
        self.append.is_some()
    }

    /// The rune right after the cursor.
    #[must_use]
    pub fn rune_after(&self, buf: &Buffer) -> Option<char> {
        buf.char_after(self.offset).map(|(ch, _)| ch)
    }

    /// The rune right before the cursor.
    #[must_use]
    pub fn rune_before(&self, buf: &Buffer) -> Option<char> {
        buf.char_before(self.offset).map(|(ch, _)| ch)
    }

    /// The word touching the cursor, if any.
    #[must_use]
    pub fn word(&self, buf: &Buffer) -> Option<String> {
        let (start, end) = word::word_bounds(buf, self.offset)?;
        Some(String::from_utf8_lossy(&buf.slice(start, end)).into_owned())
    }

    // -- Placement ----------------------------------------------------------

    /// Refresh every cached coordinate for `offset`. Leaves the sticky
    /// column and the append session alone.
    fn place(&mut self, buf: &Buffer, offset: usize) {
        let offset = offset.min(buf.len());
        let (clip, clip_offset) = buf.locate(offset).unwrap_or((buf.clip_count(), 0));
        let (line, start) = buf.line_of(offset);
        self.clip = clip;
        self.clip_offset = clip_offset;
        self.offset = offset;
        self.line = line;
        self.byte = offset - start;
        self.visual = width::visual_len(&buf.slice(start, offset), self.tab_width);
        trace!(offset, line, byte = self.byte, "cursor placed");
    }

    /// Move to `offset` as a horizontal move: the sticky column follows and
    /// the append session closes.
    pub fn seek(&mut self, buf: &Buffer, offset: usize) {
        self.place(buf, offset);
        self.sticky_col = self.visual;
        self.append = None;
    }

    /// Move to `line` aiming for the sticky column.
    fn seek_line_sticky(&mut self, buf: &Buffer, line: usize) {
        let Some(start) = buf.line_start(line) else {
            return;
        };
        let content = buf.line(line).unwrap_or_default();
        let byte = width::byte_at_visual(&content, self.sticky_col, self.tab_width);
        self.place(buf, start + byte);
        self.append = None;
    }

    /// Move to a `(line, byte)` position.
    ///
    /// # Errors
    ///
    /// Fails if the position does not exist in `buf`.
    pub fn seek_position(&mut self, buf: &Buffer, pos: Position) -> EditResult<()> {
        let offset = buf.resolve(pos)?;
        self.seek(buf, offset);
        Ok(())
    }

    /// Capture the restorable part of the cursor.
    #[must_use]
    pub const fn snapshot(&self) -> CursorState {
        CursorState {
            offset: self.offset,
            sticky_col: self.sticky_col,
        }
    }

    /// Return to a snapshot taken earlier.
    pub fn restore(&mut self, buf: &Buffer, state: CursorState) {
        self.place(buf, state.offset);
        self.sticky_col = state.sticky_col;
        self.append = None;
    }

    // -- Elementary moves ---------------------------------------------------

    /// One rune left, wrapping to the end of the previous line.
    pub fn move_left(&mut self, buf: &Buffer) {
        let len = buf.char_before(self.offset).map_or(0, |(_, len)| len);
        self.seek(buf, self.offset - len);
    }

    /// One rune right, wrapping to the start of the next line.
    pub fn move_right(&mut self, buf: &Buffer) {
        let len = buf.char_after(self.offset).map_or(0, |(_, len)| len);
        self.seek(buf, self.offset + len);
    }

    /// One line up. No-op on the first line.
    pub fn move_up(&mut self, buf: &Buffer) {
        self.page_up(buf, 1);
    }

    /// One line down. No-op on the last line.
    pub fn move_down(&mut self, buf: &Buffer) {
        self.page_down(buf, 1);
    }

    /// Up by `lines`, stopping at the first line.
    pub fn page_up(&mut self, buf: &Buffer, lines: usize) {
        if self.line == 0 {
            self.append = None;
            return;
        }
        self.seek_line_sticky(buf, self.line.saturating_sub(lines));
    }

    /// Down by `lines`, stopping at the last line.
    pub fn page_down(&mut self, buf: &Buffer, lines: usize) {
        let last = buf.line_count() - 1;
        if self.line == last {
            self.append = None;
            return;
        }
        self.seek_line_sticky(buf, (self.line + lines).min(last));
    }

    /// Start of the current line.
    pub fn move_bol(&mut self, buf: &Buffer) {
        self.seek(buf, self.offset - self.byte);
    }

    /// End of the current line (before its newline).
    pub fn move_eol(&mut self, buf: &Buffer) {
        let end = buf.line_end(self.line).unwrap_or(self.offset);
        self.seek(buf, end);
    }

    /// Start of the document.
    pub fn move_bof(&mut self, buf: &Buffer) {
        self.seek(buf, 0);
    }

    /// End of the document.
    pub fn move_eof(&mut self, buf: &Buffer) {
        self.seek(buf, buf.len());
    }

    /// Cycle toward the start: first non-blank, then line start, then the
    /// previous line's first non-blank.
    pub fn move_boc_bol_advance(&mut self, buf: &Buffer) {
        let first = first_non_blank(buf, self.line);
        if self.byte > first {
            self.seek(buf, self.offset - self.byte + first);
        } else if self.byte > 0 {
            self.move_bol(buf);
        } else if self.line > 0 {
            let line = self.line - 1;
            let start = buf.line_start(line).unwrap_or(0);
            self.seek(buf, start + first_non_blank(buf, line));
        } else {
            self.append = None;
        }
    }

    /// Cycle toward the end: line end, then the next line's end.
    pub fn move_eol_advance(&mut self, buf: &Buffer) {
        let end = buf.line_end(self.line).unwrap_or(self.offset);
        if self.offset < end {
            self.seek(buf, end);
        } else if let Some(next_end) = buf.line_end(self.line + 1) {
            self.seek(buf, next_end);
        } else {
            self.append = None;
        }
    }

    /// Start of `line`, clamped to the last line.
    pub fn goto_line(&mut self, buf: &Buffer, line: usize) {
        let line = line.min(buf.line_count() - 1);
        let start = buf.line_start(line).unwrap_or(0);
        self.seek(buf, start);
    }

    // -- Word moves ---------------------------------------------------------

    /// The previous beginning or end of a word.
    pub fn move_prev_bow_eow(&mut self, buf: &Buffer) {
        let at = word::prev_bow_eow(buf, self.offset);
        self.seek(buf, at);
    }

    /// The next beginning or end of a word.
    pub fn move_next_bow_eow(&mut self, buf: &Buffer) {
        let at = word::next_bow_eow(buf, self.offset);
        self.seek(buf, at);
    }

    // -- Structural moves ---------------------------------------------------

    /// Next line that still has content once `skip` runes are trimmed from
    /// both ends. Lands on its first non-blank byte.
    pub fn goto_next_global_line(&mut self, buf: &Buffer, skip: &str) -> bool {
        let found = (self.line + 1..buf.line_count()).find(|&l| is_global_line(buf, l, skip));
        self.land_on_line(buf, found)
    }

    /// Previous line that still has content once `skip` runes are trimmed.
    pub fn goto_prev_global_line(&mut self, buf: &Buffer, skip: &str) -> bool {
        let found = (0..self.line).rev().find(|&l| is_global_line(buf, l, skip));
        self.land_on_line(buf, found)
    }

    fn land_on_line(&mut self, buf: &Buffer, line: Option<usize>) -> bool {
        self.append = None;
        let Some(line) = line else {
            return false;
        };
        let start = buf.line_start(line).unwrap_or(0);
        self.seek(buf, start + first_non_blank(buf, line));
        true
    }

    /// Next rune from `set` strictly after the rune under the cursor.
    pub fn goto_next_any(&mut self, buf: &Buffer, set: &str) -> bool {
        self.append = None;
        let Some((_, len)) = buf.char_after(self.offset) else {
            return false;
        };
        let mut at = self.offset + len;
        while let Some((ch, len)) = buf.char_after(at) {
            if set.contains(ch) {
                self.seek(buf, at);
                return true;
            }
            at += len;
        }
        false
    }

    /// Previous rune from `set` strictly before the cursor.
    pub fn goto_prev_any(&mut self, buf: &Buffer, set: &str) -> bool {
        self.append = None;
        let mut at = self.offset;
        while let Some((ch, len)) = buf.char_before(at) {
            at -= len;
            if set.contains(ch) {
                self.seek(buf, at);
                return true;
            }
        }
        false
    }

    /// Jump to the bracket pairing with the one after (or else before) the
    /// cursor. Unbalanced brackets leave the cursor where it is.
    pub fn goto_matching_bracket(&mut self, buf: &Buffer) -> bool {
        self.append = None;
        let at = match (buf.char_after(self.offset), buf.char_before(self.offset)) {
            (Some((ch, _)), _) if bracket_pair(ch).is_some() => self.offset,
            (_, Some((ch, len))) if bracket_pair(ch).is_some() => self.offset - len,
            _ => return false,
        };
        match matching_bracket(buf, at) {
            Some(target) => {
                self.seek(buf, target);
                true
            }
            None => false,
        }
    }

    // -- Search -------------------------------------------------------------

    /// Nearest occurrence of `pattern` starting after the cursor. Never
    /// wraps: with no match ahead nothing moves.
    pub fn goto_next(&mut self, buf: &Buffer, pattern: &[u8]) -> bool {
        let found = buf.find_forward(pattern, self.offset + 1);
        self.jump(buf, found)
    }

    /// Nearest occurrence of `pattern` starting before the cursor. Never
    /// wraps.
    pub fn goto_prev(&mut self, buf: &Buffer, pattern: &[u8]) -> bool {
        let found = buf.find_backward(pattern, self.offset);
        self.jump(buf, found)
    }

    /// First occurrence in the document.
    pub fn goto_first(&mut self, buf: &Buffer, pattern: &[u8]) -> bool {
        let found = buf.find_forward(pattern, 0);
        self.jump(buf, found)
    }

    /// Last occurrence in the document.
    pub fn goto_last(&mut self, buf: &Buffer, pattern: &[u8]) -> bool {
        let found = buf.find_backward(pattern, buf.len());
        self.jump(buf, found)
    }

    /// Next occurrence of `pattern` that stands as a whole word.
    pub fn goto_next_word(&mut self, buf: &Buffer, pattern: &[u8]) -> bool {
        let found = buf.find_forward_where(pattern, self.offset + 1, |at| {
            word::is_whole_word(buf, at, at + pattern.len())
        });
        self.jump(buf, found)
    }

    /// Previous occurrence of `pattern` that stands as a whole word.
    pub fn goto_prev_word(&mut self, buf: &Buffer, pattern: &[u8]) -> bool {
        let found = buf.find_backward_where(pattern, self.offset, |at| {
            word::is_whole_word(buf, at, at + pattern.len())
        });
        self.jump(buf, found)
    }

    fn jump(&mut self, buf: &Buffer, target: Option<usize>) -> bool {
        self.append = None;
        match target {
            Some(at) => {
                self.seek(buf, at);
                true
            }
            None => false,
        }
    }

    // -- Editing ------------------------------------------------------------

    /// Insert `text` at the cursor and move past it.
    ///
    /// Outside an append session the text becomes a new clip spliced in at
    /// the cursor, and a session opens on that clip. Inside one, the text
    /// extends the session's clip.
    ///
    /// # Errors
    ///
    /// [`EditError::StaleAppendSession`] if the session's clip is no longer
    /// the one right before the cursor.
    pub fn insert(&mut self, buf: &mut Buffer, text: &[u8]) -> EditResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        if let Some(id) = self.append {
            if self.clip == 0 || self.clip_offset != 0 || buf.clip_id(self.clip - 1) != Some(id) {
                return Err(EditError::StaleAppendSession);
            }
            buf.append_to(self.clip - 1, text)?;
            self.advance_over(text);
        } else {
            let (clip, clip_offset) = buf.locate(self.offset)?;
            let next = buf.insert_clip(clip, clip_offset, Clip::from_bytes(text.to_vec()))?;
            self.append = buf.clip_id(next - 1);
            self.place(buf, self.offset + text.len());
        }
        self.sticky_col = self.visual;
        Ok(())
    }

    /// Move the cached coordinates past `text`, just appended to the
    /// session's clip. The clip-space location does not change: the cursor
    /// still sits at the start of the clip after the session's one.
    fn advance_over(&mut self, text: &[u8]) {
        self.offset += text.len();
        match text.iter().rposition(|&b| b == b'\n') {
            Some(last) => {
                self.line += text.iter().filter(|&&b| b == b'\n').count();
                let tail = &text[last + 1..];
                self.byte = tail.len();
                self.visual = width::visual_len(tail, self.tab_width);
            }
            None => {
                self.byte += text.len();
                self.visual += width::visual_len(text, self.tab_width);
            }
        }
        trace!(offset = self.offset, line = self.line, "cursor advanced");
    }

    /// Remove the rune after the cursor. Empty at the end of the document.
    ///
    /// # Errors
    ///
    /// Propagates buffer invariant violations.
    pub fn delete(&mut self, buf: &mut Buffer) -> EditResult<Vec<u8>> {
        match buf.char_after(self.offset) {
            Some((_, len)) => self.remove_forward(buf, len),
            None => {
                self.append = None;
                Ok(Vec::new())
            }
        }
    }

    /// Remove the rune before the cursor. Empty at the start of the
    /// document.
    ///
    /// # Errors
    ///
    /// Propagates buffer invariant violations.
    pub fn backspace(&mut self, buf: &mut Buffer) -> EditResult<Vec<u8>> {
        match buf.char_before(self.offset) {
            Some((_, len)) => self.remove_backward(buf, len),
            None => {
                self.append = None;
                Ok(Vec::new())
            }
        }
    }

    /// Remove `len` bytes after the cursor.
    ///
    /// # Errors
    ///
    /// [`EditError::OffsetOutOfBounds`] if fewer bytes remain.
    pub fn remove_forward(&mut self, buf: &mut Buffer, len: usize) -> EditResult<Vec<u8>> {
        let removed = buf.remove(self.offset, self.offset + len)?;
        self.seek(buf, self.offset);
        Ok(removed)
    }

    /// Remove `len` bytes before the cursor.
    ///
    /// # Errors
    ///
    /// [`EditError::OffsetOutOfBounds`] if the cursor is closer than `len`
    /// to the start.
    pub fn remove_backward(&mut self, buf: &mut Buffer, len: usize) -> EditResult<Vec<u8>> {
        let start = self
            .offset
            .checked_sub(len)
            .ok_or(EditError::OffsetOutOfBounds {
                offset: len,
                len: self.offset,
            })?;
        let removed = buf.remove(start, self.offset)?;
        self.seek(buf, start);
        Ok(removed)
    }

    /// Remove the selected range, leave the cursor at its start and turn the
    /// selection off. An empty or inactive selection removes nothing.
    ///
    /// # Errors
    ///
    /// Fails if either selection end does not exist in `buf`.
    pub fn delete_selection(
        &mut self,
        buf: &mut Buffer,
        sel: &mut Selection,
    ) -> EditResult<Vec<u8>> {
        if !sel.is_on() {
            self.append = None;
            return Ok(Vec::new());
        }
        let (min, max) = sel.min_max();
        let start = buf.resolve(min)?;
        let end = buf.resolve(max)?;
        let removed = buf.remove(start, end)?;
        self.seek(buf, start);
        sel.turn_off();
        Ok(removed)
    }

    /// Indent every line the selection touches (or the current line) by one
    /// `indent` unit. Returns the indented lines.
    ///
    /// # Errors
    ///
    /// Propagates buffer invariant violations.
    pub fn tab(
        &mut self,
        buf: &mut Buffer,
        sel: Option<&Selection>,
        indent: &[u8],
    ) -> EditResult<Vec<usize>> {
        let mut changed = Vec::new();
        if !indent.is_empty() {
            for line in self.target_lines(sel) {
                buf.indent_line(line, indent)?;
                changed.push(line);
            }
        }
        let byte = if changed.contains(&self.line) {
            self.byte + indent.len()
        } else {
            self.byte
        };
        self.seek_position(buf, Position::new(self.line, byte))?;
        Ok(changed)
    }

    /// Remove one `indent` unit from every touched line that starts with
    /// one. Returns the lines actually changed.
    ///
    /// # Errors
    ///
    /// Propagates buffer invariant violations.
    pub fn untab(
        &mut self,
        buf: &mut Buffer,
        sel: Option<&Selection>,
        indent: &[u8],
    ) -> EditResult<Vec<usize>> {
        let mut changed = Vec::new();
        for line in self.target_lines(sel) {
            if buf.unindent_line(line, indent)? {
                changed.push(line);
            }
        }
        let byte = if changed.contains(&self.line) {
            self.byte.saturating_sub(indent.len())
        } else {
            self.byte
        };
        self.seek_position(buf, Position::new(self.line, byte))?;
        Ok(changed)
    }

    fn target_lines(&self, sel: Option<&Selection>) -> std::ops::RangeInclusive<usize> {
        match sel {
            Some(sel) if sel.is_on() => sel.range().touched_lines(),
            _ => self.line..=self.line,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Byte offset of the first non-blank (space or tab) rune of `line`.
fn first_non_blank(buf: &Buffer, line: usize) -> usize {
    buf.line(line)
        .map_or(0, |content| {
            content
                .iter()
                .take_while(|&&b| b == b' ' || b == b'\t')
                .count()
        })
}

fn is_global_line(buf: &Buffer, line: usize, skip: &str) -> bool {
    buf.line(line).is_some_and(|content| {
        !String::from_utf8_lossy(&content)
            .trim_matches(|ch| skip.contains(ch))
            .is_empty()
    })
}

/// `(open, close, scans_forward)` for a bracket rune.
const fn bracket_pair(ch: char) -> Option<(char, char, bool)> {
    match ch {
        '(' => Some(('(', ')', true)),
        ')' => Some(('(', ')', false)),
        '[' => Some(('[', ']', true)),
        ']' => Some(('[', ']', false)),
        '{' => Some(('{', '}', true)),
        '}' => Some(('{', '}', false)),
        _ => None,
    }
}

/// Offset of the bracket pairing with the one at `at`, counting nesting.
fn matching_bracket(buf: &Buffer, at: usize) -> Option<usize> {
    let (ch, len) = buf.char_after(at)?;
    let (open, close, forward) = bracket_pair(ch)?;
    let mut depth = 0usize;
    if forward {
        let mut pos = at;
        while let Some((c, l)) = buf.char_after(pos) {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            pos += l;
        }
    } else {
        let mut pos = at + len;
        while let Some((c, l)) = buf.char_before(pos) {
            pos -= l;
            if c == close {
                depth += 1;
            } else if c == open {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_buffer() -> Buffer {
        // "hello\n" "world\n" "hi\n" "\n" "goodbye"
        Buffer::from_text("hello\nworld\nhi\n\ngoodbye")
    }

    fn cursor_at(buf: &Buffer, line: usize, byte: usize) -> Cursor {
        let mut c = Cursor::new(4);
        c.seek_position(buf, Position::new(line, byte)).unwrap();
        c
    }

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_at_origin() {
        let c = Cursor::new(4);
        assert_eq!(c.position(), Position::ZERO);
        assert_eq!(c.offset(), 0);
        assert!(!c.is_appending());
    }

    #[test]
    fn zero_tab_width_is_clamped() {
        assert_eq!(Cursor::new(0).tab_width(), 1);
    }

    #[test]
    fn at_clamps_to_document() {
        let buf = Buffer::from_text("abc");
        let c = Cursor::at(&buf, 99, 4);
        assert_eq!(c.offset(), 3);
        assert_eq!(c.clip_index(), 1);
        assert_eq!(c.clip_offset(), 0);
    }

    #[test]
    fn caches_follow_position() {
        let buf = Buffer::from_text("a\n\tb中c");
        let c = Cursor::at(&buf, 7, 4);
        assert_eq!(c.line(), 1);
        assert_eq!(c.byte(), 5);
        assert_eq!(c.visual_col(), 7);
    }

    // -- Horizontal ---------------------------------------------------------

    #[test]
    fn left_right_step_whole_runes() {
        let buf = Buffer::from_text("a中b");
        let mut c = Cursor::new(4);
        c.move_right(&buf);
        c.move_right(&buf);
        assert_eq!(c.offset(), 4);
        c.move_left(&buf);
        assert_eq!(c.offset(), 1);
    }

    #[test]
    fn left_right_wrap_lines() {
        let buf = Buffer::from_text("ab\ncd");
        let mut c = cursor_at(&buf, 0, 2);
        c.move_right(&buf);
        assert_eq!(c.position(), Position::new(1, 0));
        c.move_left(&buf);
        assert_eq!(c.position(), Position::new(0, 2));
    }

    #[test]
    fn left_right_stop_at_edges() {
        let buf = Buffer::from_text("ab");
        let mut c = Cursor::new(4);
        c.move_left(&buf);
        assert_eq!(c.offset(), 0);
        c.move_eof(&buf);
        c.move_right(&buf);
        assert_eq!(c.offset(), 2);
    }

    #[test]
    fn bol_eol() {
        let buf = sample_buffer();
        let mut c = cursor_at(&buf, 1, 2);
        c.move_eol(&buf);
        assert_eq!(c.position(), Position::new(1, 5));
        c.move_bol(&buf);
        assert_eq!(c.position(), Position::new(1, 0));
    }

    #[test]
    fn bof_eof() {
        let buf = sample_buffer();
        let mut c = cursor_at(&buf, 2, 1);
        c.move_eof(&buf);
        assert_eq!(c.position(), Position::new(4, 7));
        c.move_bof(&buf);
        assert_eq!(c.position(), Position::ZERO);
    }

    // -- Vertical -----------------------------------------------------------

    #[test]
    fn down_clamps_to_short_line_and_returns() {
        let buf = sample_buffer();
        let mut c = cursor_at(&buf, 1, 4);
        c.move_down(&buf);
        assert_eq!(c.position(), Position::new(2, 2));
        c.move_down(&buf);
        assert_eq!(c.position(), Position::new(3, 0));
        c.move_down(&buf);
        assert_eq!(c.position(), Position::new(4, 4));
    }

    #[test]
    fn vertical_keeps_visual_column_across_tabs() {
        let buf = Buffer::from_text("abcdefgh\n\tx\n");
        let mut c = cursor_at(&buf, 0, 5);
        c.move_down(&buf);
        // Tab covers columns 0..=3, x is column 4, end of line is column 5.
        assert_eq!(c.position(), Position::new(1, 2));
        assert_eq!(c.visual_col(), 5);
        c.move_up(&buf);
        assert_eq!(c.position(), Position::new(0, 5));
    }

    #[test]
    fn vertical_across_wide_runes() {
        let buf = Buffer::from_text("中文字\nabcdef");
        let mut c = cursor_at(&buf, 1, 4);
        c.move_up(&buf);
        assert_eq!(c.byte(), 6);
        assert_eq!(c.visual_col(), 4);
    }

    #[test]
    fn up_on_first_line_stays() {
        let buf = sample_buffer();
        let mut c = cursor_at(&buf, 0, 3);
        c.move_up(&buf);
        assert_eq!(c.position(), Position::new(0, 3));
    }

    #[test]
    fn page_moves_clamp() {
        let buf = sample_buffer();
        let mut c = cursor_at(&buf, 1, 1);
        c.page_down(&buf, 20);
        assert_eq!(c.line(), 4);
        c.page_up(&buf, 3);
        assert_eq!(c.position(), Position::new(1, 1));
        c.page_up(&buf, 3);
        assert_eq!(c.line(), 0);
    }

    // -- Advance moves ------------------------------------------------------

    #[test]
    fn boc_bol_advance_cycle() {
        let buf = Buffer::from_text("  a\n    b");
        let mut c = cursor_at(&buf, 1, 5);
        c.move_boc_bol_advance(&buf);
        assert_eq!(c.position(), Position::new(1, 4));
        c.move_boc_bol_advance(&buf);
        assert_eq!(c.position(), Position::new(1, 0));
        c.move_boc_bol_advance(&buf);
        assert_eq!(c.position(), Position::new(0, 2));
    }

    #[test]
    fn eol_advance_cycle() {
        let buf = Buffer::from_text("ab\ncde\n");
        let mut c = Cursor::new(4);
        c.move_eol_advance(&buf);
        assert_eq!(c.position(), Position::new(0, 2));
        c.move_eol_advance(&buf);
        assert_eq!(c.position(), Position::new(1, 3));
        c.move_eol_advance(&buf);
        assert_eq!(c.position(), Position::new(2, 0));
        c.move_eol_advance(&buf);
        assert_eq!(c.position(), Position::new(2, 0));
    }

    #[test]
    fn goto_line_clamps() {
        let buf = sample_buffer();
        let mut c = Cursor::new(4);
        c.goto_line(&buf, 2);
        assert_eq!(c.position(), Position::new(2, 0));
        c.goto_line(&buf, 100);
        assert_eq!(c.position(), Position::new(4, 0));
    }

    // -- Words --------------------------------------------------------------

    #[test]
    fn bow_eow_moves() {
        let buf = Buffer::from_text("foo bar");
        let mut c = Cursor::new(4);
        c.move_next_bow_eow(&buf);
        assert_eq!(c.offset(), 3);
        c.move_next_bow_eow(&buf);
        assert_eq!(c.offset(), 4);
        c.move_prev_bow_eow(&buf);
        assert_eq!(c.offset(), 3);
    }

    #[test]
    fn word_under_cursor() {
        let buf = Buffer::from_text("let value = 1;");
        assert_eq!(Cursor::at(&buf, 6, 4).word(&buf).as_deref(), Some("value"));
        assert_eq!(Cursor::at(&buf, 10, 4).word(&buf), None);
    }

    // -- Global lines -------------------------------------------------------

    #[test]
    fn global_line_skips_noise() {
        let buf = Buffer::from_text("fn a() {\n\n  // x\n  }\n  let b;\n");
        let mut c = Cursor::new(4);
        assert!(c.goto_next_global_line(&buf, " \t#/{}()"));
        assert_eq!(c.position(), Position::new(2, 2));
        assert!(c.goto_next_global_line(&buf, " \t#/{}()"));
        assert_eq!(c.position(), Position::new(4, 2));
        assert!(!c.goto_next_global_line(&buf, " \t#/{}()"));
        assert!(c.goto_prev_global_line(&buf, " \t#/{}()"));
        assert_eq!(c.position(), Position::new(2, 2));
    }

    // -- Arguments ----------------------------------------------------------

    #[test]
    fn next_any_skips_rune_under_cursor() {
        let buf = Buffer::from_text("f(a, b)");
        let mut c = Cursor::at(&buf, 3, 4);
        assert!(c.goto_next_any(&buf, "{(,)}"));
        assert_eq!(c.offset(), 6);
        assert!(!c.goto_next_any(&buf, "{(,)}"));
        assert_eq!(c.offset(), 6);
    }

    #[test]
    fn prev_any_strictly_before() {
        let buf = Buffer::from_text("f(a, b)");
        let mut c = Cursor::at(&buf, 6, 4);
        assert!(c.goto_prev_any(&buf, "{(,)}"));
        assert_eq!(c.offset(), 3);
        assert!(c.goto_prev_any(&buf, "{(,)}"));
        assert_eq!(c.offset(), 1);
        assert!(!c.goto_prev_any(&buf, "{(,)}"));
    }

    // -- Brackets -----------------------------------------------------------

    #[test]
    fn matching_bracket_forward_and_back() {
        let buf = Buffer::from_text("a(b[c]{d})e");
        let mut c = Cursor::at(&buf, 1, 4);
        assert!(c.goto_matching_bracket(&buf));
        assert_eq!(c.offset(), 9);
        assert!(c.goto_matching_bracket(&buf));
        assert_eq!(c.offset(), 1);
    }

    #[test]
    fn matching_bracket_uses_rune_before() {
        let buf = Buffer::from_text("(ab)");
        let mut c = Cursor::at(&buf, 4, 4);
        assert!(c.goto_matching_bracket(&buf));
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn unbalanced_bracket_stays() {
        let buf = Buffer::from_text("((a)");
        let mut c = Cursor::new(4);
        assert!(!c.goto_matching_bracket(&buf));
        assert_eq!(c.offset(), 0);

        let buf = Buffer::from_text("abc");
        let mut c = Cursor::at(&buf, 1, 4);
        assert!(!c.goto_matching_bracket(&buf));
    }

    // -- Search -------------------------------------------------------------

    #[test]
    fn goto_next_does_not_wrap() {
        let buf = Buffer::from_text("xyz abc");
        let mut c = Cursor::at(&buf, 2, 4);
        assert!(!c.goto_next(&buf, b"xyz"));
        assert_eq!(c.offset(), 2);
        assert_eq!(buf.contents(), "xyz abc");
    }

    #[test]
    fn goto_next_skips_match_at_cursor() {
        let buf = Buffer::from_text("ab ab ab");
        let mut c = Cursor::new(4);
        assert!(c.goto_next(&buf, b"ab"));
        assert_eq!(c.offset(), 3);
        assert!(c.goto_prev(&buf, b"ab"));
        assert_eq!(c.offset(), 0);
        assert!(!c.goto_prev(&buf, b"ab"));
    }

    #[test]
    fn goto_first_and_last() {
        let buf = Buffer::from_text("ab ab ab");
        let mut c = Cursor::at(&buf, 4, 4);
        assert!(c.goto_last(&buf, b"ab"));
        assert_eq!(c.offset(), 6);
        assert!(c.goto_first(&buf, b"ab"));
        assert_eq!(c.offset(), 0);
    }

    #[test]
    fn goto_word_matches_whole_words_only() {
        let buf = Buffer::from_text("cat concat cat");
        let mut c = Cursor::new(4);
        assert!(c.goto_next_word(&buf, b"cat"));
        assert_eq!(c.offset(), 11);
        assert!(c.goto_prev_word(&buf, b"cat"));
        assert_eq!(c.offset(), 0);
    }

    // -- Insert -------------------------------------------------------------

    #[test]
    fn typing_run_extends_one_clip() {
        let mut buf = Buffer::from_text("ac");
        let mut c = Cursor::at(&buf, 1, 4);
        for ch in ["b", "b", "中"] {
            c.insert(&mut buf, ch.as_bytes()).unwrap();
        }
        assert_eq!(buf.contents(), "abb中c");
        assert_eq!(buf.clip_count(), 3);
        assert_eq!(c.offset(), 6);
        assert!(c.is_appending());
    }

    #[test]
    fn append_session_caches_match_a_fresh_seek() {
        let mut buf = Buffer::from_text("x\ty\nz");
        // fragment the buffer first
        for at in [4, 2, 1] {
            buf.insert(at, b"-").unwrap();
        }
        let mut c = Cursor::at(&buf, 3, 4);
        for text in ["a", "\t中", "b\n", "\tc", "\n", "d中\te"] {
            c.insert(&mut buf, text.as_bytes()).unwrap();
            let fresh = Cursor::at(&buf, c.offset(), 4);
            assert_eq!(c.position(), fresh.position());
            assert_eq!(c.visual_col(), fresh.visual_col());
            assert_eq!(
                (c.clip_index(), c.clip_offset()),
                (fresh.clip_index(), fresh.clip_offset())
            );
        }
        assert!(c.is_appending());
        assert_eq!(c.sticky_col(), c.visual_col());
    }

    #[test]
    fn move_closes_append_session() {
        let mut buf = Buffer::new();
        let mut c = Cursor::new(4);
        c.insert(&mut buf, b"ab").unwrap();
        c.move_left(&buf);
        assert!(!c.is_appending());
        c.insert(&mut buf, b"X").unwrap();
        assert_eq!(buf.contents(), "aXb");
        assert_eq!(buf.clip_count(), 3);
    }

    #[test]
    fn insert_newline_updates_line() {
        let mut buf = Buffer::from_text("ab");
        let mut c = Cursor::at(&buf, 1, 4);
        c.insert(&mut buf, b"\n").unwrap();
        assert_eq!(c.position(), Position::new(1, 0));
        assert_eq!(buf.newline_offsets(), buf.rescan_newlines());
    }

    #[test]
    fn stale_session_is_an_error() {
        let mut buf = Buffer::new();
        let mut c = Cursor::new(4);
        c.insert(&mut buf, b"ab").unwrap();
        // Edit behind the cursor's back.
        buf.insert(0, b"zz").unwrap();
        assert_eq!(c.insert(&mut buf, b"c"), Err(EditError::StaleAppendSession));
    }

    // -- Delete / backspace -------------------------------------------------

    #[test]
    fn delete_removes_rune_after() {
        let mut buf = Buffer::from_text("a中b");
        let mut c = Cursor::at(&buf, 1, 4);
        assert_eq!(c.delete(&mut buf).unwrap(), "中".as_bytes());
        assert_eq!(buf.contents(), "ab");
        assert_eq!(c.offset(), 1);
    }

    #[test]
    fn backspace_removes_rune_before() {
        let mut buf = Buffer::from_text("a\nb");
        let mut c = Cursor::at(&buf, 2, 4);
        assert_eq!(c.backspace(&mut buf).unwrap(), b"\n");
        assert_eq!(buf.contents(), "ab");
        assert_eq!(c.position(), Position::new(0, 1));
    }

    #[test]
    fn delete_and_backspace_at_edges_are_empty() {
        let mut buf = Buffer::from_text("ab");
        let mut c = Cursor::new(4);
        assert!(c.backspace(&mut buf).unwrap().is_empty());
        c.move_eof(&buf);
        assert!(c.delete(&mut buf).unwrap().is_empty());
        assert!(!buf.is_modified());
    }

    #[test]
    fn delete_invalid_byte_is_byte_exact() {
        let mut buf = Buffer::open(vec![b'a', 0xff, 0xfe, b'b']);
        let mut c = Cursor::at(&buf, 1, 4);
        assert_eq!(c.delete(&mut buf).unwrap(), vec![0xff]);
        assert_eq!(buf.to_bytes(), vec![b'a', 0xfe, b'b']);
    }

    #[test]
    fn remove_backward_past_start_fails() {
        let mut buf = Buffer::from_text("ab");
        let mut c = Cursor::at(&buf, 1, 4);
        assert!(c.remove_backward(&mut buf, 2).is_err());
        assert_eq!(buf.contents(), "ab");
    }

    // -- Selection edits ----------------------------------------------------

    #[test]
    fn delete_selection_removes_range() {
        let mut buf = Buffer::from_text("hello\nworld");
        let mut c = cursor_at(&buf, 1, 2);
        let mut sel = Selection::new();
        sel.turn_on(&c);
        c.seek_position(&buf, Position::new(0, 3)).unwrap();
        sel.set_end(&c);
        let removed = c.delete_selection(&mut buf, &mut sel).unwrap();
        assert_eq!(removed, b"lo\nwo");
        assert_eq!(buf.contents(), "helrld");
        assert_eq!(c.position(), Position::new(0, 3));
        assert!(!sel.is_on());
    }

    // -- Tab / untab --------------------------------------------------------

    #[test]
    fn tab_current_line_shifts_cursor() {
        let mut buf = Buffer::from_text("ab\ncd");
        let mut c = cursor_at(&buf, 1, 1);
        assert_eq!(c.tab(&mut buf, None, b"\t").unwrap(), vec![1]);
        assert_eq!(buf.contents(), "ab\n\tcd");
        assert_eq!(c.position(), Position::new(1, 2));
    }

    #[test]
    fn tab_selection_lines() {
        let mut buf = Buffer::from_text("a\nb\nc\nd");
        let mut c = cursor_at(&buf, 0, 0);
        let mut sel = Selection::new();
        sel.turn_on(&c);
        c.seek_position(&buf, Position::new(2, 0)).unwrap();
        sel.set_end(&c);
        assert_eq!(c.tab(&mut buf, Some(&sel), b"  ").unwrap(), vec![0, 1]);
        assert_eq!(buf.contents(), "  a\n  b\nc\nd");
        assert_eq!(c.position(), Position::new(2, 0));
    }

    #[test]
    fn untab_reports_only_changed_lines() {
        let mut buf = Buffer::from_text("\ta\nb\n\tc");
        let mut c = cursor_at(&buf, 0, 2);
        let mut sel = Selection::new();
        sel.turn_on(&c);
        c.seek_position(&buf, Position::new(2, 1)).unwrap();
        sel.set_end(&c);
        assert_eq!(c.untab(&mut buf, Some(&sel), b"\t").unwrap(), vec![0, 2]);
        assert_eq!(buf.contents(), "a\nb\nc");
        assert_eq!(c.position(), Position::new(2, 0));
    }

    // -- Snapshots ----------------------------------------------------------

    #[test]
    fn snapshot_survives_splices() {
        let mut buf = Buffer::from_text("abcdef");
        let mut c = Cursor::at(&buf, 4, 4);
        let state = c.snapshot();
        buf.insert(1, b"X").unwrap();
        buf.remove(1, 2).unwrap();
        c.move_bof(&buf);
        c.restore(&buf, state);
        assert_eq!(c.offset(), 4);
        assert_eq!(c.clip_index(), 1);
        assert_eq!(c.clip_offset(), 3);
        assert_eq!(c.rune_after(&buf), Some('e'));
        assert_eq!(c.rune_before(&buf), Some('d'));
    }
}
