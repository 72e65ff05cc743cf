//! Text buffer — an ordered sequence of clips.
//!
//! A `Buffer` is the whole document. It stores the document as a list of
//! [`Clip`]s whose concatenation, in order, is the content. Clips live in an
//! arena and are addressed by stable [`ClipId`]s; the document order is a
//! separate `Vec<ClipId>`. Splicing a clip in or out only shuffles ids in the
//! order vector, and an id handed out for an open append session keeps
//! naming the same clip no matter what happens around it.
//!
//! # Newline index
//!
//! Every clip carries the offsets of its own newlines. The global index is
//! never rescanned from bytes: it is the concatenation of each clip's
//! offsets shifted by the clip's starting offset ([`Buffer::newline_offsets`]).
//! [`Buffer::rescan_newlines`] exists only so tests can prove the two agree.
//!
//! # Coordinates
//!
//! Document offsets are absolute byte offsets in `[0, len]`. A location in
//! clip space is `(clip_index, clip_offset)` where `clip_index` indexes the
//! order vector. Locations are normalized forward: an offset on a clip
//! boundary belongs to the start of the following clip, and the end of the
//! document is `(clip_count, 0)`.
//!
//! Lines are split on `\n` only. A `\r` before it is ordinary line content.

use std::fmt;

use tracing::trace;

use crate::clip::{self, Clip};
use crate::error::{EditError, EditResult};
use crate::position::Position;
use crate::utf8;

// ---------------------------------------------------------------------------
// Line ending
// ---------------------------------------------------------------------------

/// The line terminator inserted by a newline edit.
///
/// Supplied by configuration, or detected from the first terminator in the
/// opened bytes. Defaults to `Lf` for documents without any.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// The terminator text.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Detect the terminator style from the first `\n` in `bytes`.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().position(|&b| b == b'\n') {
            Some(i) if i > 0 && bytes[i - 1] == b'\r' => Self::CrLf,
            _ => Self::Lf,
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Stable handle to a clip slot in the buffer's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipId(usize);

/// The document: an arena of clips plus their order.
#[derive(Clone, Default)]
pub struct Buffer {
    arena: Vec<Clip>,
    free: Vec<ClipId>,
    order: Vec<ClipId>,
    len: usize,
    modified: bool,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// An empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            len: 0,
            modified: false,
        }
    }

    /// Open a document from raw file bytes. The whole file becomes one clip
    /// and its newlines are indexed once, here.
    #[must_use]
    pub fn open(bytes: Vec<u8>) -> Self {
        let mut buf = Self::new();
        if !bytes.is_empty() {
            buf.len = bytes.len();
            let id = buf.alloc(Clip::from_bytes(bytes));
            buf.order.push(id);
        }
        buf
    }

    /// Open a document from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::open(text.as_bytes().to_vec())
    }

    /// Serialize the document back to raw bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for clip in self.clips() {
            out.extend_from_slice(clip.data());
        }
        out
    }

    /// The document as text, with malformed bytes replaced. Allocates.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }

    // -- Size ---------------------------------------------------------------

    /// Total byte length.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when the document holds no bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of clips in document order.
    #[inline]
    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.order.len()
    }

    /// The clip at `index` in document order.
    #[must_use]
    pub fn clip(&self, index: usize) -> Option<&Clip> {
        self.order.get(index).map(|id| &self.arena[id.0])
    }

    /// The stable id of the clip at `index` in document order.
    #[must_use]
    pub fn clip_id(&self, index: usize) -> Option<ClipId> {
        self.order.get(index).copied()
    }

    /// Clips in document order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.order.iter().map(|id| &self.arena[id.0])
    }

    // -- Newline index ------------------------------------------------------

    /// Absolute offsets of every newline, assembled from the per-clip
    /// indexes.
    #[must_use]
    pub fn newline_offsets(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut base = 0;
        for clip in self.clips() {
            out.extend(clip.newlines().iter().map(|n| n + base));
            base += clip.len();
        }
        out
    }

    /// Absolute newline offsets found by scanning every byte. Only useful to
    /// check [`newline_offsets`](Self::newline_offsets).
    #[must_use]
    pub fn rescan_newlines(&self) -> Vec<usize> {
        clip::newline_offsets(&self.to_bytes())
    }

    /// Number of lines. An empty document has one (empty) line, and a
    /// trailing newline opens one more.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.clips().map(|c| c.newlines().len()).sum::<usize>() + 1
    }

    /// The line containing `offset` and the offset where that line starts.
    ///
    /// A newline belongs to the line it terminates.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> (usize, usize) {
        let mut line = 0;
        let mut start = 0;
        let mut base = 0;
        for clip in self.clips() {
            if base >= offset {
                break;
            }
            let before = clip.newlines_before(offset - base);
            if before > 0 {
                line += before;
                start = base + clip.newlines()[before - 1] + 1;
            }
            base += clip.len();
        }
        (line, start)
    }

    /// Offset of the first byte of `line`.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return Some(0);
        }
        let mut remaining = line;
        let mut base = 0;
        for clip in self.clips() {
            let count = clip.newlines().len();
            if count >= remaining {
                return Some(base + clip.newlines()[remaining - 1] + 1);
            }
            remaining -= count;
            base += clip.len();
        }
        None
    }

    /// Offset just past the last content byte of `line` (its newline, or
    /// the end of the document for the last line).
    #[must_use]
    pub fn line_end(&self, line: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        Some(
            self.line_start(line + 1)
                .map_or(self.len, |next| next - 1)
                .max(start),
        )
    }

    /// Content of `line` without its newline.
    #[must_use]
    pub fn line(&self, line: usize) -> Option<Vec<u8>> {
        let start = self.line_start(line)?;
        let end = self.line_end(line)?;
        Some(self.slice(start, end))
    }

    /// Every line's content, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.to_bytes()
            .split(|&b| b == b'\n')
            .map(<[u8]>::to_vec)
            .collect()
    }

    /// Convert an absolute offset to `(line, byte)`.
    #[must_use]
    pub fn position_of(&self, offset: usize) -> Position {
        let (line, start) = self.line_of(offset.min(self.len));
        Position::new(line, offset.min(self.len) - start)
    }

    /// Convert `(line, byte)` to an absolute offset. `None` if the line does
    /// not exist or the byte lies past its end.
    #[must_use]
    pub fn offset_at(&self, pos: Position) -> Option<usize> {
        let start = self.line_start(pos.line)?;
        let end = self.line_end(pos.line)?;
        let offset = start + pos.byte;
        (offset <= end).then_some(offset)
    }

    /// Like [`offset_at`](Self::offset_at) but reports why a position does
    /// not resolve.
    ///
    /// # Errors
    ///
    /// [`EditError::LineOutOfRange`] for a missing line,
    /// [`EditError::OffsetOutOfBounds`] for a byte past the line's end.
    pub fn resolve(&self, pos: Position) -> EditResult<usize> {
        let line_count = self.line_count();
        let (Some(start), Some(end)) = (self.line_start(pos.line), self.line_end(pos.line)) else {
            return Err(EditError::LineOutOfRange {
                line: pos.line,
                line_count,
            });
        };
        if start + pos.byte > end {
            return Err(EditError::OffsetOutOfBounds {
                offset: pos.byte,
                len: end - start,
            });
        }
        Ok(start + pos.byte)
    }

    // -- Byte access --------------------------------------------------------

    /// Copy of the bytes in `[start, end)`, clamped to the document.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Vec<u8> {
        let end = end.min(self.len);
        let mut out = Vec::with_capacity(end.saturating_sub(start));
        let mut base = 0;
        for clip in self.clips() {
            if base >= end {
                break;
            }
            let clip_end = base + clip.len();
            if clip_end > start {
                let from = start.saturating_sub(base);
                let to = (end - base).min(clip.len());
                out.extend_from_slice(&clip.data()[from..to]);
            }
            base = clip_end;
        }
        out
    }

    /// The rune starting at `offset` and its byte length.
    #[must_use]
    pub fn char_after(&self, offset: usize) -> Option<(char, usize)> {
        utf8::decode_first(&self.slice(offset, offset + 4))
    }

    /// The rune ending at `offset` and its byte length.
    #[must_use]
    pub fn char_before(&self, offset: usize) -> Option<(char, usize)> {
        utf8::decode_last(&self.slice(offset.saturating_sub(4), offset))
    }

    // -- Clip-space coordinates ---------------------------------------------

    /// Normalized `(clip_index, clip_offset)` for an absolute offset.
    ///
    /// # Errors
    ///
    /// [`EditError::OffsetOutOfBounds`] if `offset > len`.
    pub fn locate(&self, offset: usize) -> EditResult<(usize, usize)> {
        if offset > self.len {
            return Err(EditError::OffsetOutOfBounds {
                offset,
                len: self.len,
            });
        }
        let mut base = 0;
        for (i, clip) in self.clips().enumerate() {
            if offset < base + clip.len() {
                return Ok((i, offset - base));
            }
            base += clip.len();
        }
        Ok((self.order.len(), 0))
    }

    /// Absolute offset of a clip-space location.
    #[must_use]
    pub fn offset_of(&self, clip_index: usize, clip_offset: usize) -> usize {
        self.clips().take(clip_index).map(Clip::len).sum::<usize>() + clip_offset
    }

    // -- Editing ------------------------------------------------------------

    /// Splice `clip` into the document at `(clip_index, clip_offset)`.
    ///
    /// When the location is inside a clip, that clip is cut first and the new
    /// clip goes between the halves. Returns the order index just past the
    /// inserted clip. Inserting an empty clip changes nothing and returns
    /// `clip_index`.
    ///
    /// # Errors
    ///
    /// [`EditError::OffsetOutOfBounds`] for an index past the end, or
    /// [`EditError::CutOutOfBounds`] for an offset outside the target clip.
    pub fn insert_clip(
        &mut self,
        clip_index: usize,
        clip_offset: usize,
        clip: Clip,
    ) -> EditResult<usize> {
        if clip.is_empty() {
            return Ok(clip_index);
        }
        if clip_index > self.order.len() {
            return Err(EditError::OffsetOutOfBounds {
                offset: clip_index,
                len: self.order.len(),
            });
        }
        let at = if clip_offset == 0 {
            clip_index
        } else {
            self.split_clip(clip_index, clip_offset)?
        };
        self.len += clip.len();
        self.modified = true;
        let id = self.alloc(clip);
        self.order.insert(at, id);
        trace!(at, clips = self.order.len(), "clip spliced");
        Ok(at + 1)
    }

    /// Append bytes to the clip at `clip_index` (an open append session).
    ///
    /// # Errors
    ///
    /// [`EditError::StaleAppendSession`] if there is no such clip.
    pub fn append_to(&mut self, clip_index: usize, bytes: &[u8]) -> EditResult<()> {
        let id = *self
            .order
            .get(clip_index)
            .ok_or(EditError::StaleAppendSession)?;
        self.arena[id.0].extend_from_slice(bytes);
        self.len += bytes.len();
        self.modified = true;
        Ok(())
    }

    /// Insert bytes at an absolute offset as a fresh clip.
    ///
    /// # Errors
    ///
    /// [`EditError::OffsetOutOfBounds`] if `offset > len`.
    pub fn insert(&mut self, offset: usize, bytes: &[u8]) -> EditResult<()> {
        let (i, o) = self.locate(offset)?;
        self.insert_clip(i, o, Clip::from_bytes(bytes.to_vec()))?;
        Ok(())
    }

    /// Remove `[start, end)` and return the removed bytes.
    ///
    /// Both ends are turned into clip boundaries, then the clips between
    /// them leave the order and their arena slots are recycled.
    ///
    /// # Errors
    ///
    /// [`EditError::OffsetOutOfBounds`] if `end > len` or `start > end`.
    pub fn remove(&mut self, start: usize, end: usize) -> EditResult<Vec<u8>> {
        if end > self.len || start > end {
            return Err(EditError::OffsetOutOfBounds {
                offset: end.max(start),
                len: self.len,
            });
        }
        if start == end {
            return Ok(Vec::new());
        }
        let first = self.boundary_at(start)?;
        let last = self.boundary_at(end)?;
        let mut removed = Vec::with_capacity(end - start);
        let ids: Vec<ClipId> = self.order.drain(first..last).collect();
        for id in ids {
            removed.extend(self.arena[id.0].take());
            self.free.push(id);
        }
        self.len -= removed.len();
        self.modified = true;
        trace!(start, end, clips = self.order.len(), "range removed");
        Ok(removed)
    }

    /// Insert `indent` at the start of `line`.
    ///
    /// # Errors
    ///
    /// [`EditError::LineOutOfRange`] if the line does not exist.
    pub fn indent_line(&mut self, line: usize, indent: &[u8]) -> EditResult<()> {
        let start = self.checked_line_start(line)?;
        self.insert(start, indent)
    }

    /// Remove one `indent` from the start of `line` if the line begins with
    /// it. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// [`EditError::LineOutOfRange`] if the line does not exist.
    pub fn unindent_line(&mut self, line: usize, indent: &[u8]) -> EditResult<bool> {
        let start = self.checked_line_start(line)?;
        let end = start + indent.len();
        if indent.is_empty() || end > self.len || self.slice(start, end) != indent {
            return Ok(false);
        }
        self.remove(start, end)?;
        Ok(true)
    }

    fn checked_line_start(&self, line: usize) -> EditResult<usize> {
        self.line_start(line).ok_or_else(|| EditError::LineOutOfRange {
            line,
            line_count: self.line_count(),
        })
    }

    // -- Search -------------------------------------------------------------

    /// Start of the first occurrence of `pattern` at or after `from`.
    #[must_use]
    pub fn find_forward(&self, pattern: &[u8], from: usize) -> Option<usize> {
        self.find_forward_where(pattern, from, |_| true)
    }

    /// Start of the last occurrence of `pattern` starting before `before`.
    #[must_use]
    pub fn find_backward(&self, pattern: &[u8], before: usize) -> Option<usize> {
        self.find_backward_where(pattern, before, |_| true)
    }

    /// Like [`find_forward`](Self::find_forward), skipping matches whose
    /// start `accept` rejects.
    ///
    /// Scans clip by clip, carrying the last `pattern.len() - 1` bytes over
    /// each boundary. Every byte is visited once per call.
    #[must_use]
    pub fn find_forward_where(
        &self,
        pattern: &[u8],
        from: usize,
        mut accept: impl FnMut(usize) -> bool,
    ) -> Option<usize> {
        if pattern.is_empty() || from >= self.len {
            return None;
        }
        let keep = pattern.len() - 1;
        let mut window: Vec<u8> = Vec::new();
        let mut window_start = from;
        let mut base = 0;
        for clip in self.clips() {
            let clip_end = base + clip.len();
            if clip_end > from {
                window.extend_from_slice(&clip.data()[from.saturating_sub(base)..]);
                let hit = window
                    .windows(pattern.len())
                    .enumerate()
                    .find(|&(i, w)| w == pattern && accept(window_start + i));
                if let Some((i, _)) = hit {
                    return Some(window_start + i);
                }
                let dropped = window.len().saturating_sub(keep);
                window.drain(..dropped);
                window_start += dropped;
            }
            base = clip_end;
        }
        None
    }

    /// Like [`find_backward`](Self::find_backward), skipping matches whose
    /// start `accept` rejects. Scans clips from the end.
    #[must_use]
    pub fn find_backward_where(
        &self,
        pattern: &[u8],
        before: usize,
        mut accept: impl FnMut(usize) -> bool,
    ) -> Option<usize> {
        if pattern.is_empty() || before == 0 {
            return None;
        }
        let limit = (before - 1 + pattern.len()).min(self.len);
        let keep = pattern.len() - 1;
        let mut window: Vec<u8> = Vec::new();
        let mut end = self.len;
        for clip in self.order.iter().rev().map(|id| &self.arena[id.0]) {
            let base = end - clip.len();
            if base < limit {
                let take = limit.min(end) - base;
                let mut joined = clip.data()[..take].to_vec();
                joined.append(&mut window);
                window = joined;
                let hit = window
                    .windows(pattern.len())
                    .enumerate()
                    .rev()
                    .find(|&(i, w)| w == pattern && accept(base + i));
                if let Some((i, _)) = hit {
                    return Some(base + i);
                }
                window.truncate(keep);
            }
            end = base;
        }
        None
    }

    // -- Metadata -----------------------------------------------------------

    /// True if the document changed since it was opened or last saved.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Record a successful save.
    #[inline]
    pub const fn mark_saved(&mut self) {
        self.modified = false;
    }

    // -- Arena --------------------------------------------------------------

    fn alloc(&mut self, clip: Clip) -> ClipId {
        if let Some(id) = self.free.pop() {
            self.arena[id.0] = clip;
            id
        } else {
            self.arena.push(clip);
            ClipId(self.arena.len() - 1)
        }
    }

    /// Cut the clip at `clip_index` at `clip_offset`; the right half goes
    /// into a new slot placed right after it. Returns the right half's index.
    fn split_clip(&mut self, clip_index: usize, clip_offset: usize) -> EditResult<usize> {
        let id = *self
            .order
            .get(clip_index)
            .ok_or(EditError::OffsetOutOfBounds {
                offset: clip_index,
                len: self.order.len(),
            })?;
        let right = self.arena[id.0].split_off(clip_offset)?;
        let right_id = self.alloc(right);
        self.order.insert(clip_index + 1, right_id);
        Ok(clip_index + 1)
    }

    /// Make `offset` a clip boundary and return the index of the clip that
    /// starts there (or the clip count at the end of the document).
    fn boundary_at(&mut self, offset: usize) -> EditResult<usize> {
        let (i, o) = self.locate(offset)?;
        if o == 0 {
            Ok(i)
        } else {
            self.split_clip(i, o)
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("clips", &self.order.len())
            .field("lines", &self.line_count())
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
