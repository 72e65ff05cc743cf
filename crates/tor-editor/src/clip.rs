//! Clip — the buffer's unit of storage.
//!
//! A clip is a contiguous run of raw bytes plus the sorted offsets (relative
//! to the clip start) of every `\n` inside it. The newline index is carried
//! along through every edit instead of being rescanned:
//!
//! - [`Clip::split_off`] partitions it at the cut point and rebases the right
//!   half.
//! - [`Clip::pop_first`] / [`Clip::pop_last`] drop or rebase entries.
//! - [`Clip::append_char`] / [`Clip::extend_from_slice`] push new entries at
//!   the pre-append length.
//!
//! Invariants: offsets are strictly increasing and each one points at a
//! `\n` byte of `data`.

use std::fmt;

use crate::error::{EditError, EditResult};
use crate::utf8;

/// A byte run with its own newline index.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Clip {
    data: Vec<u8>,
    newlines: Vec<usize>,
}

impl Clip {
    /// An empty clip.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            newlines: Vec::new(),
        }
    }

    /// Build a clip from raw bytes, indexing its newlines once.
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let newlines = newline_offsets(&data);
        Self { data, newlines }
    }

    /// A clip holding one rune.
    #[must_use]
    pub fn from_char(ch: char) -> Self {
        let mut clip = Self::new();
        clip.append_char(ch);
        clip
    }

    // -- Access ---------------------------------------------------------------

    /// Byte length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the clip holds no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The raw bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Offsets of every `\n`, relative to the clip start.
    #[inline]
    #[must_use]
    pub fn newlines(&self) -> &[usize] {
        &self.newlines
    }

    /// Number of newlines strictly before `offset`.
    #[inline]
    #[must_use]
    pub fn newlines_before(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&n| n < offset)
    }

    // -- Splitting ------------------------------------------------------------

    /// Split at `offset`, keeping `[0, offset)` in `self` and returning
    /// `[offset, len)`.
    ///
    /// A newline sitting exactly at the cut point belongs to the right side.
    /// The left side keeps the smaller offsets untouched; the right side's
    /// offsets are shifted by `-offset`.
    ///
    /// # Errors
    ///
    /// [`EditError::CutOutOfBounds`] if `offset > len`. `self` is left
    /// untouched in that case.
    pub fn split_off(&mut self, offset: usize) -> EditResult<Self> {
        if offset > self.data.len() {
            return Err(EditError::CutOutOfBounds {
                offset,
                len: self.data.len(),
            });
        }
        let at = self.newlines_before(offset);
        let right_newlines = self.newlines.split_off(at);
        let right = Self {
            data: self.data.split_off(offset),
            newlines: right_newlines.into_iter().map(|n| n - offset).collect(),
        };
        Ok(right)
    }

    /// Split into `(left, right)` at `offset`. See [`split_off`](Self::split_off).
    ///
    /// # Errors
    ///
    /// [`EditError::CutOutOfBounds`] if `offset > len`.
    pub fn cut(mut self, offset: usize) -> EditResult<(Self, Self)> {
        let right = self.split_off(offset)?;
        Ok((self, right))
    }

    // -- Rune edits -----------------------------------------------------------

    /// Remove and return the first rune.
    ///
    /// # Errors
    ///
    /// [`EditError::EmptyClip`] when there is nothing to pop.
    pub fn pop_first(&mut self) -> EditResult<char> {
        let (ch, len) = utf8::decode_first(&self.data).ok_or(EditError::EmptyClip)?;
        self.data.drain(..len);
        self.newlines.retain(|&n| n >= len);
        for n in &mut self.newlines {
            *n -= len;
        }
        Ok(ch)
    }

    /// Remove and return the last rune.
    ///
    /// # Errors
    ///
    /// [`EditError::EmptyClip`] when there is nothing to pop.
    pub fn pop_last(&mut self) -> EditResult<char> {
        let (ch, len) = utf8::decode_last(&self.data).ok_or(EditError::EmptyClip)?;
        let keep = self.data.len() - len;
        self.data.truncate(keep);
        self.newlines.retain(|&n| n < keep);
        Ok(ch)
    }

    /// Append one rune, indexing it if it is a newline.
    pub fn append_char(&mut self, ch: char) {
        if ch == '\n' {
            self.newlines.push(self.data.len());
        }
        let mut encoded = [0u8; 4];
        self.data
            .extend_from_slice(ch.encode_utf8(&mut encoded).as_bytes());
    }

    /// Append raw bytes, indexing any newlines among them.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        let base = self.data.len();
        self.newlines
            .extend(newline_offsets(bytes).into_iter().map(|n| n + base));
        self.data.extend_from_slice(bytes);
    }

    /// Take the bytes out, leaving the clip empty.
    pub(crate) fn take(&mut self) -> Vec<u8> {
        self.newlines.clear();
        std::mem::take(&mut self.data)
    }
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("data", &String::from_utf8_lossy(&self.data))
            .field("newlines", &self.newlines)
            .finish()
    }
}

/// Offsets of every `\n` byte in `bytes`.
#[must_use]
pub fn newline_offsets(bytes: &[u8]) -> Vec<usize> {
    bytes
        .iter()
        .enumerate()
        .filter_map(|(i, &b)| (b == b'\n').then_some(i))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
