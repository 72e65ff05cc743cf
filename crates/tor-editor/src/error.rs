//! Invariant violations raised by the editing core.
//!
//! Every variant here means the buffer, a cursor, or the history has been
//! asked to do something that cannot happen under correct usage. Callers
//! must stop the current operation rather than continue editing: carrying
//! on risks corrupting the user's document.
//!
//! Ordinary "nothing happened" outcomes (no search match, undo with an
//! empty history, no matching bracket) are **not** errors. Those surface as
//! `bool`, `Option`, or empty results on the operation itself.

use thiserror::Error;

/// A violated invariant of the clip store, cursor, or history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// `Clip::cut` was asked to split outside `[0, len]`.
    #[error("cut offset {offset} is outside clip of length {len}")]
    CutOutOfBounds { offset: usize, len: usize },

    /// `pop_first` / `pop_last` on a clip with no bytes.
    #[error("cannot pop a rune from an empty clip")]
    EmptyClip,

    /// A byte offset beyond the end of the buffer.
    #[error("offset {offset} is outside buffer of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// A history entry names a line that no longer exists.
    #[error("history line {line} is out of range ({line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    /// A history entry's text does not match the live buffer content.
    #[error("history value mismatch: expected {expected:?}, found {found:?}")]
    ValueMismatch { expected: String, found: String },

    /// The clip an append session was extending is no longer in place.
    #[error("append session no longer points at its clip")]
    StaleAppendSession,
}

impl EditError {
    /// Build a [`EditError::ValueMismatch`] from raw bytes, decoded lossily
    /// for display.
    #[must_use]
    pub fn mismatch(expected: &[u8], found: &[u8]) -> Self {
        Self::ValueMismatch {
            expected: String::from_utf8_lossy(expected).into_owned(),
            found: String::from_utf8_lossy(found).into_owned(),
        }
    }
}

/// Result alias used across the editing core.
pub type EditResult<T> = Result<T, EditError>;
