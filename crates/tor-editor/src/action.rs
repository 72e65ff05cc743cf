//! Actions — the record of one logical edit.
//!
//! An [`Action`] pairs an [`Edit`] payload with full session snapshots taken
//! before and after it ran. Snapshots are copies, so later buffer mutation
//! never invalidates a recorded action.

use std::fmt;

use crate::cursor::CursorState;
use crate::selection::Selection;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// The seven kinds of undoable edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Insert,
    Delete,
    Backspace,
    Paste,
    InsertTab,
    RemoveTab,
    DeleteSelection,
}

impl ActionKind {
    /// Name used in status messages and the history dump.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Backspace => "backspace",
            Self::Paste => "paste",
            Self::InsertTab => "insertTab",
            Self::RemoveTab => "removeTab",
            Self::DeleteSelection => "deleteSelection",
        }
    }

    /// Kinds whose consecutive runs merge into one history entry.
    #[must_use]
    pub const fn coalesces(self) -> bool {
        matches!(self, Self::Insert | Self::Delete | Self::Backspace)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// What an action changed.
///
/// Text kinds carry the exact bytes affected, in document order. Tab kinds
/// carry the lines that were actually changed and the indent unit used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Insert(Vec<u8>),
    Delete(Vec<u8>),
    Backspace(Vec<u8>),
    Paste(Vec<u8>),
    DeleteSelection(Vec<u8>),
    InsertTab { lines: Vec<usize>, indent: Vec<u8> },
    RemoveTab { lines: Vec<usize>, indent: Vec<u8> },
}

impl Edit {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Insert(_) => ActionKind::Insert,
            Self::Delete(_) => ActionKind::Delete,
            Self::Backspace(_) => ActionKind::Backspace,
            Self::Paste(_) => ActionKind::Paste,
            Self::DeleteSelection(_) => ActionKind::DeleteSelection,
            Self::InsertTab { .. } => ActionKind::InsertTab,
            Self::RemoveTab { .. } => ActionKind::RemoveTab,
        }
    }

    /// The affected bytes for text kinds.
    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Self::Insert(v)
            | Self::Delete(v)
            | Self::Backspace(v)
            | Self::Paste(v)
            | Self::DeleteSelection(v) => Some(v),
            Self::InsertTab { .. } | Self::RemoveTab { .. } => None,
        }
    }

    /// The changed lines for tab kinds.
    #[must_use]
    pub fn lines(&self) -> Option<&[usize]> {
        match self {
            Self::InsertTab { lines, .. } | Self::RemoveTab { lines, .. } => Some(lines),
            _ => None,
        }
    }

    /// True when the edit changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::InsertTab { lines, .. } | Self::RemoveTab { lines, .. } => lines.is_empty(),
            Self::Insert(v)
            | Self::Delete(v)
            | Self::Backspace(v)
            | Self::Paste(v)
            | Self::DeleteSelection(v) => v.is_empty(),
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Everything needed to put the session back where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub cursor: CursorState,
    pub selection: Selection,
}

/// One logical edit plus the session state around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub edit: Edit,
    pub before: SessionState,
    pub after: SessionState,
}

impl Action {
    #[must_use]
    pub const fn new(edit: Edit, before: SessionState, after: SessionState) -> Self {
        Self {
            edit,
            before,
            after,
        }
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.edit.kind()
    }

    /// Merge a later action of the same coalescing kind into this one.
    ///
    /// Inserts and deletes append the new bytes; backspaces prepend them.
    /// The merged entry keeps this action's `before` and takes the later
    /// `after`. Returns the later action back if the kinds do not merge.
    pub(crate) fn absorb(&mut self, next: Self) -> Result<(), Self> {
        match (&mut self.edit, next.edit) {
            (Edit::Insert(value), Edit::Insert(more)) | (Edit::Delete(value), Edit::Delete(more)) => {
                value.extend_from_slice(&more);
            }
            (Edit::Backspace(value), Edit::Backspace(mut more)) => {
                more.extend_from_slice(value);
                *value = more;
            }
            (_, edit) => {
                return Err(Self { edit, ..next });
            }
        }
        self.after = next.after;
        Ok(())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.edit {
            Edit::InsertTab { lines, .. } | Edit::RemoveTab { lines, .. } => {
                write!(f, "{} {lines:?}", self.kind())?;
            }
            edit => {
                let value = edit.value().unwrap_or_default();
                write!(f, "{} {:?}", self.kind(), String::from_utf8_lossy(value))?;
            }
        }
        write!(
            f,
            " ({} -> {})",
            self.before.cursor.offset, self.after.cursor.offset
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(offset: usize) -> SessionState {
        SessionState {
            cursor: CursorState {
                offset,
                sticky_col: offset,
            },
            selection: Selection::new(),
        }
    }

    fn text(edit: fn(Vec<u8>) -> Edit, value: &str, before: usize, after: usize) -> Action {
        Action::new(edit(value.as_bytes().to_vec()), state(before), state(after))
    }

    #[test]
    fn kind_names() {
        assert_eq!(ActionKind::InsertTab.to_string(), "insertTab");
        assert_eq!(ActionKind::DeleteSelection.to_string(), "deleteSelection");
        assert!(ActionKind::Backspace.coalesces());
        assert!(!ActionKind::Paste.coalesces());
    }

    #[test]
    fn absorb_insert_appends() {
        let mut a = text(Edit::Insert, "foo", 0, 3);
        a.absorb(text(Edit::Insert, "bar", 3, 6)).unwrap();
        assert_eq!(a.edit, Edit::Insert(b"foobar".to_vec()));
        assert_eq!(a.before, state(0));
        assert_eq!(a.after, state(6));
    }

    #[test]
    fn absorb_backspace_prepends() {
        let mut a = text(Edit::Backspace, "c", 3, 2);
        a.absorb(text(Edit::Backspace, "b", 2, 1)).unwrap();
        assert_eq!(a.edit, Edit::Backspace(b"bc".to_vec()));
        assert_eq!(a.after, state(1));
    }

    #[test]
    fn absorb_rejects_other_kinds() {
        let mut a = text(Edit::Insert, "a", 0, 1);
        let back = a.absorb(text(Edit::Delete, "b", 1, 1)).unwrap_err();
        assert_eq!(back.kind(), ActionKind::Delete);
        assert_eq!(a.edit, Edit::Insert(b"a".to_vec()));
    }

    #[test]
    fn empty_edits() {
        assert!(Edit::Delete(Vec::new()).is_empty());
        assert!(!Edit::Delete(b"x".to_vec()).is_empty());
        let tab = Edit::RemoveTab {
            lines: Vec::new(),
            indent: b"\t".to_vec(),
        };
        assert!(tab.is_empty());
    }

    #[test]
    fn display() {
        assert_eq!(
            text(Edit::Insert, "a\tb", 0, 3).to_string(),
            r#"insert "a\tb" (0 -> 3)"#
        );
        let tab = Action::new(
            Edit::InsertTab {
                lines: vec![1, 2],
                indent: b"\t".to_vec(),
            },
            state(4),
            state(5),
        );
        assert_eq!(tab.to_string(), "insertTab [1, 2] (4 -> 5)");
    }
}
