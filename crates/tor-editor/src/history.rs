//! Undo/redo history — a log of actions split by a head index.
//!
//! Entries `[0, head)` are applied; `[head, len)` are redoable. Recording a
//! new action first cuts the redoable tail, then appends at `head`.
//!
//! # Coalescing
//!
//! An insert, delete or backspace directly following an action of the same
//! kind, with nothing else in between, merges into the previous entry
//! instead of opening a new one (see [`Action::absorb`]). Anything that is
//! not an edit of that kind ends the run: the session calls
//! [`History::interrupt`] for every other request, and undo, redo and a
//! non-empty cut end it too.
//!
//! # Failures
//!
//! Undo and redo check the live buffer against what the entry recorded. A
//! recorded line that no longer exists, or bytes that differ from the
//! recorded value, mean the history and the buffer have diverged. Those are
//! reported as [`EditError`]s before anything is changed: the buffer is left
//! as it was and the head does not move.

use std::fmt::Write as _;

use tracing::debug;

use crate::action::{Action, ActionKind, Edit};
use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::error::{EditError, EditResult};
use crate::selection::Selection;

/// Undo/redo log for one buffer.
#[derive(Debug, Clone, Default)]
pub struct History {
    actions: Vec<Action>,
    head: usize,
    /// Kind of the last recorded action while its run is still open.
    last: Option<ActionKind>,
}

impl History {
    /// An empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
            head: 0,
            last: None,
        }
    }

    // -- Queries ------------------------------------------------------------

    /// Number of applied entries.
    #[inline]
    #[must_use]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Total number of entries, applied or redoable.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[Action] {
        &self.actions
    }

    /// The entry at `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    #[inline]
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.head > 0
    }

    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.head < self.actions.len()
    }

    // -- Recording ----------------------------------------------------------

    /// Drop every entry at or after `at`. Returns how many were dropped. A
    /// non-empty cut ends the current coalescing run.
    pub fn cut(&mut self, at: usize) -> usize {
        let dropped = self.actions.len().saturating_sub(at);
        if dropped > 0 {
            self.actions.truncate(at);
            self.head = self.head.min(at);
            self.last = None;
        }
        dropped
    }

    /// End the current coalescing run.
    pub const fn interrupt(&mut self) {
        self.last = None;
    }

    /// Record an applied action, merging it into the previous entry when it
    /// continues an open run of the same kind.
    pub fn record(&mut self, action: Action) {
        self.cut(self.head);
        let kind = action.kind();
        let action = match self.actions.last_mut() {
            Some(prev) if kind.coalesces() && self.last == Some(kind) => match prev.absorb(action) {
                Ok(()) => {
                    debug!(%kind, head = self.head, "history coalesced");
                    return;
                }
                Err(action) => action,
            },
            _ => action,
        };
        self.actions.push(action);
        self.head += 1;
        self.last = Some(kind);
        debug!(%kind, head = self.head, "history recorded");
    }

    // -- Undo / redo --------------------------------------------------------

    /// Revert the entry before `head` and leave the session at its `before`
    /// snapshot. Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Fails if the buffer no longer matches the entry.
    pub fn undo(
        &mut self,
        buf: &mut Buffer,
        cursor: &mut Cursor,
        sel: &mut Selection,
    ) -> EditResult<bool> {
        if self.head == 0 {
            return Ok(false);
        }
        self.last = None;
        let action = &self.actions[self.head - 1];
        revert(action, buf, cursor)?;
        cursor.restore(buf, action.before.cursor);
        *sel = action.before.selection;
        self.head -= 1;
        debug!(kind = %action.kind(), head = self.head, "undo");
        Ok(true)
    }

    /// Re-apply the entry at `head` and leave the session at its `after`
    /// snapshot. Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Fails if the buffer no longer matches the entry.
    pub fn redo(
        &mut self,
        buf: &mut Buffer,
        cursor: &mut Cursor,
        sel: &mut Selection,
    ) -> EditResult<bool> {
        if self.head == self.actions.len() {
            return Ok(false);
        }
        self.last = None;
        let action = &self.actions[self.head];
        replay(action, buf, cursor)?;
        cursor.restore(buf, action.after.cursor);
        *sel = action.after.selection;
        self.head += 1;
        debug!(kind = %action.kind(), head = self.head, "redo");
        Ok(true)
    }

    // -- Diagnostics --------------------------------------------------------

    /// The whole log as text, one entry per line, then the head index.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, action) in self.actions.iter().enumerate() {
            let _ = writeln!(out, "{i}: {action}");
        }
        let _ = write!(out, "head: {}", self.head);
        out
    }
}

// ---------------------------------------------------------------------------
// Inverse and forward application
// ---------------------------------------------------------------------------

fn revert(action: &Action, buf: &mut Buffer, cursor: &mut Cursor) -> EditResult<()> {
    let after = action.after.cursor.offset;
    match &action.edit {
        Edit::Insert(value) | Edit::Paste(value) => {
            let start = after.checked_sub(value.len()).ok_or(EditError::OffsetOutOfBounds {
                offset: value.len(),
                len: after,
            })?;
            expect_bytes(buf, start, value)?;
            cursor.restore(buf, action.after.cursor);
            cursor.remove_backward(buf, value.len())?;
        }
        Edit::Delete(value) | Edit::Backspace(value) | Edit::DeleteSelection(value) => {
            cursor.restore(buf, action.after.cursor);
            cursor.insert(buf, value)?;
        }
        Edit::InsertTab { lines, indent } => strip_indent(buf, lines, indent)?,
        Edit::RemoveTab { lines, indent } => add_indent(buf, lines, indent)?,
    }
    Ok(())
}

fn replay(action: &Action, buf: &mut Buffer, cursor: &mut Cursor) -> EditResult<()> {
    match &action.edit {
        Edit::Insert(value) | Edit::Paste(value) => {
            cursor.restore(buf, action.before.cursor);
            cursor.insert(buf, value)?;
        }
        Edit::Delete(value) | Edit::Backspace(value) | Edit::DeleteSelection(value) => {
            expect_bytes(buf, action.after.cursor.offset, value)?;
            cursor.restore(buf, action.after.cursor);
            cursor.remove_forward(buf, value.len())?;
        }
        Edit::InsertTab { lines, indent } => add_indent(buf, lines, indent)?,
        Edit::RemoveTab { lines, indent } => strip_indent(buf, lines, indent)?,
    }
    Ok(())
}

/// Fail unless the buffer holds exactly `value` at `start`.
fn expect_bytes(buf: &Buffer, start: usize, value: &[u8]) -> EditResult<()> {
    let end = start + value.len();
    if end > buf.len() {
        return Err(EditError::OffsetOutOfBounds {
            offset: end,
            len: buf.len(),
        });
    }
    let found = buf.slice(start, end);
    if found != value {
        return Err(EditError::mismatch(value, &found));
    }
    Ok(())
}

fn add_indent(buf: &mut Buffer, lines: &[usize], indent: &[u8]) -> EditResult<()> {
    check_lines(buf, lines)?;
    for &line in lines {
        buf.indent_line(line, indent)?;
    }
    Ok(())
}

fn strip_indent(buf: &mut Buffer, lines: &[usize], indent: &[u8]) -> EditResult<()> {
    check_lines(buf, lines)?;
    for &line in lines {
        let found = buf.line(line).unwrap_or_default();
        if !found.starts_with(indent) {
            let prefix = &found[..indent.len().min(found.len())];
            return Err(EditError::mismatch(indent, prefix));
        }
    }
    for &line in lines {
        if !buf.unindent_line(line, indent)? {
            return Err(EditError::mismatch(indent, b""));
        }
    }
    Ok(())
}

/// Every recorded line must exist before any of them is touched.
fn check_lines(buf: &Buffer, lines: &[usize]) -> EditResult<()> {
    match lines.iter().find(|&&line| buf.line_start(line).is_none()) {
        Some(&line) => Err(EditError::LineOutOfRange {
            line,
            line_count: buf.line_count(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::SessionState;
    use pretty_assertions::assert_eq;

    struct Doc {
        buf: Buffer,
        cursor: Cursor,
        sel: Selection,
        history: History,
    }

    impl Doc {
        fn new(text: &str) -> Self {
            Self {
                buf: Buffer::from_text(text),
                cursor: Cursor::new(4),
                sel: Selection::new(),
                history: History::new(),
            }
        }

        fn state(&self) -> SessionState {
            SessionState {
                cursor: self.cursor.snapshot(),
                selection: self.sel,
            }
        }

        fn record(&mut self, before: SessionState, edit: Edit) {
            let after = self.state();
            self.history.record(Action::new(edit, before, after));
        }

        fn insert(&mut self, text: &str) {
            let before = self.state();
            self.cursor.insert(&mut self.buf, text.as_bytes()).unwrap();
            self.record(before, Edit::Insert(text.as_bytes().to_vec()));
        }

        fn delete(&mut self) {
            let before = self.state();
            let removed = self.cursor.delete(&mut self.buf).unwrap();
            self.record(before, Edit::Delete(removed));
        }

        fn backspace(&mut self) {
            let before = self.state();
            let removed = self.cursor.backspace(&mut self.buf).unwrap();
            self.record(before, Edit::Backspace(removed));
        }

        fn undo(&mut self) -> bool {
            self.history
                .undo(&mut self.buf, &mut self.cursor, &mut self.sel)
                .unwrap()
        }

        fn redo(&mut self) -> bool {
            self.history
                .redo(&mut self.buf, &mut self.cursor, &mut self.sel)
                .unwrap()
        }

        fn text(&self) -> String {
            self.buf.contents()
        }
    }

    // -- Coalescing ---------------------------------------------------------

    #[test]
    fn foo_bar_is_one_entry() {
        let mut doc = Doc::new("");
        doc.insert("foo");
        doc.insert("bar");
        assert_eq!(doc.history.len(), 1);
        assert_eq!(doc.history.at(0).unwrap().edit, Edit::Insert(b"foobar".to_vec()));
        assert!(doc.undo());
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn typing_n_runes_is_one_entry() {
        let mut doc = Doc::new("");
        for ch in "héllo 中".chars() {
            doc.insert(&ch.to_string());
        }
        assert_eq!(doc.history.len(), 1);
        let value = doc.history.at(0).unwrap().edit.value().unwrap().to_vec();
        assert_eq!(String::from_utf8(value).unwrap().chars().count(), 7);
        doc.undo();
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn interrupt_splits_runs() {
        let mut doc = Doc::new("");
        doc.insert("a");
        doc.history.interrupt();
        doc.insert("b");
        assert_eq!(doc.history.len(), 2);
    }

    #[test]
    fn different_kind_splits_runs() {
        let mut doc = Doc::new("");
        doc.insert("ab");
        doc.backspace();
        doc.insert("c");
        assert_eq!(doc.history.len(), 3);
        assert_eq!(doc.text(), "ac");
    }

    #[test]
    fn delete_run_appends() {
        let mut doc = Doc::new("abcd");
        doc.cursor.seek(&doc.buf, 1);
        doc.delete();
        doc.delete();
        assert_eq!(doc.history.len(), 1);
        assert_eq!(doc.history.at(0).unwrap().edit, Edit::Delete(b"bc".to_vec()));
        doc.undo();
        assert_eq!(doc.text(), "abcd");
        assert_eq!(doc.cursor.offset(), 1);
    }

    #[test]
    fn backspace_run_prepends() {
        let mut doc = Doc::new("abcd");
        doc.cursor.seek(&doc.buf, 3);
        doc.backspace();
        doc.backspace();
        assert_eq!(doc.history.at(0).unwrap().edit, Edit::Backspace(b"bc".to_vec()));
        assert_eq!(doc.history.at(0).unwrap().before.cursor.offset, 3);
        doc.undo();
        assert_eq!(doc.text(), "abcd");
        assert_eq!(doc.cursor.offset(), 3);
    }

    // -- Undo / redo --------------------------------------------------------

    #[test]
    fn undo_redo_at_limits_are_noops() {
        let mut doc = Doc::new("x");
        assert!(!doc.undo());
        assert!(!doc.redo());
        assert_eq!(doc.text(), "x");
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let mut doc = Doc::new("hello");
        doc.cursor.seek(&doc.buf, 5);
        doc.insert(" world");
        let text = doc.text();
        let state = doc.state();

        doc.undo();
        assert_eq!(doc.text(), "hello");
        assert_eq!(doc.cursor.offset(), 5);
        doc.redo();
        assert_eq!(doc.text(), text);
        assert_eq!(doc.state(), state);
        assert_eq!(doc.history.head(), 1);
    }

    #[test]
    fn recording_after_undo_cuts_redo_tail() {
        let mut doc = Doc::new("");
        doc.insert("a");
        doc.history.interrupt();
        doc.insert("b");
        doc.undo();
        doc.insert("c");
        assert_eq!(doc.history.len(), 2);
        assert!(!doc.history.can_redo());
        assert_eq!(doc.text(), "ac");
    }

    #[test]
    fn insert_after_undo_never_merges_into_older_entry() {
        let mut doc = Doc::new("");
        doc.insert("a");
        doc.undo();
        doc.insert("b");
        assert_eq!(doc.history.len(), 1);
        assert_eq!(doc.history.at(0).unwrap().edit, Edit::Insert(b"b".to_vec()));
    }

    #[test]
    fn undo_tab_uses_recorded_lines() {
        let mut doc = Doc::new("a\nb");
        doc.cursor.seek(&doc.buf, 2);
        let before = doc.state();
        let lines = doc.cursor.tab(&mut doc.buf, None, b"\t").unwrap();
        doc.record(
            before,
            Edit::InsertTab {
                lines,
                indent: b"\t".to_vec(),
            },
        );
        assert_eq!(doc.text(), "a\n\tb");
        doc.undo();
        assert_eq!(doc.text(), "a\nb");
        assert_eq!(doc.cursor.offset(), 2);
        doc.redo();
        assert_eq!(doc.text(), "a\n\tb");
        assert_eq!(doc.cursor.offset(), 3);
    }

    // -- Divergence ---------------------------------------------------------

    #[test]
    fn undo_insert_with_changed_text_fails() {
        let mut doc = Doc::new("");
        doc.insert("abc");
        doc.buf.remove(0, 3).unwrap();
        doc.buf.insert(0, b"xyz").unwrap();
        let err = doc
            .history
            .undo(&mut doc.buf, &mut doc.cursor, &mut doc.sel)
            .unwrap_err();
        assert_eq!(
            err,
            EditError::ValueMismatch {
                expected: "abc".into(),
                found: "xyz".into()
            }
        );
        assert_eq!(doc.history.head(), 1);
        assert_eq!(doc.text(), "xyz");
    }

    #[test]
    fn undo_tab_on_missing_line_fails() {
        let mut doc = Doc::new("a\nb");
        let before = doc.state();
        doc.record(
            before,
            Edit::RemoveTab {
                lines: vec![5],
                indent: b"\t".to_vec(),
            },
        );
        let err = doc
            .history
            .undo(&mut doc.buf, &mut doc.cursor, &mut doc.sel)
            .unwrap_err();
        assert_eq!(
            err,
            EditError::LineOutOfRange {
                line: 5,
                line_count: 2
            }
        );
    }

    #[test]
    fn failed_tab_undo_leaves_every_line_alone() {
        let mut doc = Doc::new("a\nb");
        let before = doc.state();
        let lines = vec![0, 1];
        for &line in &lines {
            doc.buf.indent_line(line, b"\t").unwrap();
        }
        doc.record(
            before,
            Edit::InsertTab {
                lines,
                indent: b"\t".to_vec(),
            },
        );
        assert_eq!(doc.text(), "\ta\n\tb");

        // line 1 loses its tab outside the history
        doc.buf.unindent_line(1, b"\t").unwrap();
        let err = doc
            .history
            .undo(&mut doc.buf, &mut doc.cursor, &mut doc.sel)
            .unwrap_err();
        assert_eq!(
            err,
            EditError::ValueMismatch {
                expected: "\t".into(),
                found: "b".into()
            }
        );
        assert_eq!(doc.history.head(), 1);
        assert_eq!(doc.text(), "\ta\nb");
    }

    #[test]
    fn failed_untab_undo_checks_lines_first() {
        let mut doc = Doc::new("a\nb");
        let before = doc.state();
        doc.record(
            before,
            Edit::RemoveTab {
                lines: vec![0, 7],
                indent: b"\t".to_vec(),
            },
        );
        assert!(doc
            .history
            .undo(&mut doc.buf, &mut doc.cursor, &mut doc.sel)
            .is_err());
        assert_eq!(doc.text(), "a\nb");
    }

    // -- Cut / dump ---------------------------------------------------------

    #[test]
    fn cut_reports_dropped_entries() {
        let mut doc = Doc::new("");
        doc.insert("a");
        doc.history.interrupt();
        doc.insert("b");
        assert_eq!(doc.history.cut(2), 0);
        assert_eq!(doc.history.cut(1), 1);
        assert_eq!(doc.history.head(), 1);
    }

    #[test]
    fn dump_lists_entries_and_head() {
        let mut doc = Doc::new("");
        doc.insert("hi");
        doc.history.interrupt();
        doc.backspace();
        doc.undo();
        assert_eq!(
            doc.history.dump(),
            "0: insert \"hi\" (0 -> 2)\n1: backspace \"i\" (2 -> 1)\nhead: 1"
        );
    }
}
