//! Session — one open document and everything editing it.
//!
//! The session owns the buffer, the cursor, the selection, the undo history,
//! the clipboard register and the find prompt. The input layer feeds it
//! [`Request`]s through [`Session::apply`]; the file layer asks it for bytes
//! to save and reports back with [`Session::mark_saved`] or
//! [`Session::save_failed`].
//!
//! # Undo runs
//!
//! Every request that changes the document is recorded as one history
//! entry. Consecutive inserts, deletes or backspaces merge into the open
//! entry; any other request closes the run.
//!
//! # Selection tracking
//!
//! While the selection is on, its live end follows the cursor after every
//! request except undo and redo, which restore a recorded selection as-is.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::action::{Action, Edit, SessionState};
use crate::buffer::{Buffer, LineEnding};
use crate::config::{Config, NavigationConfig};
use crate::cursor::Cursor;
use crate::error::EditResult;
use crate::history::History;
use crate::mode::Mode;
use crate::register::Register;
use crate::request::{Motion, Request};
use crate::search::{FindState, SearchDirection};
use crate::selection::Selection;

/// What the caller should do after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// Write the buffer out, then report with `mark_saved` / `save_failed`.
    Save,
    Quit,
}

/// Editing settings taken from [`Config`] when the document is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tab_width: usize,
    pub indent: Vec<u8>,
    pub line_ending: LineEnding,
    pub page_lines: usize,
    pub navigation: NavigationConfig,
}

impl Settings {
    /// Resolve `config` for a document opened from `bytes`.
    #[must_use]
    pub fn from_config(config: &Config, bytes: &[u8]) -> Self {
        Self {
            tab_width: config.effective_tab_width(),
            indent: config.indent.as_bytes().to_vec(),
            line_ending: config.line_ending.resolve(bytes),
            page_lines: config.page_lines,
            navigation: config.navigation.clone(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default(), b"")
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An open document.
pub struct Session {
    name: String,
    buf: Buffer,
    cursor: Cursor,
    selection: Selection,
    history: History,
    register: Register,
    find: FindState,
    mode: Mode,
    move_mode: bool,
    settings: Settings,
    /// Unsaved edits exist.
    edited: bool,
    /// A message shown instead of the computed status until the next
    /// request or idle tick.
    held: Option<String>,
}

impl Session {
    /// Open `bytes` under the display name `name`.
    #[must_use]
    pub fn open(name: impl Into<String>, bytes: Vec<u8>, config: &Config) -> Self {
        let settings = Settings::from_config(config, &bytes);
        let buf = Buffer::open(bytes);
        let cursor = Cursor::at(&buf, 0, settings.tab_width);
        let name = name.into();
        debug!(%name, len = buf.len(), lines = buf.line_count(), ending = %settings.line_ending, "session opened");
        Self {
            name,
            buf,
            cursor,
            selection: Selection::new(),
            history: History::new(),
            register: Register::new(),
            find: FindState::new(),
            mode: Mode::Normal,
            move_mode: false,
            settings,
            edited: false,
            held: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buf
    }

    #[must_use]
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub const fn register(&self) -> &Register {
        &self.register
    }

    #[must_use]
    pub const fn find(&self) -> &FindState {
        &self.find
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn is_move_mode(&self) -> bool {
        self.move_mode
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True when there are edits since open or the last save.
    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.edited
    }

    /// The document bytes to write out.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.buf.to_bytes()
    }

    /// The undo log as text.
    #[must_use]
    pub fn history_dump(&self) -> String {
        self.history.dump()
    }

    // -- Status -------------------------------------------------------------

    /// The status line.
    #[must_use]
    pub fn status(&self) -> String {
        match self.mode {
            Mode::ConfirmQuit => "Buffer modified. Do you really want to quit? (y/n)".into(),
            Mode::GotoLine => "goto : ".into(),
            Mode::Find => format!("find({}) : {}", self.find.direction(), self.find.query()),
            Mode::Normal => {
                if let Some(held) = &self.held {
                    return held.clone();
                }
                let move_mode = if self.move_mode { " (move mode)" } else { "" };
                if self.selection.is_on() {
                    let (start, end) = (self.selection.start(), self.selection.end());
                    format!(
                        "{}{move_mode}    selection on : ({}, {}) - ({}, {})",
                        self.name,
                        start.line + 1,
                        start.byte,
                        end.line + 1,
                        end.byte
                    )
                } else {
                    format!(
                        "{}{move_mode}    linenum:{}, byteoff:{}, visoff:{}, cursoroff:{}",
                        self.name,
                        self.cursor.line() + 1,
                        self.cursor.byte(),
                        self.cursor.visual_col(),
                        self.cursor.offset()
                    )
                }
            }
        }
    }

    /// The periodic tick: a held status message expires.
    pub fn on_idle(&mut self) {
        if self.held.take().is_some() {
            trace!("held status cleared");
        }
    }

    fn hold(&mut self, message: String) {
        self.held = Some(message);
    }

    // -- Saving -------------------------------------------------------------

    /// The file layer wrote [`contents`](Self::contents) successfully.
    pub fn mark_saved(&mut self) {
        self.buf.mark_saved();
        self.edited = false;
        self.hold(format!("successfully saved : {}", self.name));
        debug!(name = %self.name, "saved");
    }

    /// The file layer failed to write. The session keeps its edits.
    pub fn save_failed(&mut self, err: &dyn fmt::Display) {
        warn!(name = %self.name, %err, "save failed");
        self.hold(format!("save failed : {err}"));
    }

    // -- Requests -----------------------------------------------------------

    /// Apply one request.
    ///
    /// # Errors
    ///
    /// An [`EditError`](crate::error::EditError) means an invariant broke;
    /// the caller must stop editing this document.
    pub fn apply(&mut self, request: Request) -> EditResult<Outcome> {
        trace!(%request, mode = %self.mode, "apply");
        self.held = None;

        if self.mode == Mode::ConfirmQuit {
            return Ok(self.answer_quit(&request));
        }

        match request {
            Request::Undo => {
                if self.history.undo(&mut self.buf, &mut self.cursor, &mut self.selection)? {
                    self.edited = true;
                }
                return Ok(Outcome::Continue);
            }
            Request::Redo => {
                if self.history.redo(&mut self.buf, &mut self.cursor, &mut self.selection)? {
                    self.edited = true;
                }
                return Ok(Outcome::Continue);
            }
            _ => {}
        }

        let outcome = if request.is_edit() {
            let mut before = self.state();
            let edit = self.edit(request, &mut before)?;
            self.track_selection();
            self.record(before, edit);
            Outcome::Continue
        } else {
            self.history.interrupt();
            let outcome = self.command(request);
            self.track_selection();
            outcome
        };
        Ok(outcome)
    }

    fn state(&self) -> SessionState {
        SessionState {
            cursor: self.cursor.snapshot(),
            selection: self.selection,
        }
    }

    fn track_selection(&mut self) {
        if self.selection.is_on() {
            self.selection.set_end(&self.cursor);
        }
    }

    fn record(&mut self, before: SessionState, edit: Edit) {
        if edit.is_empty() {
            self.history.interrupt();
            return;
        }
        self.edited = true;
        self.history.record(Action::new(edit, before, self.state()));
    }

    fn answer_quit(&mut self, request: &Request) -> Outcome {
        match request {
            Request::ConfirmQuit(true) => Outcome::Quit,
            Request::ConfirmQuit(false) | Request::ChangeMode(Mode::Normal) => {
                self.mode = Mode::Normal;
                Outcome::Continue
            }
            _ => Outcome::Continue,
        }
    }

    // -- Edits --------------------------------------------------------------

    /// Run an edit request. `before` may be adjusted to where undo should
    /// put the cursor back.
    fn edit(&mut self, request: Request, before: &mut SessionState) -> EditResult<Edit> {
        // Plain typing drops the selection so its anchor never outlives the
        // text it points into. `before` still holds it for undo.
        if !matches!(
            request,
            Request::DeleteSelection | Request::Cut | Request::InsertTab | Request::RemoveTab
        ) {
            self.selection.turn_off();
        }
        let edit = match request {
            Request::Insert(text) => {
                self.cursor.insert(&mut self.buf, text.as_bytes())?;
                Edit::Insert(text.into_bytes())
            }
            Request::Newline => {
                let indent = self.current_indent();
                let mut text = self.settings.line_ending.as_str().as_bytes().to_vec();
                text.extend_from_slice(&indent);
                self.cursor.insert(&mut self.buf, &text)?;
                Edit::Insert(text)
            }
            Request::Paste => {
                let text = self.register.content().to_vec();
                self.cursor.insert(&mut self.buf, &text)?;
                Edit::Paste(text)
            }
            Request::Delete => Edit::Delete(self.cursor.delete(&mut self.buf)?),
            Request::Backspace => Edit::Backspace(self.cursor.backspace(&mut self.buf)?),
            Request::DeleteSelection => Edit::DeleteSelection(self.delete_selection(before)?),
            Request::Cut => {
                self.register.copy(&self.buf, &self.cursor, &self.selection)?;
                Edit::DeleteSelection(self.delete_selection(before)?)
            }
            Request::InsertTab => {
                let indent = self.settings.indent.clone();
                let lines = self.cursor.tab(&mut self.buf, Some(&self.selection), &indent)?;
                self.shift_anchor(&lines, indent_delta(&indent));
                Edit::InsertTab { lines, indent }
            }
            Request::RemoveTab => {
                let indent = self.settings.indent.clone();
                let lines = self.cursor.untab(&mut self.buf, Some(&self.selection), &indent)?;
                self.shift_anchor(&lines, -indent_delta(&indent));
                Edit::RemoveTab { lines, indent }
            }
            // Records nothing.
            other => {
                debug!(request = %other, "not an edit");
                Edit::Insert(Vec::new())
            }
        };
        Ok(edit)
    }

    /// Delete the selection, or the rune after the cursor without one.
    fn delete_selection(&mut self, before: &mut SessionState) -> EditResult<Vec<u8>> {
        if !self.selection.is_on() {
            return self.cursor.delete(&mut self.buf);
        }
        let (min, _) = self.selection.min_max();
        let start = self.buf.resolve(min)?;
        before.cursor = Cursor::at(&self.buf, start, self.settings.tab_width).snapshot();
        self.cursor.delete_selection(&mut self.buf, &mut self.selection)
    }

    /// Keep the selection anchor on the same text when its line gained or
    /// lost an indent.
    fn shift_anchor(&mut self, lines: &[usize], delta: isize) {
        if !self.selection.is_on() {
            return;
        }
        let anchor = self.selection.start().line;
        if lines.contains(&anchor) {
            self.selection.shift_line(anchor, delta);
        }
    }

    /// Leading blanks of the part of the cursor's line left of the cursor.
    /// That part is what stays behind when a newline splits the line.
    fn current_indent(&self) -> Vec<u8> {
        let end = self.cursor.offset();
        let start = end - self.cursor.byte();
        self.buf
            .slice(start, end)
            .into_iter()
            .take_while(|&b| b == b' ' || b == b'\t')
            .collect()
    }

    // -- Commands -----------------------------------------------------------

    fn command(&mut self, request: Request) -> Outcome {
        match request {
            Request::Move(motion) => self.motion(motion),
            Request::SelectionOn => self.selection.turn_on(&self.cursor),
            Request::SelectionOff => self.selection.turn_off(),
            Request::SelectLine => {
                self.cursor.move_bol(&self.buf);
                if !self.selection.is_on() {
                    self.selection.turn_on(&self.cursor);
                }
                self.cursor.move_down(&self.buf);
            }
            Request::Copy => {
                if let Err(err) = self.register.copy(&self.buf, &self.cursor, &self.selection) {
                    warn!(%err, "copy skipped");
                }
            }
            Request::SaveFindWord => {
                let word = self.cursor.word(&self.buf).unwrap_or_default();
                self.find.set_query(word);
                self.find.confirm();
                self.hold(format!("find string : {}", self.find.query()));
            }
            Request::SetFindQuery(query) => self.find.set_query(query),
            Request::FindType(ch) => self.find.push(ch),
            Request::FindErase => self.find.pop(),
            Request::FindToggleDirection => self.find.toggle_direction(),
            Request::FindRepeat => match self.find.direction() {
                SearchDirection::Forward => self.search(Cursor::goto_next, true),
                SearchDirection::Backward => self.search(Cursor::goto_prev, true),
            },
            Request::FindNext => {
                self.find.set_direction(SearchDirection::Forward);
                self.search(Cursor::goto_next, true);
            }
            Request::FindPrev => {
                self.find.set_direction(SearchDirection::Backward);
                self.search(Cursor::goto_prev, true);
            }
            Request::FindFirst => self.search(Cursor::goto_first, false),
            Request::FindLast => self.search(Cursor::goto_last, false),
            Request::FindNextWord => self.search(Cursor::goto_next_word, false),
            Request::FindPrevWord => self.search(Cursor::goto_prev_word, false),
            Request::GotoLine(line) => {
                self.cursor.goto_line(&self.buf, line.saturating_sub(1));
                if self.mode == Mode::GotoLine {
                    self.mode = Mode::Normal;
                }
            }
            Request::ChangeMode(mode) => self.change_mode(mode),
            Request::ToggleMoveMode => {
                // Prompts keep move mode off.
                if !self.mode.is_prompt() {
                    self.move_mode = !self.move_mode;
                }
            }
            Request::Save => return Outcome::Save,
            Request::Quit => {
                if !self.edited {
                    return Outcome::Quit;
                }
                self.change_mode(Mode::ConfirmQuit);
            }
            Request::ConfirmQuit(_) | Request::Undo | Request::Redo => {}
            edit => debug!(request = %edit, "edit request routed as command"),
        }
        Outcome::Continue
    }

    fn change_mode(&mut self, mode: Mode) {
        if self.mode == Mode::Find && mode == Mode::Normal {
            self.find.cancel();
        }
        if mode == Mode::Find {
            let prefill = self.selection.is_on().then(|| self.selected_text());
            self.find.start(prefill);
        }
        debug!(from = %self.mode, to = %mode, "mode change");
        self.mode = mode;
        self.move_mode = false;
    }

    fn selected_text(&self) -> String {
        let (min, max) = self.selection.min_max();
        match (self.buf.resolve(min), self.buf.resolve(max)) {
            (Ok(start), Ok(end)) => String::from_utf8_lossy(&self.buf.slice(start, end)).into_owned(),
            _ => String::new(),
        }
    }

    /// Run a find step with the current query. Confirming steps remember
    /// the query for cancel.
    fn search(&mut self, step: fn(&mut Cursor, &Buffer, &[u8]) -> bool, confirm: bool) {
        if self.find.query().is_empty() {
            return;
        }
        let found = step(&mut self.cursor, &self.buf, self.find.query().as_bytes());
        trace!(query = self.find.query(), found, "find");
        if confirm {
            self.find.confirm();
        }
    }

    fn motion(&mut self, motion: Motion) {
        let buf = &self.buf;
        let cursor = &mut self.cursor;
        let nav = &self.settings.navigation;
        let is_opener = |ch: Option<char>| ch.is_some_and(|ch| nav.arg_openers.contains(ch));
        match motion {
            Motion::Left => cursor.move_left(buf),
            Motion::Right => cursor.move_right(buf),
            Motion::Up => cursor.move_up(buf),
            Motion::Down => cursor.move_down(buf),
            Motion::PrevBowEow => cursor.move_prev_bow_eow(buf),
            Motion::NextBowEow => cursor.move_next_bow_eow(buf),
            Motion::Bol => cursor.move_bol(buf),
            Motion::Eol => cursor.move_eol(buf),
            Motion::BocBolAdvance => cursor.move_boc_bol_advance(buf),
            Motion::EolAdvance => cursor.move_eol_advance(buf),
            Motion::PageUp => cursor.page_up(buf, self.settings.page_lines),
            Motion::PageDown => cursor.page_down(buf, self.settings.page_lines),
            Motion::Bof => cursor.move_bof(buf),
            Motion::Eof => cursor.move_eof(buf),
            Motion::NextGlobal => {
                cursor.goto_next_global_line(buf, &nav.global_skip);
            }
            Motion::PrevGlobal => {
                cursor.goto_prev_global_line(buf, &nav.global_skip);
            }
            Motion::NextArg => {
                cursor.goto_next_any(buf, &nav.arg_delimiters);
                if is_opener(cursor.rune_after(buf)) {
                    cursor.move_right(buf);
                }
            }
            Motion::PrevArg => {
                if is_opener(cursor.rune_before(buf)) {
                    cursor.move_left(buf);
                }
                cursor.goto_prev_any(buf, &nav.arg_delimiters);
                if is_opener(cursor.rune_after(buf)) {
                    cursor.move_right(buf);
                }
            }
            Motion::NextFindWord => {
                let query = self.find.query();
                if !query.is_empty() {
                    cursor.goto_next(buf, query.as_bytes());
                }
            }
            Motion::PrevFindWord => {
                let query = self.find.query();
                if !query.is_empty() {
                    cursor.goto_prev(buf, query.as_bytes());
                }
            }
            Motion::NextCursorWord => {
                if let Some(word) = cursor.word(buf) {
                    cursor.goto_next(buf, word.as_bytes());
                }
            }
            Motion::PrevCursorWord => {
                if let Some(word) = cursor.word(buf) {
                    cursor.goto_prev(buf, word.as_bytes());
                }
            }
            Motion::MatchingBracket => {
                cursor.goto_matching_bracket(buf);
            }
        }
    }
}

fn indent_delta(indent: &[u8]) -> isize {
    isize::try_from(indent.len()).unwrap_or(isize::MAX)
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("len", &self.buf.len())
            .field("cursor", &self.cursor.position())
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .field("head", &self.history.head())
            .field("edited", &self.edited)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
