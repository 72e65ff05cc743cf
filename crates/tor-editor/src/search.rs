//! Search — the find prompt's state.
//!
//! The find query survives between prompts. Entering find mode may pre-fill
//! it from the selection; the first rune typed afterwards replaces a
//! pre-filled query instead of extending it. Cancelling restores the last
//! query that was actually used to search.
//!
//! The match scanning itself lives on [`Buffer`](crate::buffer::Buffer)
//! and [`Cursor`](crate::cursor::Cursor); searches never wrap.

use std::fmt;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

impl fmt::Display for SearchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "next",
            Self::Backward => "prev",
        })
    }
}

// ---------------------------------------------------------------------------
// FindState
// ---------------------------------------------------------------------------

/// The find prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindState {
    /// The query being edited.
    query: String,
    /// Direction used by a plain confirm.
    direction: SearchDirection,
    /// The last query a search ran with.
    previous: String,
    /// Set on entry; the next typed rune replaces the query.
    just_started: bool,
}

impl FindState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            query: String::new(),
            direction: SearchDirection::Forward,
            previous: String::new(),
            just_started: false,
        }
    }

    /// Enter the prompt. `prefill` (the selected text) replaces the query
    /// when given. The direction resets to forward.
    pub fn start(&mut self, prefill: Option<String>) {
        if let Some(text) = prefill {
            self.query = text;
        }
        self.direction = SearchDirection::Forward;
        self.just_started = true;
    }

    #[inline]
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[inline]
    #[must_use]
    pub const fn direction(&self) -> SearchDirection {
        self.direction
    }

    #[inline]
    #[must_use]
    pub const fn just_started(&self) -> bool {
        self.just_started
    }

    pub const fn set_direction(&mut self, direction: SearchDirection) {
        self.direction = direction;
    }

    pub const fn toggle_direction(&mut self) {
        self.direction = self.direction.opposite();
    }

    /// Replace the query outright.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.just_started = false;
    }

    /// Type one rune into the query.
    pub fn push(&mut self, ch: char) {
        if self.just_started {
            self.just_started = false;
            self.query.clear();
        }
        self.query.push(ch);
    }

    /// Erase the last rune. Right after entry this clears the whole
    /// pre-filled query.
    pub fn pop(&mut self) {
        if self.just_started {
            self.query.clear();
        } else {
            self.query.pop();
        }
    }

    /// Leave the prompt without searching: the query reverts to the last
    /// one used.
    pub fn cancel(&mut self) {
        self.query.clone_from(&self.previous);
        self.just_started = false;
    }

    /// Remember the current query as the one last used.
    pub fn confirm(&mut self) {
        self.previous.clone_from(&self.query);
        self.just_started = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // -- Direction ----------------------------------------------------------

    #[test]
    fn direction_opposite_and_display() {
        assert_eq!(SearchDirection::Forward.opposite(), SearchDirection::Backward);
        assert_eq!(SearchDirection::Backward.opposite(), SearchDirection::Forward);
        assert_eq!(SearchDirection::Forward.to_string(), "next");
        assert_eq!(SearchDirection::Backward.to_string(), "prev");
    }

    // -- Editing the query --------------------------------------------------

    #[test]
    fn first_rune_replaces_prefill() {
        let mut find = FindState::new();
        find.start(Some("selected".into()));
        assert_eq!(find.query(), "selected");
        assert!(find.just_started());
        find.push('a');
        find.push('b');
        assert_eq!(find.query(), "ab");
        assert!(!find.just_started());
    }

    #[test]
    fn pop_after_start_clears() {
        let mut find = FindState::new();
        find.start(Some("abc".into()));
        find.pop();
        assert_eq!(find.query(), "");
    }

    #[test]
    fn pop_removes_last_rune() {
        let mut find = FindState::new();
        find.set_query("a中");
        find.pop();
        assert_eq!(find.query(), "a");
    }

    #[test]
    fn start_without_prefill_keeps_query() {
        let mut find = FindState::new();
        find.set_query("kept");
        find.toggle_direction();
        find.start(None);
        assert_eq!(find.query(), "kept");
        assert_eq!(find.direction(), SearchDirection::Forward);
    }

    // -- Cancel / confirm ---------------------------------------------------

    #[test]
    fn cancel_restores_previous() {
        let mut find = FindState::new();
        find.set_query("first");
        find.confirm();
        find.start(None);
        find.push('x');
        find.cancel();
        assert_eq!(find.query(), "first");
        assert!(!find.just_started());
    }
}
