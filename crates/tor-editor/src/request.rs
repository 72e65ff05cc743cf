//! Requests — what the input layer asks the session to do.
//!
//! A [`Request`] is one semantic step: a motion, an edit, a find step, a
//! mode change. Key bindings are not part of the core; whatever maps keys
//! (or script lines) produces requests.
//!
//! Requests also have a line-oriented text form, used by the headless
//! binary and by tests to drive a session from a script:
//!
//! ```text
//! move nextBowEow
//! selection on
//! insert hello\tworld\n
//! find needle
//! findNext
//! findType x
//! goto 12
//! mode find
//! ```
//!
//! Text arguments are everything after the first space, verbatim, with
//! `\n`, `\r`, `\t` and `\\` escapes.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::mode::Mode;

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// A cursor motion. Motions never edit and always end an undo run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    PrevBowEow,
    NextBowEow,
    Bol,
    Eol,
    BocBolAdvance,
    EolAdvance,
    PageUp,
    PageDown,
    Bof,
    Eof,
    NextGlobal,
    PrevGlobal,
    NextArg,
    PrevArg,
    NextFindWord,
    PrevFindWord,
    NextCursorWord,
    PrevCursorWord,
    MatchingBracket,
}

impl Motion {
    pub const ALL: [Self; 23] = [
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
        Self::PrevBowEow,
        Self::NextBowEow,
        Self::Bol,
        Self::Eol,
        Self::BocBolAdvance,
        Self::EolAdvance,
        Self::PageUp,
        Self::PageDown,
        Self::Bof,
        Self::Eof,
        Self::NextGlobal,
        Self::PrevGlobal,
        Self::NextArg,
        Self::PrevArg,
        Self::NextFindWord,
        Self::PrevFindWord,
        Self::NextCursorWord,
        Self::PrevCursorWord,
        Self::MatchingBracket,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
            Self::PrevBowEow => "prevBowEow",
            Self::NextBowEow => "nextBowEow",
            Self::Bol => "bol",
            Self::Eol => "eol",
            Self::BocBolAdvance => "bocBolAdvance",
            Self::EolAdvance => "eolAdvance",
            Self::PageUp => "pageup",
            Self::PageDown => "pagedown",
            Self::Bof => "bof",
            Self::Eof => "eof",
            Self::NextGlobal => "nextGlobal",
            Self::PrevGlobal => "prevGlobal",
            Self::NextArg => "nextArg",
            Self::PrevArg => "prevArg",
            Self::NextFindWord => "nextFindWord",
            Self::PrevFindWord => "prevFindWord",
            Self::NextCursorWord => "nextCursorWord",
            Self::PrevCursorWord => "prevCursorWord",
            Self::MatchingBracket => "matchingBracket",
        }
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Motion {
    type Err = RequestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| RequestParseError::UnknownMotion(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One step for [`Session::apply`](crate::session::Session::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Move(Motion),
    SelectionOn,
    SelectionOff,
    /// Insert text at the cursor. Plain edits turn the selection off.
    Insert(String),
    /// Insert a line ending plus the current line's leading whitespace.
    Newline,
    Delete,
    Backspace,
    /// Delete the selection, or the rune after the cursor without one.
    DeleteSelection,
    InsertTab,
    RemoveTab,
    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    SelectLine,
    /// Use the word under the cursor as the find query.
    SaveFindWord,
    SetFindQuery(String),
    /// Type one rune into the find prompt. The first rune after entering
    /// the prompt replaces the pre-filled query.
    FindType(char),
    /// Erase the last rune of the find prompt, or the whole pre-filled
    /// query right after entering it.
    FindErase,
    FindToggleDirection,
    /// Find again in the prompt's current direction.
    FindRepeat,
    FindNext,
    FindPrev,
    FindFirst,
    FindLast,
    FindNextWord,
    FindPrevWord,
    /// Jump to a 1-indexed line. `0` means the first line.
    GotoLine(usize),
    ChangeMode(Mode),
    ToggleMoveMode,
    Save,
    Quit,
    /// Answer the unsaved-changes prompt.
    ConfirmQuit(bool),
}

impl Request {
    /// True for the requests that may change the document.
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::Insert(_)
                | Self::Newline
                | Self::Delete
                | Self::Backspace
                | Self::DeleteSelection
                | Self::InsertTab
                | Self::RemoveTab
                | Self::Cut
                | Self::Paste
        )
    }

    /// The keyword of the text form.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::SelectionOn | Self::SelectionOff => "selection",
            Self::Insert(_) => "insert",
            Self::Newline => "newline",
            Self::Delete => "delete",
            Self::Backspace => "backspace",
            Self::DeleteSelection => "deleteSelection",
            Self::InsertTab => "insertTab",
            Self::RemoveTab => "removeTab",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Copy => "copy",
            Self::Cut => "cut",
            Self::Paste => "paste",
            Self::SelectLine => "selectLine",
            Self::SaveFindWord => "saveFindWord",
            Self::SetFindQuery(_) => "find",
            Self::FindType(_) => "findType",
            Self::FindErase => "findErase",
            Self::FindToggleDirection => "findToggle",
            Self::FindRepeat => "findRepeat",
            Self::FindNext => "findNext",
            Self::FindPrev => "findPrev",
            Self::FindFirst => "findFirst",
            Self::FindLast => "findLast",
            Self::FindNextWord => "findNextWord",
            Self::FindPrevWord => "findPrevWord",
            Self::GotoLine(_) => "goto",
            Self::ChangeMode(_) => "mode",
            Self::ToggleMoveMode => "moveMode",
            Self::Save => "save",
            Self::Quit => "quit",
            Self::ConfirmQuit(_) => "confirm",
        }
    }
}

/// Why a script line is not a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestParseError {
    #[error("empty request")]
    Empty,
    #[error("unknown request {0:?}")]
    UnknownRequest(String),
    #[error("unknown motion {0:?}")]
    UnknownMotion(String),
    #[error("{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("{0} takes no argument")]
    UnexpectedArgument(&'static str),
    #[error("invalid {keyword} argument {value:?}")]
    InvalidArgument { keyword: &'static str, value: String },
    #[error("unknown escape \\{0}")]
    BadEscape(char),
    #[error("argument ends with a lone backslash")]
    TrailingBackslash,
}

impl FromStr for Request {
    type Err = RequestParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (word, arg) = match line.split_once(' ') {
            Some((word, arg)) => (word, Some(arg)),
            None => (line, None),
        };
        let bare = |request: Self| match arg {
            None => Ok(request),
            Some(_) => Err(RequestParseError::UnexpectedArgument(request.keyword())),
        };
        let need = |keyword: &'static str| arg.ok_or(RequestParseError::MissingArgument(keyword));
        let invalid = |keyword: &'static str, value: &str| RequestParseError::InvalidArgument {
            keyword,
            value: value.to_owned(),
        };

        match word {
            "" => Err(RequestParseError::Empty),
            "move" => need("move")?.parse().map(Self::Move),
            "selection" => match need("selection")? {
                "on" => Ok(Self::SelectionOn),
                "off" => Ok(Self::SelectionOff),
                other => Err(invalid("selection", other)),
            },
            "insert" => unescape(need("insert")?).map(Self::Insert),
            "find" => unescape(need("find")?).map(Self::SetFindQuery),
            "findType" => {
                let value = need("findType")?;
                let text = unescape(value)?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(Self::FindType(ch)),
                    _ => Err(invalid("findType", value)),
                }
            }
            "goto" => {
                let value = need("goto")?;
                value
                    .trim()
                    .parse()
                    .map(Self::GotoLine)
                    .map_err(|_| invalid("goto", value))
            }
            "mode" => {
                let value = need("mode")?;
                value
                    .parse()
                    .map(Self::ChangeMode)
                    .map_err(|_| invalid("mode", value))
            }
            "confirm" => match need("confirm")? {
                "y" | "yes" => Ok(Self::ConfirmQuit(true)),
                "n" | "no" => Ok(Self::ConfirmQuit(false)),
                other => Err(invalid("confirm", other)),
            },
            "newline" => bare(Self::Newline),
            "delete" => bare(Self::Delete),
            "backspace" => bare(Self::Backspace),
            "deleteSelection" => bare(Self::DeleteSelection),
            "insertTab" => bare(Self::InsertTab),
            "removeTab" => bare(Self::RemoveTab),
            "undo" => bare(Self::Undo),
            "redo" => bare(Self::Redo),
            "copy" => bare(Self::Copy),
            "cut" => bare(Self::Cut),
            "paste" => bare(Self::Paste),
            "selectLine" => bare(Self::SelectLine),
            "saveFindWord" => bare(Self::SaveFindWord),
            "findErase" => bare(Self::FindErase),
            "findToggle" => bare(Self::FindToggleDirection),
            "findRepeat" => bare(Self::FindRepeat),
            "findNext" => bare(Self::FindNext),
            "findPrev" => bare(Self::FindPrev),
            "findFirst" => bare(Self::FindFirst),
            "findLast" => bare(Self::FindLast),
            "findNextWord" => bare(Self::FindNextWord),
            "findPrevWord" => bare(Self::FindPrevWord),
            "moveMode" => bare(Self::ToggleMoveMode),
            "save" => bare(Self::Save),
            "quit" => bare(Self::Quit),
            other => Err(RequestParseError::UnknownRequest(other.to_owned())),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())?;
        match self {
            Self::Move(motion) => write!(f, " {motion}"),
            Self::SelectionOn => f.write_str(" on"),
            Self::SelectionOff => f.write_str(" off"),
            Self::Insert(text) | Self::SetFindQuery(text) => write!(f, " {}", escape(text)),
            Self::FindType(ch) => write!(f, " {}", escape(ch.encode_utf8(&mut [0; 4]))),
            Self::GotoLine(line) => write!(f, " {line}"),
            Self::ChangeMode(mode) => write!(f, " {mode}"),
            Self::ConfirmQuit(yes) => f.write_str(if *yes { " y" } else { " n" }),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Escapes
// ---------------------------------------------------------------------------

/// Escape `\`, newline, carriage return and tab for the text form.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Undo [`escape`].
///
/// # Errors
///
/// Fails on an unknown escape or a trailing lone backslash.
pub fn unescape(text: &str) -> Result<String, RequestParseError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(RequestParseError::BadEscape(other)),
            None => return Err(RequestParseError::TrailingBackslash),
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> Request {
        line.parse().unwrap()
    }

    // -- Parsing ------------------------------------------------------------

    #[test]
    fn parse_motions() {
        assert_eq!(parse("move left"), Request::Move(Motion::Left));
        assert_eq!(parse("move bocBolAdvance"), Request::Move(Motion::BocBolAdvance));
        assert_eq!(parse("move pagedown"), Request::Move(Motion::PageDown));
        assert_eq!(
            "move sideways".parse::<Request>(),
            Err(RequestParseError::UnknownMotion("sideways".into()))
        );
    }

    #[test]
    fn motion_names_are_unique_and_parse_back() {
        for motion in Motion::ALL {
            assert_eq!(motion.name().parse::<Motion>(), Ok(motion));
        }
    }

    #[test]
    fn parse_text_arguments_verbatim() {
        assert_eq!(parse("insert  two"), Request::Insert(" two".into()));
        assert_eq!(parse("insert a\\tb\\n"), Request::Insert("a\tb\n".into()));
        assert_eq!(parse("find x\\\\y"), Request::SetFindQuery("x\\y".into()));
        assert_eq!(parse("insert 中"), Request::Insert("中".into()));
    }

    #[test]
    fn parse_numbers_modes_and_answers() {
        assert_eq!(parse("goto 12"), Request::GotoLine(12));
        assert_eq!(parse("mode find"), Request::ChangeMode(Mode::Find));
        assert_eq!(parse("confirm y"), Request::ConfirmQuit(true));
        assert_eq!(parse("confirm no"), Request::ConfirmQuit(false));
        assert_eq!(parse("selection on"), Request::SelectionOn);
    }

    #[test]
    fn parse_bare_keywords() {
        assert_eq!(parse("undo"), Request::Undo);
        assert_eq!(parse("deleteSelection"), Request::DeleteSelection);
        assert_eq!(parse("moveMode"), Request::ToggleMoveMode);
        assert_eq!(parse("findPrevWord"), Request::FindPrevWord);
        assert_eq!(parse("findToggle"), Request::FindToggleDirection);
    }

    #[test]
    fn parse_find_prompt_runes() {
        assert_eq!(parse("findType 中"), Request::FindType('中'));
        assert_eq!(parse("findType  "), Request::FindType(' '));
        assert_eq!(parse("findType \\t"), Request::FindType('\t'));
        assert!(matches!(
            "findType ab".parse::<Request>(),
            Err(RequestParseError::InvalidArgument { keyword: "findType", .. })
        ));
        assert_eq!(
            "findType".parse::<Request>(),
            Err(RequestParseError::MissingArgument("findType"))
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<Request>(), Err(RequestParseError::Empty));
        assert_eq!(
            "jump".parse::<Request>(),
            Err(RequestParseError::UnknownRequest("jump".into()))
        );
        assert_eq!(
            "insert".parse::<Request>(),
            Err(RequestParseError::MissingArgument("insert"))
        );
        assert_eq!(
            "undo now".parse::<Request>(),
            Err(RequestParseError::UnexpectedArgument("undo"))
        );
        assert!(matches!(
            "goto ten".parse::<Request>(),
            Err(RequestParseError::InvalidArgument { keyword: "goto", .. })
        ));
        assert_eq!(
            "insert a\\qb".parse::<Request>(),
            Err(RequestParseError::BadEscape('q'))
        );
        assert_eq!(
            "insert a\\".parse::<Request>(),
            Err(RequestParseError::TrailingBackslash)
        );
    }

    // -- Display ------------------------------------------------------------

    #[test]
    fn display_matches_parse() {
        let requests = [
            Request::Move(Motion::MatchingBracket),
            Request::SelectionOff,
            Request::Insert("tab\there\nand \\ back".into()),
            Request::SetFindQuery("needle".into()),
            Request::FindType('\n'),
            Request::FindType(' '),
            Request::FindErase,
            Request::FindRepeat,
            Request::GotoLine(3),
            Request::ChangeMode(Mode::GotoLine),
            Request::ConfirmQuit(false),
            Request::Newline,
            Request::Cut,
        ];
        for request in requests {
            let text = request.to_string();
            assert_eq!(text.parse::<Request>(), Ok(request), "{text}");
        }
    }

    #[test]
    fn display_escapes() {
        assert_eq!(Request::Insert("a\tb\n".into()).to_string(), "insert a\\tb\\n");
    }

    #[test]
    fn edit_requests() {
        assert!(Request::Paste.is_edit());
        assert!(Request::Newline.is_edit());
        assert!(!Request::Copy.is_edit());
        assert!(!Request::Undo.is_edit());
    }
}
