//! Input modes.
//!
//! The session is always in exactly one [`Mode`]. Each mode changes how the
//! input layer interprets keys and what the status line shows:
//!
//! | Mode        | Input goes to        | Leaves on                 |
//! |-------------|----------------------|---------------------------|
//! | Normal      | the document         | find / goto / quit keys   |
//! | Find        | the find query       | cancel                    |
//! | GotoLine    | the line number      | confirm or cancel         |
//! | ConfirmQuit | a yes / no answer    | any answer                |
//!
//! Move mode is not a [`Mode`]: it is a toggle held beside Normal mode that
//! makes letter keys navigate instead of insert.

use std::fmt;

/// The current input mode.
///
/// Pure data. Key dispatch and transitions live in the session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Keys edit and navigate the document.
    #[default]
    Normal,
    /// Keys edit the find query and step through matches.
    Find,
    /// Keys type a line number to jump to.
    GotoLine,
    /// Quit was requested with unsaved edits.
    ConfirmQuit,
}

impl Mode {
    /// Human-readable name for the status line.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Find => "find",
            Self::GotoLine => "gotoline",
            Self::ConfirmQuit => "exit",
        }
    }

    /// True if keys in this mode feed a prompt instead of the document.
    #[inline]
    #[must_use]
    pub const fn is_prompt(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "find" => Ok(Self::Find),
            "gotoline" => Ok(Self::GotoLine),
            "exit" => Ok(Self::ConfirmQuit),
            other => Err(format!("unknown mode {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
