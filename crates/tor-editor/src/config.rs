//! Configuration loading and parsing.
//!
//! Settings come from `config.toml` in the platform config directory
//! (`~/.config/tor/config.toml` on Linux) or a path given by the binary.
//! Every field has a default, so an empty or missing file is a valid
//! configuration. Unknown keys are ignored.
//!
//! ```toml
//! tab_width = 4
//! indent = "\t"
//! line_ending = "auto"   # "auto" | "lf" | "crlf"
//! page_lines = 20
//! scroll_margin = 3
//!
//! [navigation]
//! global_skip = " \t#/{}()"
//! arg_delimiters = "{(,)}"
//! arg_openers = "({"
//!
//! [events]
//! queue_capacity = 20
//! idle_tick_ms = 1000
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::buffer::LineEnding;

/// Failure to read or parse a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Which newline the session inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingSetting {
    /// Detect from the opened file, LF when it has no newline yet.
    #[default]
    Auto,
    Lf,
    Crlf,
}

impl LineEndingSetting {
    /// The concrete ending for a document opened from `bytes`.
    #[must_use]
    pub fn resolve(self, bytes: &[u8]) -> LineEnding {
        match self {
            Self::Auto => LineEnding::detect(bytes),
            Self::Lf => LineEnding::Lf,
            Self::Crlf => LineEnding::CrLf,
        }
    }
}

/// Rune sets used by structural motions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Runes ignored when deciding whether a line is a "global" line.
    pub global_skip: String,
    /// Runes that separate arguments for next/prev arg motions.
    pub arg_delimiters: String,
    /// Delimiters the cursor steps inside of after an arg motion.
    pub arg_openers: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            global_skip: " \t#/{}()".into(),
            arg_delimiters: "{(,)}".into(),
            arg_openers: "({".into(),
        }
    }
}

/// Event queue settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub queue_capacity: usize,
    pub idle_tick_ms: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 20,
            idle_tick_ms: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// The full editor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Visual columns per tab. At least 1.
    pub tab_width: usize,
    /// The unit added by tab and removed by untab.
    pub indent: String,
    pub line_ending: LineEndingSetting,
    /// Lines moved by page up / page down.
    pub page_lines: usize,
    /// Lines kept between the cursor and the viewport edges.
    pub scroll_margin: usize,
    pub navigation: NavigationConfig,
    pub events: EventsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_width: 4,
            indent: "\t".into(),
            line_ending: LineEndingSetting::Auto,
            page_lines: 20,
            scroll_margin: 3,
            navigation: NavigationConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Config {
    /// `<config dir>/tor/config.toml`, or `None` on platforms without a
    /// config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tor").join("config.toml"))
    }

    /// Parse TOML text. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let config: Self = toml::from_str(text)?;
        Ok(config.normalized())
    }

    /// Load from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// The tab width as the cursor expects it.
    #[inline]
    #[must_use]
    pub const fn effective_tab_width(&self) -> usize {
        if self.tab_width == 0 { 1 } else { self.tab_width }
    }

    fn normalized(mut self) -> Self {
        if self.tab_width == 0 {
            debug!("tab_width 0 clamped to 1");
            self.tab_width = 1;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
