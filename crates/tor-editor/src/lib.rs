//! # tor-editor — Editing engine for tor
//!
//! This crate contains the in-memory building blocks of the editor:
//!
//! - **[`clip`]** / **[`buffer`]** — the document as an ordered run of byte
//!   clips with per-clip newline indexes
//! - **[`cursor`]** — navigation and every mutating operation, with cached
//!   `(line, byte, visual column)` coordinates
//! - **[`selection`]** — anchor and live end, normalized to a range
//! - **[`action`]** / **[`history`]** — undo/redo log with coalescing
//! - **[`session`]** — one open document driven by [`request::Request`]s
//! - **[`config`]** — TOML settings with defaults
//!
//! Rendering, key mapping and file I/O live outside this crate.

pub mod action;
pub mod buffer;
pub mod clip;
pub mod config;
pub mod cursor;
pub mod error;
pub mod history;
pub mod mode;
pub mod position;
pub mod register;
pub mod request;
pub mod search;
pub mod selection;
pub mod session;
pub mod utf8;
pub mod viewport;
pub mod width;
pub mod word;

pub use buffer::Buffer;
pub use config::Config;
pub use cursor::Cursor;
pub use error::{EditError, EditResult};
pub use request::Request;
pub use session::{Outcome, Session};
