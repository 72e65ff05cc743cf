// SPDX-License-Identifier: MIT
//
// tor: a headless driver for the tor editing engine.
//
// This binary wires the two crates together:
//
//   tor-event  → producer thread, bounded queue, idle-tick loop
//   tor-editor → session: buffer, cursor, selection, history
//
// Each stdin line is one request in the script form understood by
// `tor_editor::request` (`move left`, `insert foo\n`, `save`, ...):
//
//   stdin → producer → queue → on_event → Request → Session::apply
//                                   └─ Save → write file → mark_saved
//
// The status line is printed after every request. With `--debug` the
// undo log is rewritten to `FILE.history` after every request too.

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Once;

use anyhow::{Context, Result, bail};
use tracing::{debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

use tor_editor::config::Config;
use tor_editor::request::Request;
use tor_editor::session::{Outcome, Session};
use tor_editor::viewport::Viewport;
use tor_event::{App, Control, EventLoop, Exit, LoopConfig, spawn_producer};

/// Rows and columns of the notional screen the viewport tracks.
const VIEW_ROWS: usize = 24;
const VIEW_COLS: usize = 80;

const USAGE: &str = "usage: tor [--debug] [--config PATH] FILE";

// ─── Arguments ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    debug: bool,
    config: Option<PathBuf>,
    file: PathBuf,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut debug = false;
        let mut config = None;
        let mut file = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--debug" => debug = true,
                "--config" => {
                    let path = args.next().context("--config needs a path")?;
                    config = Some(PathBuf::from(path));
                }
                flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
                _ if file.is_some() => bail!("only one file can be opened\n{USAGE}"),
                _ => file = Some(PathBuf::from(arg)),
            }
        }
        let file = file.with_context(|| USAGE.to_string())?;
        Ok(Self {
            debug,
            config,
            file,
        })
    }
}

/// `FILE.history`, next to the edited file.
fn history_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".history");
    PathBuf::from(name)
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// The event loop application: one session plus its file.
struct Editor<W: Write> {
    session: Session,
    path: PathBuf,
    debug: bool,
    viewport: Viewport,
    scroll_margin: usize,
    out: W,
}

impl<W: Write> Editor<W> {
    /// Open `path`. A missing file starts an empty document.
    fn open(path: &Path, config: &Config, debug: bool, out: W) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "new file");
                Vec::new()
            }
            Err(err) => return Err(err).with_context(|| format!("cannot read {}", path.display())),
        };
        let name = path.display().to_string();
        Ok(Self {
            session: Session::open(name, bytes, config),
            path: path.to_path_buf(),
            debug,
            viewport: Viewport::new(VIEW_ROWS, VIEW_COLS),
            scroll_margin: config.scroll_margin,
            out,
        })
    }

    fn save(&mut self) {
        match fs::write(&self.path, self.session.contents()) {
            Ok(()) => self.session.mark_saved(),
            Err(err) => self.session.save_failed(&err),
        }
    }

    fn dump_history(&self) -> Result<()> {
        let path = history_path(&self.path);
        fs::write(&path, self.session.history_dump())
            .with_context(|| format!("cannot write {}", path.display()))
    }

    fn print_status(&mut self) -> Result<()> {
        writeln!(self.out, "{}", self.session.status())?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> App for Editor<W> {
    type Event = String;
    type Error = anyhow::Error;

    fn on_event(&mut self, line: String) -> Result<Control> {
        if line.trim().is_empty() || line.starts_with('#') {
            return Ok(Control::Continue);
        }
        let request: Request = match line.parse() {
            Ok(request) => request,
            Err(err) => {
                warn!(%line, %err, "unparsable request");
                writeln!(self.out, "error: {err}")?;
                return Ok(Control::Continue);
            }
        };

        let outcome = self.session.apply(request).inspect_err(|err| {
            error!(%err, "edit invariant violated");
        })?;
        if outcome == Outcome::Save {
            self.save();
        }

        self.viewport.follow(self.session.cursor(), self.scroll_margin);
        trace!(
            top = self.viewport.top(),
            left = self.viewport.left(),
            at = ?self.viewport.position_in_viewport(self.session.cursor()),
            "viewport"
        );
        if self.debug {
            self.dump_history()?;
        }
        self.print_status()?;

        Ok(if outcome == Outcome::Quit {
            Control::Quit
        } else {
            Control::Continue
        })
    }

    fn on_idle(&mut self) -> Result<Control> {
        self.session.on_idle();
        Ok(Control::Continue)
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Log to `tor.log` in the working directory, filtered by `RUST_LOG`.
///
/// The returned guard flushes the writer when dropped.
fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let file_appender = tracing_appender::rolling::never(log_dir, "tor.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|()| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            error!(?info, "panic");
            default_panic(info);
        }));
    });
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match Config::default_path() {
            Some(path) => path,
            None => return Ok(Config::default()),
        },
    };
    Ok(Config::load(&path)?)
}

/// Read stdin one line at a time, without the line terminator.
fn stdin_lines() -> impl FnMut() -> Option<String> + Send + 'static {
    let stdin = io::stdin();
    move || {
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let trimmed = line.strip_suffix('\n').unwrap_or(&line);
                let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
                Some(trimmed.to_owned())
            }
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse(env::args().skip(1))?;
    let config = load_config(args.config.as_deref())?;
    info!(file = %args.file.display(), debug = args.debug, "startup");

    let mut editor = Editor::open(&args.file, &config, args.debug, io::stdout())?;
    editor.print_status()?;

    let loop_config = LoopConfig::new(config.events.queue_capacity, config.events.idle_tick_ms);
    let (producer, rx) = spawn_producer(loop_config.queue_capacity, stdin_lines())
        .context("cannot start input thread")?;

    let exit = EventLoop::new(loop_config).run(&mut editor, &rx)?;
    producer.stop();
    debug!(?exit, edited = editor.session.is_edited(), "shutdown");
    if exit == Exit::Disconnected && editor.session.is_edited() {
        warn!("input ended with unsaved edits");
    }
    Ok(())
}

fn main() {
    let _guard = configure_logging();
    install_panic_hook();

    if let Err(err) = run() {
        error!(%err, "fatal");
        eprintln!("tor: {err:#}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
