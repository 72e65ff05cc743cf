// SPDX-License-Identifier: MIT
//
// Event loop — the consumer side of the event queue.
//
// The loop blocks on the queue with a timeout equal to the idle tick.
// This gives two behaviors in one:
//
//   1. **Instant response**: an event is handled the moment it arrives,
//      and runs to completion before the next one is taken. Events are
//      strictly serialized.
//
//   2. **Idle tick**: when nothing arrives for a whole tick, the timeout
//      fires and the application gets `on_idle`, used to expire
//      transient status messages. While idle the thread is parked, so
//      an idle editor costs no CPU.
//
// The loop ends when the application asks to quit or when the producer
// disconnects (its source ran dry and the queue has drained).

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, trace};

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the loop after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep running.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Why [`EventLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The application returned [`Control::Quit`].
    Quit,
    /// The producer is gone and every queued event was handled.
    Disconnected,
}

/// Application interface for the event loop.
///
/// Only [`on_event`](App::on_event) is required.
pub trait App {
    /// What the producer sends.
    type Event;
    /// A failure that must stop the loop.
    type Error;

    /// Handle one event.
    ///
    /// # Errors
    ///
    /// An error ends the loop and is returned from [`EventLoop::run`].
    fn on_event(&mut self, event: Self::Event) -> Result<Control, Self::Error>;

    /// Called when a full tick passes with no event.
    ///
    /// # Errors
    ///
    /// An error ends the loop and is returned from [`EventLoop::run`].
    fn on_idle(&mut self) -> Result<Control, Self::Error> {
        Ok(Control::Continue)
    }
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

/// Queue and timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Events the queue holds before the producer blocks.
    pub queue_capacity: usize,
    /// Quiet time before `on_idle` fires.
    pub idle_tick: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 20,
            idle_tick: Duration::from_secs(1),
        }
    }
}

impl LoopConfig {
    /// Build from raw config values. A zero tick is raised to 1ms.
    #[must_use]
    pub fn new(queue_capacity: usize, idle_tick_ms: u64) -> Self {
        Self {
            queue_capacity: queue_capacity.max(1),
            idle_tick: Duration::from_millis(idle_tick_ms.max(1)),
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The consumer loop.
///
/// # Example
///
/// ```
/// use tor_event::event_loop::{App, Control, EventLoop, Exit, LoopConfig};
/// use tor_event::producer::spawn_producer;
///
/// struct Sum(u32);
///
/// impl App for Sum {
///     type Event = u32;
///     type Error = std::convert::Infallible;
///
///     fn on_event(&mut self, n: u32) -> Result<Control, Self::Error> {
///         self.0 += n;
///         Ok(Control::Continue)
///     }
/// }
///
/// let mut source = 1..=3;
/// let (_producer, rx) = spawn_producer(4, move || source.next())?;
/// let mut app = Sum(0);
/// let exit = EventLoop::new(LoopConfig::default()).run(&mut app, &rx);
/// assert_eq!(exit, Ok(Exit::Disconnected));
/// assert_eq!(app.0, 6);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EventLoop {
    config: LoopConfig,
}

impl EventLoop {
    #[must_use]
    pub const fn new(config: LoopConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> LoopConfig {
        self.config
    }

    /// Run until the application quits or the producer disconnects.
    ///
    /// # Errors
    ///
    /// Returns the first error the application reports.
    pub fn run<A: App>(&self, app: &mut A, rx: &Receiver<A::Event>) -> Result<Exit, A::Error> {
        let mut handled = 0usize;
        loop {
            let control = match rx.recv_timeout(self.config.idle_tick) {
                Ok(event) => {
                    handled += 1;
                    trace!(handled, "event");
                    app.on_event(event)?
                }
                Err(RecvTimeoutError::Timeout) => {
                    trace!("idle tick");
                    app.on_idle()?
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!(handled, "producer disconnected");
                    return Ok(Exit::Disconnected);
                }
            };
            if control == Control::Quit {
                debug!(handled, "quit requested");
                return Ok(Exit::Quit);
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::spawn_producer;
    use pretty_assertions::assert_eq;
    use std::thread;

    /// Records what the loop delivered.
    #[derive(Default)]
    struct Recorder {
        events: Vec<&'static str>,
        idles: usize,
        quit_on: Option<&'static str>,
        quit_after_idles: Option<usize>,
    }

    impl App for Recorder {
        type Event = &'static str;
        type Error = String;

        fn on_event(&mut self, event: &'static str) -> Result<Control, String> {
            if event == "boom" {
                return Err("boom".into());
            }
            self.events.push(event);
            Ok(if self.quit_on == Some(event) {
                Control::Quit
            } else {
                Control::Continue
            })
        }

        fn on_idle(&mut self) -> Result<Control, String> {
            self.idles += 1;
            Ok(if self.quit_after_idles == Some(self.idles) {
                Control::Quit
            } else {
                Control::Continue
            })
        }
    }

    fn fast() -> EventLoop {
        EventLoop::new(LoopConfig::new(4, 10))
    }

    // ── LoopConfig ──────────────────────────────────────────────

    #[test]
    fn default_config() {
        let config = LoopConfig::default();
        assert_eq!(config.queue_capacity, 20);
        assert_eq!(config.idle_tick, Duration::from_secs(1));
    }

    #[test]
    fn config_clamps_zeroes() {
        let config = LoopConfig::new(0, 0);
        assert_eq!(config.queue_capacity, 1);
        assert_eq!(config.idle_tick, Duration::from_millis(1));
    }

    // ── Running ────────────────────────────────────────────────

    #[test]
    fn handles_every_event_in_order() {
        let mut source = ["a", "b", "c"].into_iter();
        let (_producer, rx) = spawn_producer(1, move || source.next()).unwrap();
        let mut app = Recorder::default();
        assert_eq!(fast().run(&mut app, &rx), Ok(Exit::Disconnected));
        assert_eq!(app.events, vec!["a", "b", "c"]);
    }

    #[test]
    fn quit_stops_before_remaining_events() {
        let mut source = ["a", "q", "b"].into_iter();
        let (_producer, rx) = spawn_producer(4, move || source.next()).unwrap();
        let mut app = Recorder {
            quit_on: Some("q"),
            ..Recorder::default()
        };
        assert_eq!(fast().run(&mut app, &rx), Ok(Exit::Quit));
        assert_eq!(app.events, vec!["a", "q"]);
    }

    #[test]
    fn error_ends_loop() {
        let mut source = ["a", "boom", "b"].into_iter();
        let (_producer, rx) = spawn_producer(4, move || source.next()).unwrap();
        let mut app = Recorder::default();
        assert_eq!(fast().run(&mut app, &rx), Err("boom".to_string()));
        assert_eq!(app.events, vec!["a"]);
    }

    #[test]
    fn idle_tick_fires_while_queue_is_quiet() {
        let (tx, rx) = crossbeam_channel::bounded::<&'static str>(1);
        let mut app = Recorder {
            quit_after_idles: Some(3),
            ..Recorder::default()
        };
        assert_eq!(fast().run(&mut app, &rx), Ok(Exit::Quit));
        assert_eq!(app.idles, 3);
        drop(tx);
    }

    #[test]
    fn slow_producer_interleaves_ticks() {
        let mut source = ["a", "b"].into_iter();
        let (_producer, rx) = spawn_producer(1, move || {
            thread::sleep(Duration::from_millis(40));
            source.next()
        })
        .unwrap();
        let mut app = Recorder::default();
        assert_eq!(fast().run(&mut app, &rx), Ok(Exit::Disconnected));
        assert_eq!(app.events, vec!["a", "b"]);
        assert!(app.idles >= 1);
    }
}
