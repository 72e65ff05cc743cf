// SPDX-License-Identifier: MIT
//
// tor-event — the event queue and idle-tick loop for tor.
//
// One producer thread pushes events into a bounded queue; the event loop
// consumes them one at a time on the caller's thread, running each to
// completion, and fires an idle callback when the queue stays quiet for
// a whole tick. The editing core is never touched concurrently.

pub mod event_loop;
pub mod producer;

pub use event_loop::{App, Control, EventLoop, Exit, LoopConfig};
pub use producer::{Producer, spawn_producer};
