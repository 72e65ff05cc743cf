// SPDX-License-Identifier: MIT
//
// Producer — the one thread that feeds the event queue.
//
// A dedicated thread calls a blocking `next()` source (a stdin line
// reader, a script, a terminal poller) and pushes each event into a
// bounded crossbeam channel. The consumer side is the event loop, which
// waits on the channel with `recv_timeout()` so it can still tick while
// the producer is blocked.
//
// Backpressure: `send` blocks while the queue is full. Events are never
// dropped and arrive in the order they were produced.
//
// Shutdown: the thread exits when `next()` yields `None`, when the stop
// flag is set (checked between events), or when the receiver is gone.
// A producer blocked inside `next()` cannot be interrupted, so dropping
// the handle only raises the flag and detaches; `join` is explicit.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

/// Handle to the producer thread.
pub struct Producer {
    /// `None` after `join()`.
    handle: Option<JoinHandle<usize>>,
    stop: Arc<AtomicBool>,
}

/// Spawn the producer thread.
///
/// Returns the handle and the receiving end of a queue holding at most
/// `capacity` events (at least 1). The queue disconnects once the thread
/// exits.
///
/// # Errors
///
/// Returns an error if the OS cannot spawn a thread.
pub fn spawn_producer<E, F>(capacity: usize, next: F) -> io::Result<(Producer, Receiver<E>)>
where
    E: Send + 'static,
    F: FnMut() -> Option<E> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let handle = thread::Builder::new()
        .name("tor-producer".into())
        .spawn(move || produce(&tx, &stop_flag, next))?;

    debug!(capacity, "producer spawned");
    Ok((
        Producer {
            handle: Some(handle),
            stop,
        },
        rx,
    ))
}

/// The thread body. Returns how many events were sent.
fn produce<E, F>(tx: &Sender<E>, stop: &AtomicBool, mut next: F) -> usize
where
    F: FnMut() -> Option<E>,
{
    let mut sent = 0;
    while !stop.load(Ordering::Relaxed) {
        let Some(event) = next() else {
            trace!(sent, "producer source exhausted");
            break;
        };
        if tx.send(event).is_err() {
            trace!(sent, "queue receiver gone");
            break;
        }
        sent += 1;
    }
    sent
}

impl Producer {
    /// Ask the thread to stop before its next event.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// True once the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the thread and return how many events it sent.
    ///
    /// Blocks for as long as the source's `next()` blocks; call
    /// [`stop`](Self::stop) and drop the receiver first to end it
    /// promptly. Returns `None` if already joined or if the source
    /// panicked.
    pub fn join(&mut self) -> Option<usize> {
        self.handle.take().and_then(|handle| handle.join().ok())
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
