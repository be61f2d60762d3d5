//! Cooperative cancellation for session loops.
//!
//! Loops check [`StopToken::is_stopped`] once per iteration and sleep
//! through [`StopToken::wait`], which returns early once the token fires.
//! Firing drops the only sender of an unused channel, which wakes every
//! blocked `recv_timeout` at once.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

#[derive(Debug)]
struct Inner {
    stopped: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

/// Shared stop flag plus a wake-up signal for sleeping loops.
#[derive(Debug, Clone)]
pub struct StopToken {
    inner: Arc<Inner>,
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl StopToken {
    /// Creates a token that has not fired.
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                stopped: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Fires the token. Returns true for the call that actually fired it.
    pub fn stop(&self) -> bool {
        let first = !self.inner.stopped.swap(true, Ordering::SeqCst);
        self.inner.trigger.lock().unwrap_or_else(PoisonError::into_inner).take();
        first
    }

    /// Returns true once the token has fired.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Sleeps for `timeout` or until the token fires. Returns true if it fired.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.inner.signal.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_stopped(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}
