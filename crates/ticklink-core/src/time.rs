//! Time source for peer liveness.
//!
//! The server stamps every handshake and heartbeat with [`Clock::now`] and
//! compares those stamps against the idle timeout when sweeping. Tests
//! swap in a clock they advance by hand to make eviction deterministic.

use std::time::Instant;

/// Supplies the instants recorded as a peer's last-seen time.
pub trait Clock: Send + Sync + 'static {
    /// Current instant; successive calls must never go backwards.
    fn now(&self) -> Instant;
}

/// Monotonic wall time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
