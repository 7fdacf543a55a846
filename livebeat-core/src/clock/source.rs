//! Pacing for the clock thread.
//!
//! The clock never sleeps directly: between ticks it asks its
//! [`TimeSource`] to wait one step interval. [`SystemTime`] waits on real
//! deadlines, [`VirtualTime`] returns at once so tests run at full speed.

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Messages to a running clock thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    Stop,
}

/// Decides how long the clock thread waits between ticks
pub trait TimeSource: Send + Sync + 'static {
    /// Wait one step of `interval`. Returns `false` when the thread should
    /// exit (stop signal received or channel closed).
    fn wait(&self, interval: Duration, signals: &Receiver<ClockSignal>) -> bool;

    /// Called when the clock (re)starts
    fn restart(&self) {}
}

/// Wall-clock pacing with drift-free deadlines
#[derive(Debug, Default)]
pub struct SystemTime {
    deadline: Mutex<Option<Instant>>,
}

impl SystemTime {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for SystemTime {
    fn wait(&self, interval: Duration, signals: &Receiver<ClockSignal>) -> bool {
        let deadline = {
            let mut deadline = self.deadline.lock();
            let now = Instant::now();
            let next = match *deadline {
                // Deadlines accumulate so rounding never drifts
                Some(previous) if previous + interval + interval > now => previous + interval,
                // Fell behind by more than a step (or first wait): resync
                _ => now + interval,
            };
            *deadline = Some(next);
            next
        };

        match signals.recv_deadline(deadline) {
            Err(RecvTimeoutError::Timeout) => true,
            Ok(ClockSignal::Stop) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn restart(&self) {
        *self.deadline.lock() = None;
    }
}

/// Logical time: never sleeps, optionally stops after a number of ticks
#[derive(Debug)]
pub struct VirtualTime {
    ticks: AtomicU64,
    limit: Option<u64>,
}

impl VirtualTime {
    /// Tick as fast as possible until stopped
    pub fn unlimited() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            limit: None,
        }
    }

    /// Let the clock thread run exactly `ticks` ticks, then exit
    pub fn limited(ticks: u64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            limit: Some(ticks),
        }
    }

    /// Ticks completed so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }
}

impl TimeSource for VirtualTime {
    fn wait(&self, _interval: Duration, signals: &Receiver<ClockSignal>) -> bool {
        let ticks = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        if self.limit.is_some_and(|limit| ticks >= limit) {
            return false;
        }
        thread::yield_now();
        match signals.try_recv() {
            Err(TryRecvError::Empty) => true,
            Ok(ClockSignal::Stop) | Err(TryRecvError::Disconnected) => false,
        }
    }
}
