//! Millisecond clock and the one-shot timer set the schedule controller
//! arms. Timers are plain deadlines polled by the driver loop, so tests
//! drive the controller synchronously with a manual clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic millisecond clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Real clock, counting from process start.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Hand-advanced clock for tests.
#[derive(Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}

/// The one-shot timers the controller arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Post-reveal settle delay before the first detection pass.
    Settle,
    /// Backoff before the confirmation pass.
    SecondPass,
    /// Periodic baseline refresh while visible.
    Heartbeat,
    /// Overlay auto-hide deadline.
    OverlayHide,
}

/// Pending deadlines, at most one per kind; re-arming replaces it.
#[derive(Default)]
pub struct Timers {
    deadlines: HashMap<TimerKind, u64>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: TimerKind, now_ms: u64, delay_ms: u64) {
        self.deadlines.insert(kind, now_ms.saturating_add(delay_ms));
    }

    /// Returns whether a deadline was actually pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines.remove(&kind).is_some()
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Deadlines at or past `now_ms`, earliest first. Due timers are
    /// removed; periodic behavior is the caller re-arming.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<TimerKind> {
        let mut due: Vec<(u64, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|&(_, &at)| at <= now_ms)
            .map(|(&k, &at)| (at, k))
            .collect();
        due.sort();
        for (_, kind) in &due {
            self.deadlines.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }

    /// Milliseconds until the nearest deadline; zero when one is due.
    pub fn until_next(&self, now_ms: u64) -> Option<u64> {
        self.deadlines.values().map(|&at| at.saturating_sub(now_ms)).min()
    }
}
