// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! Every subsystem that measures durations or stamps events takes a
//! `C: Clock` type parameter rather than calling `Instant::now()`/
//! `SystemTime::now()` directly, so tests can swap in [`FakeClock`] and
//! advance time deterministically instead of sleeping real wall-clock time.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A source of "now", in both monotonic ([`Instant`]) and wall-clock
/// (epoch milliseconds) form.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic time, for measuring elapsed durations.
    fn now(&self) -> Instant;
    /// Wall-clock time as milliseconds since the Unix epoch, for
    /// timestamps that get serialized and compared across process
    /// restarts.
    fn epoch_ms(&self) -> u64;
}

/// The real clock, backed by the operating system.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        elapsed.as_millis() as u64
    }
}

struct ClockState {
    instant: Instant,
    epoch_ms: u64,
}

/// A clock a test can advance by hand instead of sleeping.
///
/// Starts at an arbitrary but fixed epoch (`1_000_000` ms) rather than
/// `0`, so tests exercising "time since epoch" arithmetic don't
/// accidentally pass against an unrealistic zero baseline.
#[derive(Clone)]
pub struct FakeClock {
    state: Arc<Mutex<ClockState>>,
}

impl FakeClock {
    pub fn new() -> Self {
        let state = ClockState { instant: Instant::now(), epoch_ms: 1_000_000 };
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Moves both the monotonic and epoch views forward by `duration` in
    /// lockstep, so the two never drift relative to each other.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.instant += duration;
        state.epoch_ms += duration.as_millis() as u64;
    }

    /// Pins the epoch-milliseconds view to an exact value, independent of
    /// the monotonic clock, for tests asserting against a specific
    /// timestamp.
    pub fn set_epoch_ms(&self, ms: u64) {
        self.state.lock().epoch_ms = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.state.lock().instant
    }

    fn epoch_ms(&self) -> u64 {
        self.state.lock().epoch_ms
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
