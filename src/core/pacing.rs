//! Loop pacing primitives.
//!
//! The pipeline has two distinct reasons to suspend and they get two distinct
//! types: [`Ticker`] paces the time-driven generator loop at a fixed cadence,
//! and [`Poller`] is the bounded wait the consumer uses when no new data is
//! available. Keeping them separate keeps tick cadence independent from I/O
//! readiness.

use std::thread;
use std::time::{Duration, Instant};

/// Fixed-interval periodic task driver.
///
/// Deadline-based: each wait targets `previous deadline + period`, so time
/// spent doing work between ticks does not stretch the cadence. If a deadline
/// has already passed (a tick overran its budget), the ticker resynchronizes
/// from now rather than firing a burst of catch-up ticks.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// Ticker firing `rate_hz` times per second.
    ///
    /// `rate_hz` must be finite and positive; config validation enforces
    /// this before a ticker is ever built.
    #[must_use]
    pub fn from_rate_hz(rate_hz: f64) -> Self {
        let period = Duration::from_secs_f64(1.0 / rate_hz);
        Self::new(period)
    }

    /// Ticker with an explicit period.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// The tick interval `dt`.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Sleep until the next deadline, then advance it by one period.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if now < self.next {
            thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            // Overran the deadline: resynchronize, no burst.
            self.next = Instant::now() + self.period;
        }
    }
}

/// Bounded wait for I/O readiness: a plain fixed-interval pause.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
}

impl Poller {
    /// Poller sleeping `interval` between readiness checks.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The poll interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep one poll interval.
    pub fn pause(&self) {
        thread::sleep(self.interval);
    }
}
