//! Time sources for request timing.
//!
//! The logger reads the clock twice per request: once before the handler
//! runs (this instant also becomes the logged timestamp) and once after.
//! Tests swap in [`FixedClock`] or [`SyntheticClock`] to make both the
//! timestamp and the elapsed time reproducible.

use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, FixedOffset, Local};

/// Produces the current instant, carrying its own UTC offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant, so every request logs `0.000`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// A clock pinned to `base` that advances with real elapsed time.
///
/// The first read returns `base` exactly and starts the stopwatch; every
/// later read returns `base` plus the wall-clock time since that first read.
#[derive(Debug)]
pub struct SyntheticClock {
    base: DateTime<FixedOffset>,
    origin: Mutex<Option<Instant>>,
}

impl SyntheticClock {
    pub fn new(base: DateTime<FixedOffset>) -> Self {
        Self {
            base,
            origin: Mutex::new(None),
        }
    }
}

impl Clock for SyntheticClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let mut origin = self.origin.lock().unwrap_or_else(|e| e.into_inner());
        match *origin {
            None => {
                *origin = Some(Instant::now());
                self.base
            }
            Some(start) => {
                let elapsed = chrono::TimeDelta::from_std(start.elapsed())
                    .unwrap_or(chrono::TimeDelta::zero());
                self.base + elapsed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn base() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2009, 11, 10, 23, 0, 0)
            .unwrap()
    }

    #[test]
    fn fixed_clock_never_moves() {
        let clock = FixedClock(base());
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn synthetic_clock_starts_at_base() {
        let clock = SyntheticClock::new(base());
        assert_eq!(clock.now(), base());
    }

    #[test]
    fn synthetic_clock_advances_with_real_time() {
        let clock = SyntheticClock::new(base());
        let start = clock.now();
        std::thread::sleep(Duration::from_millis(20));
        let end = clock.now();
        assert!(end - start >= chrono::TimeDelta::milliseconds(20));
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let before = chrono::Utc::now().timestamp();
        let now = SystemClock.now().timestamp();
        assert!(now >= before && now - before <= 1);
    }
}
