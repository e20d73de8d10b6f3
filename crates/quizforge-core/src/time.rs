//! Session timestamps.
//!
//! The engine stamps session start, every submission, and the end time from
//! its `Clock`. Pinning the clock makes `start_time`, `submitted_at` and
//! summary durations reproducible.

use chrono::{DateTime, Duration, Utc};

/// Where the engine reads "now" from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Wall-clock time.
    #[default]
    System,
    /// Frozen at the given instant until advanced.
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Clock::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }

    /// Step a fixed clock forward, e.g. to simulate time spent on a question.
    /// A system clock is left alone.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(at) = self {
            *at += delta;
        }
    }
}

/// Seconds after the Unix epoch of the instant returned by [`fixed_now`]
/// (2023-11-14T22:13:20Z).
const REFERENCE_SECS: i64 = 1_700_000_000;

/// A stable instant for pinned clocks in tests and benches.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(REFERENCE_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = Clock::fixed(fixed_now());
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now() - fixed_now(), Duration::seconds(90));
    }

    #[test]
    fn system_clock_ignores_advance() {
        let mut clock = Clock::default();
        clock.advance(Duration::days(365));
        assert!(clock.now() - Utc::now() < Duration::days(1));
    }

    #[test]
    fn reference_instant_is_stable() {
        assert_eq!(fixed_now().timestamp(), REFERENCE_SECS);
        assert_eq!(fixed_now().to_rfc3339(), "2023-11-14T22:13:20+00:00");
    }
}
