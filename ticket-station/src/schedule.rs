//! Polling cadence schedule
//!
//! The remote ledger is rate limited, so the poll interval follows
//! the counter's opening hours: short while staff are at the counter,
//! a minute in the shoulder windows, an hour overnight. Pure mapping
//! from wall-clock time, no state.

use chrono::{NaiveTime, Timelike};
use std::time::Duration;

/// Polling cadence for one wall-clock window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCadence {
    /// Counter open, staff present
    Busy,
    /// Opening / closing shoulder, midday break
    Transition,
    /// Overnight
    Idle,
}

impl PollCadence {
    /// Map a wall-clock time to its cadence
    ///
    /// Busy: 08:00-12:30 and 14:30-19:00. Transition: one hour on
    /// each side of the busy blocks plus the midday break. Idle:
    /// everything else.
    pub fn at(time: NaiveTime) -> Self {
        let m = time.hour() * 60 + time.minute();

        let busy = (in_window(m, 8 * 60, 12 * 60 + 30)) || in_window(m, 14 * 60 + 30, 19 * 60);
        if busy {
            return PollCadence::Busy;
        }

        let transition = in_window(m, 7 * 60, 8 * 60)
            || in_window(m, 12 * 60 + 30, 14 * 60 + 30)
            || in_window(m, 19 * 60, 20 * 60);
        if transition {
            return PollCadence::Transition;
        }

        PollCadence::Idle
    }

    /// Poll interval for this cadence
    pub fn interval(&self) -> Duration {
        match self {
            PollCadence::Busy => Duration::from_secs(4),
            PollCadence::Transition => Duration::from_secs(60),
            PollCadence::Idle => Duration::from_secs(3600),
        }
    }

    /// Cadence for the current local time
    pub fn now() -> Self {
        Self::at(chrono::Local::now().time())
    }
}

/// Half-open minute window [start, end)
fn in_window(minute: u32, start: u32, end: u32) -> bool {
    minute >= start && minute < end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> PollCadence {
        PollCadence::at(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_busy_windows() {
        assert_eq!(at(8, 0), PollCadence::Busy);
        assert_eq!(at(10, 15), PollCadence::Busy);
        assert_eq!(at(12, 29), PollCadence::Busy);
        assert_eq!(at(14, 30), PollCadence::Busy);
        assert_eq!(at(18, 59), PollCadence::Busy);
    }

    #[test]
    fn test_transition_windows() {
        assert_eq!(at(7, 0), PollCadence::Transition);
        assert_eq!(at(7, 59), PollCadence::Transition);
        assert_eq!(at(12, 30), PollCadence::Transition);
        assert_eq!(at(13, 45), PollCadence::Transition);
        assert_eq!(at(19, 0), PollCadence::Transition);
        assert_eq!(at(19, 59), PollCadence::Transition);
    }

    #[test]
    fn test_idle_windows() {
        assert_eq!(at(20, 0), PollCadence::Idle);
        assert_eq!(at(23, 59), PollCadence::Idle);
        assert_eq!(at(0, 0), PollCadence::Idle);
        assert_eq!(at(6, 59), PollCadence::Idle);
    }

    #[test]
    fn test_intervals_ordered() {
        assert!(PollCadence::Busy.interval() < Duration::from_secs(5));
        assert!(PollCadence::Busy.interval() < PollCadence::Transition.interval());
        assert!(PollCadence::Transition.interval() < PollCadence::Idle.interval());
    }
}
