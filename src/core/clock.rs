//! Injectable wall-clock time source
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! Reminder times carry no zone and are read in the agent's local time. The
//! clock hands out instants in its time zone, not just an offset, so earlier
//! instants (the last dispatch) are read with the offset that applied to them.
//!
//! ## Changelog
//! - 1.1.0: Clocks carry their time zone so DST transitions keep local days intact
//! - 1.0.0: System and manual clocks

use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone};
use std::sync::Mutex;

/// Source of "now" for the scheduler
pub trait Clock: Send + Sync {
    /// Zone whose calendar days and wall-clock times reminders follow
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Self::Tz>;
}

/// Clock backed by the operating system's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to
///
/// Lets tests drive the scheduler through minute windows and calendar days
/// without waiting on real time.
#[derive(Debug)]
pub struct ManualClock<Tz: TimeZone = FixedOffset> {
    current: Mutex<DateTime<Tz>>,
}

impl<Tz: TimeZone> ManualClock<Tz> {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to an absolute instant
    pub fn set(&self, at: DateTime<Tz>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = at;
    }

    /// Move forward (or backward, with a negative duration)
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = current.clone() + by;
    }
}

impl<Tz> Clock for ManualClock<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Send,
{
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
