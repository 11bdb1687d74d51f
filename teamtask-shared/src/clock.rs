//! Time source abstraction
//!
//! Services never read the system clock directly. They receive a [`Clock`]
//! at construction so "now", "today" and "24 hours ago" are deterministic
//! under test.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, Offset, Utc};
use std::fmt;

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant in UTC
    fn now(&self) -> DateTime<Utc>;

    /// Current instant in the server's local time zone
    fn local_now(&self) -> DateTime<FixedOffset>;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock frozen at one instant, observed from a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Frozen at `now`, with a UTC local zone
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.now.with_timezone(&self.offset)
    }
}

/// The local calendar day containing `local_now`, as a half-open UTC range
///
/// Returns `[local midnight, local midnight + 24h)`.
pub fn local_day_window(local_now: DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    let since_midnight = local_now.time().signed_duration_since(NaiveTime::MIN);
    let start = (local_now - since_midnight).with_timezone(&Utc);

    (start, start + Duration::hours(24))
}
