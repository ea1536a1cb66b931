//! Time sources for cycle computation
//!
//! The engine never reads the wall clock directly; it asks a [`Clock`].
//! [`SystemClock`] reports the local time, [`FixedClock`] is frozen until it
//! is explicitly moved, which is how tests step across cycle boundaries.

use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// A source of "now"
pub trait Clock: Send + Sync {
    /// Current instant, carrying the UTC offset the cycle fields are read in
    fn now(&self) -> DateTime<FixedOffset>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}

/// Wall clock in the process's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A frozen clock that only moves when told to
#[derive(Debug)]
pub struct FixedClock {
    offset: FixedOffset,
    millis: AtomicI64,
}

impl FixedClock {
    /// Freeze the clock at `at`
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self {
            offset: *at.offset(),
            millis: AtomicI64::new(at.timestamp_millis()),
        }
    }

    /// Freeze the clock at an RFC 3339 timestamp such as `2012-07-30T18:00:00-07:00`
    pub fn parse(rfc3339: &str) -> crate::Result<Self> {
        let at = DateTime::parse_from_rfc3339(rfc3339)
            .map_err(|e| crate::Error::config(format!("Invalid timestamp '{rfc3339}': {e}")))?;
        Ok(Self::new(at))
    }

    /// Move the clock forward (or backward, for a negative duration)
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    /// Jump to an absolute instant, keeping the configured offset
    pub fn set(&self, at: DateTime<FixedOffset>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let millis = self.millis.load(Ordering::SeqCst);
        self.offset
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(|| DateTime::<chrono::Utc>::MIN_UTC.with_timezone(&self.offset))
    }
}
