use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of time for a session.
///
/// `now` is monotonic and only meaningful relative to other readings from the
/// same clock; `wall` is used for the `last played` timestamp.
pub trait Clock {
    fn now(&self) -> Duration;
    fn wall(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    elapsed_ms: Rc<Cell<u64>>,
    epoch: DateTime<Utc>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            elapsed_ms: Rc::new(Cell::new(0)),
            epoch: Utc::now(),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed_ms
            .set(self.elapsed_ms.get() + by.as_millis() as u64);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.get())
    }

    fn wall(&self) -> DateTime<Utc> {
        self.epoch + ChronoDuration::milliseconds(self.elapsed_ms.get() as i64)
    }
}
