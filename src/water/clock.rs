use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use time::{Date, OffsetDateTime, UtcOffset};

/// Wall clock in the user's local offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// A clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: time::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Time left until the next local midnight after `now`.
pub fn until_next_midnight(now: OffsetDateTime) -> Duration {
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    let Some(tomorrow) = now.date().next_day() else {
        return DAY;
    };
    let midnight = tomorrow.midnight().assume_offset(now.offset());
    Duration::try_from(midnight - now).unwrap_or(DAY)
}
