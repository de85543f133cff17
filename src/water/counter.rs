use serde::Serialize;
use time::Date;

/// Water intake for the current local day, bounded by `cap`.
///
/// Every operation takes today's date and rolls the counter over first when
/// the date has moved since the last reset, so a missed midnight timer never
/// leaves yesterday's value visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCounter {
    value: u32,
    cap: u32,
    last_reset: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterSnapshot {
    pub value: u32,
    pub cap: u32,
    pub remaining: u32,
    pub last_reset: Date,
}

impl DailyCounter {
    pub fn new(cap: u32, today: Date) -> Self {
        Self {
            value: 0,
            cap,
            last_reset: today,
        }
    }

    /// Rebuilds a counter from saved state; the value is clamped to the cap.
    pub fn restore(value: u32, cap: u32, last_reset: Date) -> Self {
        Self {
            value: value.min(cap),
            cap,
            last_reset,
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn last_reset(&self) -> Date {
        self.last_reset
    }

    pub fn value(&mut self, today: Date) -> u32 {
        self.roll_over(today);
        self.value
    }

    pub fn remaining(&mut self, today: Date) -> u32 {
        self.cap - self.value(today)
    }

    pub fn increment(&mut self, delta: u32, today: Date) -> u32 {
        self.roll_over(today);
        self.value = self.value.saturating_add(delta).min(self.cap);
        self.value
    }

    pub fn decrement(&mut self, delta: u32, today: Date) -> u32 {
        self.roll_over(today);
        self.value = self.value.saturating_sub(delta);
        self.value
    }

    /// Explicit zeroing; restarts the day even if the date did not change.
    pub fn reset(&mut self, today: Date) {
        self.value = 0;
        self.last_reset = today;
    }

    /// Called by the midnight timer. A no-op when the day already rolled
    /// over lazily, so a late tick cannot zero the count a second time.
    pub fn scheduled_check(&mut self, today: Date) -> bool {
        self.roll_over(today)
    }

    pub fn snapshot(&mut self, today: Date) -> CounterSnapshot {
        let value = self.value(today);
        CounterSnapshot {
            value,
            cap: self.cap,
            remaining: self.cap - value,
            last_reset: self.last_reset,
        }
    }

    fn roll_over(&mut self, today: Date) -> bool {
        if today == self.last_reset {
            return false;
        }
        self.reset(today);
        true
    }
}
