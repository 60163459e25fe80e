use time::OffsetDateTime;

use crate::Error;

// Electricity cost accumulated since local midnight, in the home's currency
// Only ever grows during a day, and resets to zero at midnight
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Cost(f64);

impl Cost {
    pub fn new(value: f64) -> Self {
        Self(value)
    }
}

impl From<Cost> for f64 {
    fn from(value: Cost) -> f64 {
        value.0
    }
}

// Spending rate in currency per hour
// Can be negative when the accumulated cost resets between two samples
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct BurnRate(f64);

impl BurnRate {
    pub fn new(value: f64) -> Self {
        Self(value)
    }
}

impl From<BurnRate> for f64 {
    fn from(value: BurnRate) -> f64 {
        value.0
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct CostSample {
    pub timestamp: OffsetDateTime,
    pub accumulated_cost: Cost,
}

impl CostSample {
    pub fn new(timestamp: OffsetDateTime, accumulated_cost: Cost) -> Self {
        Self {
            timestamp,
            accumulated_cost,
        }
    }
}

/// Hours of the day during which the alarm stays silent.
///
/// An hour is quiet when it is after `quiet_after` or before `quiet_before`,
/// so the alarm may only fire from `quiet_before` up to and including
/// `quiet_after`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct QuietWindow {
    quiet_after: u8,
    quiet_before: u8,
}

impl QuietWindow {
    pub fn new(quiet_after: u8, quiet_before: u8) -> Result<Self, Error> {
        for hour in [quiet_after, quiet_before] {
            if hour > 23 {
                return Err(Error::InvalidHour(hour));
            }
        }
        Ok(Self {
            quiet_after,
            quiet_before,
        })
    }

    pub fn quiet_after(&self) -> u8 {
        self.quiet_after
    }

    pub fn quiet_before(&self) -> u8 {
        self.quiet_before
    }

    pub fn is_quiet(&self, hour: u8) -> bool {
        hour > self.quiet_after || hour < self.quiet_before
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct TriggerState {
    pub last_trigger: Option<OffsetDateTime>,
}

impl TriggerState {
    pub fn triggered_at(instant: OffsetDateTime) -> Self {
        Self {
            last_trigger: Some(instant),
        }
    }
}
