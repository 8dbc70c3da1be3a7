use std::cmp::Ordering;

use chrono::NaiveTime;

use crate::tariff::Tier;

/// Time-of-day window, half-open: `[start, end)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub tier: Tier,
}

impl TimeWindow {
    /// Windows with `start > end` wrap past midnight. Zero-width windows never match.
    pub fn contains(&self, time: NaiveTime) -> bool {
        match self.start.cmp(&self.end) {
            Ordering::Less => (self.start <= time) && (time < self.end),
            Ordering::Greater => (time >= self.start) || (time < self.end),
            Ordering::Equal => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
