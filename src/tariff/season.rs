use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDateTime, Weekday};

use crate::tariff::{Price, Tier, day::DayRule};

#[derive(Clone, Debug, PartialEq)]
pub struct SeasonRule {
    /// Calendar months, `1..=12`.
    pub months: BTreeSet<u32>,

    pub weekday: Option<DayRule>,

    /// When absent, the weekday rule applies on weekends too.
    pub weekend: Option<DayRule>,

    /// Used when the season has no day rules at all.
    pub fallback: Tier,
}

impl SeasonRule {
    pub fn contains_month(&self, month: u32) -> bool {
        self.months.contains(&month)
    }

    pub fn resolve(&self, at: NaiveDateTime) -> Price<'_> {
        let is_weekend = matches!(at.weekday(), Weekday::Sat | Weekday::Sun);
        let day_rule = if is_weekend { self.weekend.as_ref() } else { None };
        match day_rule.or(self.weekday.as_ref()) {
            Some(day_rule) => day_rule.resolve(at.time()),
            None => self.fallback.price(),
        }
    }
}
