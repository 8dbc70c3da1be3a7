//! Time-of-use rate resolution.
//!
//! A [`RateTable`] maps a local wall-clock timestamp to a per-kilowatt-hour price through
//! the season that owns the month, the day type (weekday or weekend), and the first matching
//! time window of that day. Resolution is a pure function of the timestamp and the table.

pub mod config;
pub mod day;
pub mod presets;
pub mod season;
pub mod window;

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};

use crate::{prelude::*, quantity::rate::KilowattHourRate, tariff::season::SeasonRule};

/// Rate with its human-readable label, for example «On-Peak».
#[derive(Clone, Debug, PartialEq)]
pub struct Tier {
    pub rate: KilowattHourRate,
    pub label: String,
}

impl Tier {
    pub fn new(rate: KilowattHourRate, label: impl Into<String>) -> Self {
        Self { rate, label: label.into() }
    }

    pub fn price(&self) -> Price<'_> {
        Price { rate: self.rate, label: &self.label }
    }
}

/// Resolved price at a specific moment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Price<'a> {
    pub rate: KilowattHourRate,
    pub label: &'a str,
}

impl Price<'_> {
    pub const UNKNOWN: Price<'static> = Price { rate: KilowattHourRate::ZERO, label: "Unknown" };
}

/// Validated rate table: every calendar month belongs to exactly one season.
///
/// Construct it through [`TryFrom<config::RateTableConfig>`] or [`presets::RatePlan`].
#[derive(Clone, Debug)]
pub struct RateTable {
    seasons: BTreeMap<String, SeasonRule>,
}

impl RateTable {
    pub const UNKNOWN_SEASON: &'static str = "Unknown";

    pub fn seasons(&self) -> impl Iterator<Item = (&str, &SeasonRule)> {
        self.seasons.iter().map(|(name, season)| (name.as_str(), season))
    }

    fn season(&self, month: u32) -> Option<(&str, &SeasonRule)> {
        self.seasons().find(|(_, season)| season.contains_month(month))
    }

    /// Resolve the rate and its label at the local wall-clock time.
    pub fn resolve(&self, at: NaiveDateTime) -> Price<'_> {
        match self.season(at.month()) {
            Some((_, season)) => season.resolve(at),
            None => {
                error!(month = at.month(), "no season covers the month");
                Price::UNKNOWN
            }
        }
    }

    /// Name of the season that owns the timestamp's month.
    pub fn season_name(&self, at: NaiveDateTime) -> &str {
        self.season(at.month()).map_or(Self::UNKNOWN_SEASON, |(name, _)| name)
    }
}
