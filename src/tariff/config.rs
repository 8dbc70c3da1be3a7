use std::{collections::BTreeMap, fs, path::Path};

use chrono::NaiveTime;
use itertools::Itertools;
use serde::Deserialize;

use crate::{
    prelude::*,
    quantity::rate::KilowattHourRate,
    tariff::{RateTable, Tier, day::DayRule, season::SeasonRule, window::TimeWindow},
};

/// Free-form rate table as written in TOML: season name → season.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct RateTableConfig(pub BTreeMap<String, SeasonConfig>);

#[derive(Clone, Debug, Deserialize)]
pub struct SeasonConfig {
    pub months: Vec<u32>,

    #[serde(default)]
    pub weekday: Option<DayConfig>,

    #[serde(default)]
    pub weekend: Option<DayConfig>,

    #[serde(default)]
    pub default_rate: KilowattHourRate,

    #[serde(default = "SeasonConfig::default_name")]
    pub default_name: String,
}

impl SeasonConfig {
    fn default_name() -> String {
        "Standard".to_string()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DayConfig {
    #[serde(default)]
    pub periods: Vec<PeriodConfig>,

    #[serde(default)]
    pub default_rate: KilowattHourRate,

    #[serde(default = "DayConfig::default_name")]
    pub default_name: String,
}

impl DayConfig {
    fn default_name() -> String {
        "Off-Peak".to_string()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PeriodConfig {
    pub name: String,

    #[serde(deserialize_with = "hours_minutes::deserialize")]
    pub start: NaiveTime,

    #[serde(deserialize_with = "hours_minutes::deserialize")]
    pub end: NaiveTime,

    pub rate: KilowattHourRate,
}

impl RateTableConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse the rate table")
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read the rate table from `{}`", path.display()))?;
        Self::from_toml(&text)
    }
}

impl TryFrom<RateTableConfig> for RateTable {
    type Error = Error;

    fn try_from(config: RateTableConfig) -> Result<Self> {
        ensure!(!config.0.is_empty(), "the rate table has no seasons");

        let seasons = config
            .0
            .into_iter()
            .map(|(name, season)| {
                let rule = SeasonRule::try_from(season)
                    .with_context(|| format!("invalid season `{name}`"))?;
                Ok((name, rule))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        for month in 1..=12 {
            let owners = seasons
                .iter()
                .filter(|(_, season)| season.contains_month(month))
                .map(|(name, _)| name)
                .collect_vec();
            match owners.as_slice() {
                [_] => {}
                [] => bail!("month {month} is not covered by any season"),
                _ => bail!("month {month} is covered by several seasons: {}", owners.iter().join(", ")),
            }
        }

        Ok(Self { seasons })
    }
}

impl TryFrom<SeasonConfig> for SeasonRule {
    type Error = Error;

    fn try_from(config: SeasonConfig) -> Result<Self> {
        for month in &config.months {
            ensure!((1..=12).contains(month), "month {month} is out of range");
        }
        ensure!(
            config.months.iter().all_unique(),
            "months are listed more than once: {:?}",
            config.months,
        );
        Ok(Self {
            months: config.months.into_iter().collect(),
            weekday: config.weekday.map(DayRule::try_from).transpose().context("invalid weekday")?,
            weekend: config.weekend.map(DayRule::try_from).transpose().context("invalid weekend")?,
            fallback: Tier::try_new(config.default_rate, config.default_name)?,
        })
    }
}

impl TryFrom<DayConfig> for DayRule {
    type Error = Error;

    fn try_from(config: DayConfig) -> Result<Self> {
        let windows = config
            .periods
            .into_iter()
            .map(|period| {
                let window = TimeWindow {
                    start: period.start,
                    end: period.end,
                    tier: Tier::try_new(period.rate, period.name)?,
                };
                ensure!(
                    !window.is_empty(),
                    "period `{}` starts and ends at {}",
                    window.tier.label,
                    window.start.format("%H:%M"),
                );
                Ok(window)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { windows, default: Tier::try_new(config.default_rate, config.default_name)? })
    }
}

impl Tier {
    fn try_new(rate: KilowattHourRate, label: String) -> Result<Self> {
        ensure!(
            rate.is_finite() && rate >= KilowattHourRate::ZERO,
            "rate for `{label}` must be a non-negative number, got {rate:?}",
        );
        Ok(Self::new(rate, label))
    }
}

/// `HH:MM` time of day, optionally with seconds.
mod hours_minutes {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, de};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S"))
            .map_err(|error| de::Error::custom(format!("invalid time `{text}`: {error}")))
    }
}
