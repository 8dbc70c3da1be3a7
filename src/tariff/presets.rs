use std::fmt::{Display, Formatter};

use crate::{
    prelude::*,
    tariff::{RateTable, config::RateTableConfig},
};

/// Built-in rate plans.
#[derive(Debug, clap::ValueEnum, enumset::EnumSetType)]
pub enum RatePlan {
    /// Summer weekday peak 2–7 PM, flat rate outside of summer.
    SummerTou,

    /// Weekday peak 2–7 PM all year round, placeholder rates.
    SmartHours,

    /// Super off-peak overnight and on weekends, peak on weekday afternoons.
    NighttimeSavers,
}

impl Display for RatePlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SummerTou => write!(f, "Summer Time-of-Use"),
            Self::SmartHours => write!(f, "Smart Hours"),
            Self::NighttimeSavers => write!(f, "Nighttime Savers"),
        }
    }
}

impl RatePlan {
    const fn toml(self) -> &'static str {
        match self {
            Self::SummerTou => include_str!("presets/summer-tou.toml"),
            Self::SmartHours => include_str!("presets/smart-hours.toml"),
            Self::NighttimeSavers => include_str!("presets/nighttime-savers.toml"),
        }
    }

    pub fn rate_table(self) -> Result<RateTable> {
        RateTableConfig::from_toml(self.toml())
            .and_then(RateTable::try_from)
            .with_context(|| format!("invalid preset `{self}`"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use enumset::EnumSet;

    use super::*;
    use crate::quantity::rate::KilowattHourRate;

    #[test]
    fn test_all_presets_are_valid() -> Result {
        for plan in EnumSet::<RatePlan>::all() {
            let table = plan.rate_table()?;
            assert_eq!(table.seasons().count(), 2, "{plan}");
        }
        Ok(())
    }

    #[test]
    fn test_nighttime_savers_tiers() -> Result {
        let table = RatePlan::NighttimeSavers.rate_table()?;
        let tuesday = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();

        let price = table.resolve(tuesday.and_hms_opt(3, 0, 0).unwrap());
        assert_eq!((price.rate, price.label), (KilowattHourRate::from(0.141), "Super Off-Peak"));

        let price = table.resolve(tuesday.and_hms_opt(10, 0, 0).unwrap());
        assert_eq!((price.rate, price.label), (KilowattHourRate::from(0.168), "Off-Peak"));

        let price = table.resolve(tuesday.and_hms_opt(16, 0, 0).unwrap());
        assert_eq!((price.rate, price.label), (KilowattHourRate::from(0.169), "On-Peak"));

        // The last window ends at 23:59, the final minute is off-peak:
        let price = table.resolve(tuesday.and_hms_opt(23, 59, 30).unwrap());
        assert_eq!(price.label, "Off-Peak");
        Ok(())
    }

    #[test]
    fn test_smart_hours_winter_peak() -> Result {
        let table = RatePlan::SmartHours.rate_table()?;
        let wednesday = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(15, 0, 0).unwrap();
        assert_eq!(table.resolve(wednesday).label, "Peak");
        assert_eq!(table.season_name(wednesday), "Winter");
        Ok(())
    }
}
