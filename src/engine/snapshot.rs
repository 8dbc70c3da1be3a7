use chrono::{DateTime, FixedOffset};
use enumset::EnumSet;
use serde::Serialize;

use crate::{
    engine::{accumulator::Totals, period::PeriodKind},
    quantity::{cost::CostRate, power::Watts, rate::KilowattHourRate},
};

/// Result of a successful tick, consumed by the display layer.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    /// Total power of all available sensors, [`None`] when none of them reported a number.
    pub total_power: Option<Watts>,

    pub current_rate: KilowattHourRate,
    pub cost_rate: CostRate,

    /// Season and tier label, for example `Summer On-Peak`.
    pub rate_period: String,

    pub hourly: Totals,
    pub daily: Totals,
    pub weekly: Totals,
    pub monthly: Totals,
    pub yearly: Totals,
    pub previous_month: Totals,

    pub last_update: DateTime<FixedOffset>,

    #[serde(skip)]
    pub rolled_over: EnumSet<PeriodKind>,
}

impl Snapshot {
    pub const fn totals(&self, kind: PeriodKind) -> Totals {
        match kind {
            PeriodKind::Hour => self.hourly,
            PeriodKind::Day => self.daily,
            PeriodKind::Week => self.weekly,
            PeriodKind::Month => self.monthly,
            PeriodKind::Year => self.yearly,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{prelude::*, quantity::Quantity};

    #[test]
    fn test_serialize() -> Result {
        let month = Totals { energy: Quantity(12.5), cost: Quantity(2.25) };
        let snapshot = Snapshot {
            total_power: None,
            current_rate: Quantity(0.23),
            cost_rate: CostRate::ZERO,
            rate_period: "Summer On-Peak".to_string(),
            hourly: Totals::ZERO,
            daily: Totals::ZERO,
            weekly: Totals::ZERO,
            monthly: month,
            yearly: month,
            previous_month: Totals::ZERO,
            last_update: DateTime::parse_from_rfc3339("2025-07-15T15:00:00-04:00")?,
            rolled_over: EnumSet::only(PeriodKind::Hour),
        };
        let value = serde_json::to_value(&snapshot)?;
        assert_eq!(value["total_power"], Value::Null);
        assert_eq!(value["current_rate"], 0.23);
        assert_eq!(value["rate_period"], "Summer On-Peak");
        assert_eq!(value["monthly"]["energy_kwh"], 12.5);
        assert_eq!(value["monthly"]["cost"], 2.25);
        assert_eq!(value["last_update"], "2025-07-15T15:00:00-04:00");
        assert!(value.get("rolled_over").is_none());
        assert_eq!(snapshot.totals(PeriodKind::Year), month);
        Ok(())
    }
}
