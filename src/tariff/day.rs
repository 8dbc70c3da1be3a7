use chrono::NaiveTime;

use crate::tariff::{Price, Tier, window::TimeWindow};

/// Pricing for one day type: windows are checked in the declared order, first match wins.
#[derive(Clone, Debug, PartialEq)]
pub struct DayRule {
    pub windows: Vec<TimeWindow>,
    pub default: Tier,
}

impl DayRule {
    pub fn resolve(&self, time: NaiveTime) -> Price<'_> {
        self.windows
            .iter()
            .find(|window| window.contains(time))
            .map_or_else(|| self.default.price(), |window| window.tier.price())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::rate::KilowattHourRate;

    fn window(start: u32, end: u32, rate: f64, label: &str) -> TimeWindow {
        TimeWindow {
            start: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            tier: Tier::new(KilowattHourRate::from(rate), label),
        }
    }

    #[test]
    fn test_first_declared_window_wins() {
        let rule = DayRule {
            windows: vec![window(12, 18, 0.3, "First"), window(14, 16, 0.5, "Second")],
            default: Tier::new(KilowattHourRate::from(0.1), "Off-Peak"),
        };
        let price = rule.resolve(NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(price.label, "First");
        assert_eq!(price.rate, KilowattHourRate::from(0.3));
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let rule = DayRule {
            windows: vec![window(14, 19, 0.23, "On-Peak")],
            default: Tier::new(KilowattHourRate::from(0.178), "Off-Peak"),
        };
        let price = rule.resolve(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(price, Price { rate: KilowattHourRate::from(0.178), label: "Off-Peak" });
    }
}
