use chrono::{DateTime, TimeDelta, TimeZone};

use crate::{
    engine::{
        accumulator::{Periods, Totals, kinds},
        period::PeriodKind,
    },
    prelude::*,
    quantity::{energy::KilowattHours, power::{Kilowatts, Watts}, rate::KilowattHourRate},
};

/// Last known power reading, the left edge of the next integration interval.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<Tz: TimeZone> {
    pub power: Watts,
    pub timestamp: DateTime<Tz>,
}

impl<Tz: TimeZone> Sample<Tz> {
    /// Trapezoidal integration of the power up to the next reading.
    pub fn energy_until(&self, power: Watts, timestamp: &DateTime<Tz>) -> Result<KilowattHours> {
        let elapsed = timestamp.clone() - self.timestamp.clone();
        if elapsed < TimeDelta::zero() {
            warn!(?elapsed, "clock moved backwards, skipping the interval");
            return Ok(KilowattHours::ZERO);
        }
        let energy = Kilowatts::from((self.power + power) * 0.5) * elapsed;
        ensure!(energy.is_finite(), "energy delta is not finite: {energy:?}");
        Ok(energy)
    }
}

/// Everything the engine accumulates for a tracked entity.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct AccumulationState<Tz: TimeZone> {
    pub last_sample: Option<Sample<Tz>>,
    pub periods: Periods<Tz>,

    /// Month totals captured at the last month rollover.
    pub previous_month: Totals,
}

impl<Tz: TimeZone> AccumulationState<Tz> {
    pub fn fresh(now: &DateTime<Tz>) -> Self {
        Self { last_sample: None, periods: Periods::starting_at(now), previous_month: Totals::ZERO }
    }

    /// Integrate the interval since the last sample, roll the periods over,
    /// and add the interval to every period.
    ///
    /// The whole interval is priced at `rate` and goes into the post-rollover periods.
    pub fn advance(
        &mut self,
        now: &DateTime<Tz>,
        power: Option<Watts>,
        rate: KilowattHourRate,
    ) -> Result<Advance> {
        let delta = match (&self.last_sample, power) {
            (Some(last_sample), Some(power)) => {
                let energy = last_sample.energy_until(power, now)?;
                Totals { energy, cost: energy * rate }
            }
            _ => Totals::ZERO,
        };
        if let Some(power) = power {
            self.last_sample = Some(Sample { power, timestamp: now.clone() });
        }

        let rolled_over = self.periods.roll_over(now);
        if let Some((_, month)) = rolled_over.iter().find(|(kind, _)| *kind == PeriodKind::Month) {
            self.previous_month = *month;
        }
        self.periods.add(delta);

        Ok(Advance { delta, rolled_over: kinds(&rolled_over) })
    }
}

/// Outcome of a single [`AccumulationState::advance`].
#[derive(Copy, Clone, Debug)]
pub struct Advance {
    pub delta: Totals,
    pub rolled_over: enumset::EnumSet<PeriodKind>,
}
