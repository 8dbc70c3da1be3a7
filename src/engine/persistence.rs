use chrono::{DateTime, TimeZone};

use crate::{
    engine::{
        accumulator::{PeriodAccumulator, Periods, Totals},
        period::PeriodKind,
        state::{AccumulationState, Sample},
    },
    prelude::*,
    quantity::{Quantity, power::Watts},
    store::Blob,
};

const PREVIOUS_MONTH: &str = "previous_month";
const PREVIOUS_POWER: &str = "previous_power";
const PREVIOUS_TIMESTAMP: &str = "previous_timestamp";

impl<Tz: TimeZone> AccumulationState<Tz> {
    pub fn to_blob(&self) -> Blob {
        let mut blob = Blob::default();
        for (kind, accumulator) in self.periods.iter() {
            insert_totals(&mut blob, kind.key(), accumulator.totals);
            blob.insert(format!("{}_start", kind.key()), accumulator.start.fixed_offset().to_rfc3339());
        }
        insert_totals(&mut blob, PREVIOUS_MONTH, self.previous_month);
        if let Some(last_sample) = &self.last_sample {
            blob.insert(PREVIOUS_POWER, last_sample.power.0);
            blob.insert(PREVIOUS_TIMESTAMP, last_sample.timestamp.fixed_offset().to_rfc3339());
        }
        blob
    }

    /// Rebuild the state persisted by [`AccumulationState::to_blob`].
    ///
    /// Each accumulator is restored only if it is anchored at the period containing `now`,
    /// otherwise it starts from zero. The previous month and the last sample are always restored.
    pub fn restored(blob: &Blob, now: &DateTime<Tz>) -> Self {
        let mut periods = Periods::starting_at(now);
        for kind in PeriodKind::ALL {
            match restore_accumulator(blob, kind, now) {
                Some(accumulator) => {
                    debug!(%kind, energy = ?accumulator.totals.energy, "restored");
                    periods[kind] = accumulator;
                }
                None => {
                    info!(%kind, "the persisted period has expired or is missing, starting from zero");
                }
            }
        }
        let previous_month = get_totals(blob, PREVIOUS_MONTH).unwrap_or_default();
        let last_sample = blob
            .get_f64(PREVIOUS_POWER)
            .zip(get_timestamp(blob, PREVIOUS_TIMESTAMP, &now.timezone()))
            .map(|(power, timestamp)| Sample { power: Watts(power), timestamp });
        Self { last_sample, periods, previous_month }
    }
}

fn restore_accumulator<Tz: TimeZone>(
    blob: &Blob,
    kind: PeriodKind,
    now: &DateTime<Tz>,
) -> Option<PeriodAccumulator<Tz>> {
    let start = get_timestamp(blob, &format!("{}_start", kind.key()), &now.timezone())?;
    if start != kind.anchor(now) {
        return None;
    }
    let totals = get_totals(blob, kind.key())?;
    Some(PeriodAccumulator { totals, start })
}

fn insert_totals(blob: &mut Blob, prefix: &str, totals: Totals) {
    blob.insert(format!("{prefix}_energy"), totals.energy.0);
    blob.insert(format!("{prefix}_cost"), totals.cost.0);
}

fn get_totals(blob: &Blob, prefix: &str) -> Option<Totals> {
    Some(Totals {
        energy: Quantity(blob.get_f64(&format!("{prefix}_energy"))?),
        cost: Quantity(blob.get_f64(&format!("{prefix}_cost"))?),
    })
}

fn get_timestamp<Tz: TimeZone>(blob: &Blob, key: &str, timezone: &Tz) -> Option<DateTime<Tz>> {
    let value = blob.get_str(key)?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(timestamp) => Some(timestamp.with_timezone(timezone)),
        Err(error) => {
            warn!(key, value, "malformed timestamp: {error:#}");
            None
        }
    }
}
