//! Energy and cost accumulation.
//!
//! The [`Engine`] integrates the total sensor power over time, prices every interval against
//! the rate table, and keeps running totals for the hour, day, week, month, and year.
//! The accumulated state is persisted after every tick and restored on the first tick after start.

pub mod accumulator;
pub mod period;
pub mod persistence;
pub mod snapshot;
pub mod state;

use chrono::{DateTime, Local, TimeZone};

use crate::{
    engine::{
        period::PeriodKind,
        snapshot::Snapshot,
        state::{AccumulationState, Advance},
    },
    prelude::*,
    quantity::{cost::CostRate, power::Kilowatts},
    sensor::{PowerSource, total_power},
    store::Store,
    tariff::RateTable,
};

#[must_use]
pub struct Engine<S, Tz: TimeZone = Local> {
    key: String,
    rate_table: RateTable,
    sensors: Vec<String>,
    store: S,

    /// [`None`] until the first tick restores it.
    state: Option<AccumulationState<Tz>>,
}

impl<S: Store, Tz: TimeZone> Engine<S, Tz> {
    pub fn new(entry_id: &str, rate_table: RateTable, sensors: Vec<String>, store: S) -> Self {
        Self { key: format!("energy_cost_state_{entry_id}"), rate_table, sensors, store, state: None }
    }

    /// Replace the power sensors, effective from the next tick.
    #[cfg(test)]
    pub fn set_sensors(&mut self, sensors: Vec<String>) {
        self.sensors = sensors;
    }

    #[cfg(test)]
    pub const fn state(&self) -> Option<&AccumulationState<Tz>> {
        self.state.as_ref()
    }

    /// Advance the accumulation to `now`.
    ///
    /// A failed tick leaves the state as it was before the call.
    /// Failing to persist the state is logged but does not fail the tick.
    #[instrument(skip_all, fields(key = %self.key))]
    pub async fn tick(&mut self, now: DateTime<Tz>, source: &impl PowerSource) -> Result<Snapshot> {
        let current = match self.state.take() {
            Some(state) => state,
            None => self.restore(&now).await,
        };
        let mut next = current.clone();
        match self.advance(&mut next, &now, source) {
            Ok(snapshot) => {
                self.state = Some(next);
                self.persist().await;
                Ok(snapshot)
            }
            Err(error) => {
                self.state = Some(current);
                error!("update failed: {error:#}");
                Err(error.context("update failed"))
            }
        }
    }

    fn advance(
        &self,
        state: &mut AccumulationState<Tz>,
        now: &DateTime<Tz>,
        source: &impl PowerSource,
    ) -> Result<Snapshot> {
        let total_power = total_power(source, &self.sensors);
        let local = now.naive_local();
        let price = self.rate_table.resolve(local);
        let season = self.rate_table.season_name(local);

        let Advance { delta, rolled_over } = state.advance(now, total_power, price.rate)?;
        let cost_rate =
            total_power.map_or(CostRate::ZERO, |power| Kilowatts::from(power) * price.rate);
        debug!(
            ?total_power,
            rate = ?price.rate,
            label = price.label,
            energy = ?delta.energy,
            cost = ?delta.cost,
            "ticked",
        );

        Ok(Snapshot {
            total_power,
            current_rate: price.rate,
            cost_rate,
            rate_period: format!("{season} {}", price.label),
            hourly: state.periods.totals(PeriodKind::Hour),
            daily: state.periods.totals(PeriodKind::Day),
            weekly: state.periods.totals(PeriodKind::Week),
            monthly: state.periods.totals(PeriodKind::Month),
            yearly: state.periods.totals(PeriodKind::Year),
            previous_month: state.previous_month,
            last_update: now.fixed_offset(),
            rolled_over,
        })
    }

    /// Load the persisted state, falling back to a fresh one.
    #[instrument(skip_all, name = "Restoring the state…")]
    async fn restore(&self, now: &DateTime<Tz>) -> AccumulationState<Tz> {
        match self.store.load(&self.key).await {
            Ok(Some(blob)) => {
                info!("restoring the persisted state");
                AccumulationState::restored(&blob, now)
            }
            Ok(None) => {
                info!("no persisted state, starting fresh");
                AccumulationState::fresh(now)
            }
            Err(error) => {
                error!("failed to load the state, starting fresh: {error:#}");
                AccumulationState::fresh(now)
            }
        }
    }

    async fn persist(&self) {
        let Some(state) = &self.state else {
            return;
        };
        if let Err(error) = self.store.save(&self.key, &state.to_blob()).await {
            error!("failed to save the state: {error:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{TimeDelta, Utc};
    use enumset::EnumSet;

    use super::*;
    use crate::{
        engine::{accumulator::Totals, state::Sample},
        quantity::{Quantity, power::Watts},
        sensor::{Reading, StateCache},
        store::{Blob, MemoryStore},
        tariff::presets::RatePlan,
    };

    const KEY: &str = "energy_cost_state_test";

    fn engine(store: MemoryStore) -> Result<Engine<MemoryStore, Utc>> {
        Ok(Engine::new(
            "test",
            RatePlan::SummerTou.rate_table()?,
            vec!["sensor.house".to_string(), "sensor.garage".to_string()],
            store,
        ))
    }

    fn cache(house: Reading, garage: Reading) -> StateCache {
        StateCache::from([
            ("sensor.house".to_string(), house),
            ("sensor.garage".to_string(), garage),
        ])
    }

    fn watts(value: f64) -> Reading {
        Reading::Value(Watts(value))
    }

    #[tokio::test]
    async fn test_first_tick_starts_fresh_and_persists() -> Result {
        let mut engine = engine(MemoryStore::default())?;
        // Tuesday, on-peak:
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        let snapshot = engine.tick(now, &cache(watts(600.0), watts(400.0))).await?;

        assert_eq!(snapshot.total_power, Some(Watts(1000.0)));
        assert_abs_diff_eq!(snapshot.current_rate.0, 0.23);
        assert_abs_diff_eq!(snapshot.cost_rate.0, 0.23);
        assert_eq!(snapshot.rate_period, "Summer On-Peak");
        assert_eq!(snapshot.daily, Totals::ZERO);
        assert_eq!(snapshot.last_update, now.fixed_offset());

        let blob = engine.store.get(KEY).unwrap();
        assert_eq!(blob.get_f64("previous_power"), Some(1000.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_one_hour_at_one_kilowatt() -> Result {
        let mut engine = engine(MemoryStore::default())?;
        let start = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        engine.tick(start, &cache(watts(1000.0), Reading::Unavailable)).await?;

        let snapshot = engine
            .tick(start + TimeDelta::hours(1), &cache(watts(1000.0), Reading::Unavailable))
            .await?;
        assert_eq!(snapshot.daily.energy, Quantity(1.0));
        assert_abs_diff_eq!(snapshot.daily.cost.0, 0.23);
        assert_eq!(snapshot.rolled_over, EnumSet::only(PeriodKind::Hour));
        // The whole interval goes into the new hour:
        assert_eq!(snapshot.hourly.energy, Quantity(1.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_absent_power() -> Result {
        let mut engine = engine(MemoryStore::default())?;
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        let snapshot = engine.tick(now, &StateCache::new()).await?;
        assert_eq!(snapshot.total_power, None);
        assert_eq!(snapshot.cost_rate, CostRate::ZERO);
        assert_eq!(engine.state().unwrap().last_sample, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_restores_persisted_state() -> Result {
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 30).unwrap();
        let mut persisted = AccumulationState::fresh(&now);
        persisted.periods.add(Totals { energy: Quantity(4.0), cost: Quantity(0.8) });
        persisted.last_sample = Some(Sample { power: Watts(1200.0), timestamp: now });

        let mut engine = engine(MemoryStore::with(KEY, persisted.to_blob()))?;
        let snapshot = engine
            .tick(now + TimeDelta::minutes(30), &cache(watts(1200.0), Reading::NotFound))
            .await?;
        assert_abs_diff_eq!(snapshot.daily.energy.0, 4.6, epsilon = 1e-9);
        assert_abs_diff_eq!(snapshot.daily.cost.0, 0.8 + 0.6 * 0.23, epsilon = 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_happens_once() -> Result {
        let store = MemoryStore::default();
        let mut engine = engine(store)?;
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        engine.tick(now, &cache(watts(1000.0), watts(0.0))).await?;

        // Whatever lands in the store later must not override the in-memory state:
        let mut blob = Blob::default();
        blob.insert("daily_energy", 100.0);
        blob.insert("daily_cost", 20.0);
        blob.insert("daily_start", "2025-07-15T00:00:00+00:00");
        engine.store.save(KEY, &blob).await?;

        let snapshot = engine
            .tick(now + TimeDelta::minutes(1), &cache(watts(1000.0), watts(0.0)))
            .await?;
        assert!(snapshot.daily.energy.0 < 1.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_failure_starts_fresh() -> Result {
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        let mut persisted = AccumulationState::fresh(&now);
        persisted.periods.add(Totals { energy: Quantity(4.0), cost: Quantity(0.8) });
        let store = MemoryStore::with(KEY, persisted.to_blob());
        store.set_failing(true);
        let mut engine = engine(store)?;

        // Saving fails as well, but the tick still succeeds:
        let snapshot = engine.tick(now, &cache(watts(500.0), watts(0.0))).await?;
        assert_eq!(snapshot.total_power, Some(Watts(500.0)));
        assert_eq!(snapshot.daily, Totals::ZERO);
        assert_eq!(
            engine.state().unwrap().last_sample,
            Some(Sample { power: Watts(500.0), timestamp: now })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_save_failure_is_retried_on_next_tick() -> Result {
        let mut engine = engine(MemoryStore::default())?;
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        engine.store.set_failing(true);
        engine.tick(now, &cache(watts(500.0), watts(0.0))).await?;
        assert_eq!(engine.store.get(KEY), None);

        engine.store.set_failing(false);
        engine.tick(now + TimeDelta::seconds(30), &cache(watts(500.0), watts(0.0))).await?;
        assert!(engine.store.get(KEY).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_tick_keeps_previous_state() -> Result {
        let mut engine = engine(MemoryStore::default())?;
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        engine.tick(now, &cache(watts(1000.0), watts(0.0))).await?;
        let before = engine.state().cloned();

        // The sum overflows to infinity:
        let result = engine
            .tick(now + TimeDelta::hours(1), &cache(watts(f64::MAX), watts(f64::MAX)))
            .await;
        assert!(result.is_err());
        assert_eq!(engine.state().cloned(), before);

        // The next good tick resumes from the last good sample:
        let snapshot = engine
            .tick(now + TimeDelta::hours(2), &cache(watts(1000.0), watts(0.0)))
            .await?;
        assert_abs_diff_eq!(snapshot.daily.energy.0, 2.0);
        assert_abs_diff_eq!(snapshot.hourly.energy.0, 2.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_sensor_list_changes_between_ticks() -> Result {
        let mut engine = engine(MemoryStore::default())?;
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 15, 0, 0).unwrap();
        let states = cache(watts(1000.0), watts(3000.0));
        let snapshot = engine.tick(now, &states).await?;
        assert_eq!(snapshot.total_power, Some(Watts(4000.0)));

        engine.set_sensors(vec!["sensor.garage".to_string()]);
        let snapshot = engine.tick(now + TimeDelta::minutes(30), &states).await?;
        assert_eq!(snapshot.total_power, Some(Watts(3000.0)));
        assert_abs_diff_eq!(snapshot.hourly.energy.0, 1.75);
        Ok(())
    }

    #[tokio::test]
    async fn test_month_rollover() -> Result {
        let mut engine = engine(MemoryStore::default())?;
        let before = Utc.with_ymd_and_hms(2025, 7, 31, 23, 59, 30).unwrap();
        engine.tick(before, &cache(watts(1200.0), watts(0.0))).await?;
        let snapshot = engine
            .tick(before + TimeDelta::seconds(15), &cache(watts(1200.0), watts(0.0)))
            .await?;
        let july = snapshot.monthly;
        assert_abs_diff_eq!(july.energy.0, 0.005, epsilon = 1e-12);

        // Exactly at midnight, 15 seconds after the previous tick:
        let snapshot = engine
            .tick(before + TimeDelta::seconds(30), &cache(watts(1200.0), watts(0.0)))
            .await?;
        assert!(snapshot.rolled_over.contains(PeriodKind::Month));
        assert_eq!(snapshot.previous_month, july);
        assert_abs_diff_eq!(snapshot.monthly.energy.0, 0.005, epsilon = 1e-12);
        assert_eq!(snapshot.monthly, snapshot.daily);
        assert_eq!(snapshot.rate_period, "Summer Off-Peak");
        Ok(())
    }
}
