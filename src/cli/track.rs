use std::{path::PathBuf, pin::pin, time::Duration};

use bon::Builder;
use chrono::Local;
use clap::Parser;
use tokio::{
    select,
    signal,
    time::{MissedTickBehavior, interval},
};

use crate::{
    api::home_assistant,
    cli::{HomeAssistantConnectionArgs, TariffArgs},
    engine::{Engine, period::PeriodKind},
    prelude::*,
    sensor::StateCache,
    store::JsonFileStore,
    tables::build_snapshot_table,
};

#[derive(Parser)]
pub struct TrackArgs {
    /// Identity of the tracked entry, the persisted state is keyed by it.
    #[clap(long, env = "ENTRY_ID", default_value = "default")]
    entry_id: String,

    /// Directory to keep the persisted state in.
    #[clap(long, env = "STATE_DIR", default_value = ".")]
    state_dir: PathBuf,

    /// Power sensor entity ID, in watts. Repeat or separate by commas for several sensors.
    #[clap(long = "power-sensor", env = "POWER_SENSORS", value_delimiter = ',', required = true)]
    power_sensors: Vec<String>,

    #[clap(long, env = "UPDATE_INTERVAL", default_value = "30s")]
    update_interval: humantime::Duration,

    #[clap(flatten)]
    tariff: TariffArgs,

    #[clap(flatten)]
    home_assistant: HomeAssistantConnectionArgs,
}

impl TrackArgs {
    pub async fn run(self) -> Result {
        let engine = Engine::new(
            &self.entry_id,
            self.tariff.load()?,
            self.power_sensors,
            JsonFileStore::new(self.state_dir),
        );
        Tracker::builder()
            .api(self.home_assistant.connect()?)
            .engine(engine)
            .interval(self.update_interval)
            .build()
            .run()
            .await
    }
}

#[derive(Builder)]
struct Tracker {
    api: home_assistant::Api,
    engine: Engine<JsonFileStore>,

    #[builder(into)]
    interval: Duration,
}

impl Tracker {
    /// Tick until Ctrl+C, which is only handled in between the ticks.
    async fn run(mut self) -> Result {
        let mut interval = interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ctrl_c = pin!(signal::ctrl_c());

        loop {
            select! {
                _ = interval.tick() => {}
                result = &mut ctrl_c => {
                    result?;
                    info!("stopping…");
                    return Ok(());
                }
            }
            self.tick().await;
        }
    }

    async fn tick(&mut self) {
        let states = self.api.get_states().await.unwrap_or_else(|error| {
            warn!("failed to fetch the sensor states: {error:#}");
            StateCache::new()
        });

        // Failed ticks are logged by the engine, and the next tick is the retry.
        let Ok(snapshot) = self.engine.tick(Local::now(), &states).await else {
            return;
        };
        info!(
            total_power = ?snapshot.total_power,
            rate_period = %snapshot.rate_period,
            rate = %snapshot.current_rate,
            cost_rate = %snapshot.cost_rate,
            today = %snapshot.daily.cost,
            "updated",
        );
        match serde_json::to_string(&snapshot) {
            Ok(json) => debug!(snapshot = %json),
            Err(error) => warn!("failed to serialize the snapshot: {error:#}"),
        }
        if snapshot.rolled_over.contains(PeriodKind::Day) {
            println!("{}", build_snapshot_table(&snapshot));
        }
    }
}
