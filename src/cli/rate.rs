use chrono::{Local, NaiveDateTime};
use clap::Parser;

use crate::{cli::TariffArgs, prelude::*};

#[derive(Parser)]
pub struct RateArgs {
    /// Local time to resolve the rate at, for example `2025-07-15T14:30:00`. Defaults to now.
    #[clap(long)]
    pub at: Option<NaiveDateTime>,

    #[clap(flatten)]
    pub tariff: TariffArgs,
}

impl RateArgs {
    pub fn run(&self) -> Result {
        let rate_table = self.tariff.load()?;
        let at = self.at.unwrap_or_else(|| Local::now().naive_local());
        let price = rate_table.resolve(at);
        let season = rate_table.season_name(at);
        info!(%at, season, label = price.label, rate = %price.rate, "resolved");
        println!("{season} {}: {}", price.label, price.rate);
        Ok(())
    }
}
