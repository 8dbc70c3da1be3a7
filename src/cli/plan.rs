use clap::Parser;

use crate::{cli::TariffArgs, prelude::*, tables::build_rate_table};

#[derive(Parser)]
pub struct PlanArgs {
    #[clap(flatten)]
    pub tariff: TariffArgs,
}

impl PlanArgs {
    pub fn run(&self) -> Result {
        let rate_table = self.tariff.load()?;
        println!("{}", build_rate_table(&rate_table));
        Ok(())
    }
}
