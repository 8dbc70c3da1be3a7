mod plan;
mod rate;
mod track;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::Url;

pub use self::{plan::PlanArgs, rate::RateArgs, track::TrackArgs};
use crate::{
    api::home_assistant,
    prelude::*,
    tariff::{RateTable, config::RateTableConfig, presets::RatePlan},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: track the energy usage of the power sensors and its cost.
    #[clap(name = "track")]
    Track(Box<TrackArgs>),

    /// Resolve the rate at the given time.
    #[clap(name = "rate")]
    Rate(RateArgs),

    /// Render the rate table.
    #[clap(name = "plan")]
    Plan(PlanArgs),
}

#[derive(Parser)]
pub struct TariffArgs {
    /// Built-in rate plan.
    #[clap(long, env = "RATE_PLAN", default_value = "summer-tou")]
    pub rate_plan: RatePlan,

    /// Custom rate table in TOML, takes precedence over the built-in rate plan.
    #[clap(long, env = "RATE_TABLE_PATH")]
    pub rate_table: Option<PathBuf>,
}

impl TariffArgs {
    pub fn load(&self) -> Result<RateTable> {
        match &self.rate_table {
            Some(path) => {
                info!(path = %path.display(), "loading the custom rate table…");
                RateTableConfig::read_from(path)?
                    .try_into()
                    .with_context(|| format!("invalid rate table `{}`", path.display()))
            }
            None => {
                info!(rate_plan = %self.rate_plan, "using the built-in rate plan");
                self.rate_plan.rate_table()
            }
        }
    }
}

#[derive(Parser)]
pub struct HomeAssistantConnectionArgs {
    /// Home Assistant API access token.
    #[clap(long = "home-assistant-access-token", env = "HOME_ASSISTANT_ACCESS_TOKEN")]
    pub access_token: String,

    /// Home Assistant API base URL. For example: `http://localhost:8123/api`.
    #[clap(long = "home-assistant-api-base-url", env = "HOME_ASSISTANT_API_BASE_URL")]
    pub base_url: Url,
}

impl HomeAssistantConnectionArgs {
    pub fn connect(&self) -> Result<home_assistant::Api> {
        home_assistant::Api::try_new(&self.access_token, self.base_url.clone())
    }
}
