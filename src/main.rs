#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cli;
mod engine;
mod prelude;
mod quantity;
mod sensor;
mod store;
mod tables;
mod tariff;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    prelude::*,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Track(args) => args.run().await,
        Command::Rate(args) => args.run(),
        Command::Plan(args) => args.run(),
    }
}
