mod application;
mod cli;
mod data;
mod domain;
mod infra;
mod ml;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() -> Result<()> {
    // RUST_LOG overrides; this crate logs at info by default.
    let filter = EnvFilter::from_default_env().add_directive("regression_model=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Cli::parse().run()
}
