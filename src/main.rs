mod charts;
mod cli;
mod dataset;
mod fit;
mod model;
mod range;
mod report;
mod stats;
mod text_summary;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::Cli::parse();
    cli::run(args)
}
