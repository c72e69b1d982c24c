use crate::charts::ChartStyle;
use crate::report::{self, ReportPaths};
use crate::text_summary;
use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "measurement-report",
    version,
    about = "Render benchmark measurement CSVs into summary charts"
)]
pub struct Cli {
    /// Directory containing the measurement CSV tree
    #[arg(long, default_value = ".")]
    pub base_dir: PathBuf,

    /// Directory the chart tree is written into
    #[arg(long, default_value = "plots")]
    pub out_dir: PathBuf,

    /// Print the statistics summary and skip chart rendering
    #[arg(long)]
    pub stats_only: bool,
}

pub fn run(args: Cli) -> Result<()> {
    let started = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into());
    info!("measurement report started at {started}");

    let paths = ReportPaths::new(&args.base_dir, &args.out_dir);
    let sources = report::load_sources(&paths)?;

    let summary = text_summary::build_summary(&sources)?;
    for line in summary.lines {
        println!("{line}");
    }

    if args.stats_only {
        return Ok(());
    }
    report::render_all(&sources, &paths, &ChartStyle::default())?;
    Ok(())
}
