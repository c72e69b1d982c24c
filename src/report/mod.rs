//! Report pipeline.
//!
//! Loads the three measurement sources, then renders the chart tree. Each
//! stage degrades per source: an empty table or a missing column costs a
//! logged notice and its charts, never the run.

mod oracles;
mod tournament;

use crate::charts::{self, ChartStyle, ErrorPoint};
use crate::dataset::{self, Table};
use crate::model::{self, MetricSpec, SourceKind};
use crate::range;
use crate::stats;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved input and output locations for one run. Inputs follow the
/// collector's fixed relative layout under the base directory.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub consensus_csv: PathBuf,
    pub execution_csv: PathBuf,
    pub tournament_csv: PathBuf,
    pub out_root: PathBuf,
}

impl ReportPaths {
    pub fn new(base_dir: &Path, out_dir: &Path) -> Self {
        let source_csv = |kind: SourceKind| base_dir.join(kind.label()).join(kind.csv_name());
        Self {
            consensus_csv: source_csv(SourceKind::Consensus),
            execution_csv: source_csv(SourceKind::Execution),
            tournament_csv: source_csv(SourceKind::Tournament),
            out_root: out_dir.to_path_buf(),
        }
    }

    fn out_dir(&self, name: &str) -> PathBuf {
        self.out_root.join(name)
    }
}

/// The loaded measurement sources. Empty tables are kept so every stage can
/// decide per source what to skip.
pub struct Sources {
    pub consensus: Table,
    pub execution: Table,
    pub tournament: Table,
}

impl Sources {
    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &Table)> + '_ {
        [
            (SourceKind::Consensus, &self.consensus),
            (SourceKind::Execution, &self.execution),
            (SourceKind::Tournament, &self.tournament),
        ]
        .into_iter()
    }
}

pub fn load_sources(paths: &ReportPaths) -> Result<Sources> {
    info!("loading measurement data");
    Ok(Sources {
        consensus: dataset::load_table(&paths.consensus_csv)?,
        execution: dataset::load_table(&paths.execution_csv)?,
        tournament: dataset::load_table(&paths.tournament_csv)?,
    })
}

/// Render every chart. Output directories are created idempotently first.
pub fn render_all(sources: &Sources, paths: &ReportPaths, style: &ChartStyle) -> Result<()> {
    for name in ["consensus", "execution", "tournament", "oracles"] {
        let dir = paths.out_dir(name);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    }

    info!("generating plots");
    oracles::render_combined(sources, &paths.out_dir("oracles"), style)?;
    render_metric_charts(
        SourceKind::Consensus,
        &sources.consensus,
        &model::oracle_metrics(SourceKind::Consensus),
        &paths.out_dir("consensus"),
        style,
    )?;
    render_metric_charts(
        SourceKind::Execution,
        &sources.execution,
        &model::oracle_metrics(SourceKind::Execution),
        &paths.out_dir("execution"),
        style,
    )?;
    render_metric_charts(
        SourceKind::Tournament,
        &sources.tournament,
        &model::tournament_metrics(),
        &paths.out_dir("tournament"),
        style,
    )?;
    tournament::render(&sources.tournament, &paths.out_dir("tournament"), style)?;
    info!("all plots generated under {}", paths.out_root.display());
    Ok(())
}

/// Soft-skip helper: warn with the available columns when a metric column is
/// missing from a non-empty table.
pub(crate) fn require_column(table: &Table, source: SourceKind, column: &str) -> bool {
    if table.has_column(column) {
        return true;
    }
    warn!(
        "{} data has no '{}' column (available: {}); skipping",
        source.label(),
        column,
        table.headers().iter().collect::<Vec<_>>().join(", ")
    );
    false
}

/// One error-bar chart per metric: mean ± std per prover configuration, or
/// a single entry for sources without configurations.
fn render_metric_charts(
    kind: SourceKind,
    table: &Table,
    metrics: &[MetricSpec],
    out_dir: &Path,
    style: &ChartStyle,
) -> Result<()> {
    if table.is_empty() {
        info!(
            "no data available for {}; skipping per-metric charts",
            kind.label()
        );
        return Ok(());
    }

    for spec in metrics {
        if !require_column(table, kind, spec.column) {
            continue;
        }
        let groups = stats::aggregate_metric(table, spec, Some(model::GROUP_COLUMN));
        if groups.is_empty() {
            warn!("no valid data for {} {}", kind.label(), spec.column);
            continue;
        }

        let multi = groups.len() > 1;
        let points: Vec<ErrorPoint> = groups
            .iter()
            .enumerate()
            .map(|(i, (&key, stat))| {
                let (tick, label, color) = if multi {
                    let display = model::display_provers(key);
                    (
                        format!("{display} provers"),
                        format!("{display} provers"),
                        charts::series_color(i),
                    )
                } else {
                    (
                        "Single Measurement".to_string(),
                        spec.title.to_string(),
                        charts::PALETTE[0],
                    )
                };
                ErrorPoint {
                    tick,
                    label,
                    color,
                    mean: stat.mean,
                    std_dev: stat.std_dev,
                }
            })
            .collect();

        let means: Vec<f64> = groups.values().map(|s| s.mean).collect();
        let max_std = groups.values().map(|s| s.std_dev).fold(0.0, f64::max);
        let y_range = range::range_for_values(spec.default_range, &means, Some(max_std));
        let x_desc = if multi {
            "Number of Provers"
        } else {
            "Measurement Type"
        };

        let path = out_dir.join(format!("{}_errorbar.png", spec.column));
        charts::error_bar_chart(
            &path,
            style,
            &format!("{} - {}", kind.display_name(), spec.axis_label()),
            x_desc,
            &spec.axis_label(),
            y_range,
            &points,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_paths_follow_the_collector_layout() {
        let paths = ReportPaths::new(Path::new("data"), Path::new("plots"));
        assert_eq!(
            paths.consensus_csv,
            Path::new("data/consensus/consensus_oracle_measurements.csv")
        );
        assert_eq!(
            paths.tournament_csv,
            Path::new("data/tournament/tournament_measurements.csv")
        );
        assert_eq!(paths.out_dir("oracles"), Path::new("plots/oracles"));
    }

    #[test]
    fn require_column_accepts_present_columns() {
        let table = Table::from_rows(&["a", "b"], &[&["1", "2"]]);
        assert!(require_column(&table, SourceKind::Tournament, "a"));
        assert!(!require_column(&table, SourceKind::Tournament, "missing"));
    }
}
