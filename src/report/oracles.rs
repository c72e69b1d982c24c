//! Combined consensus-vs-execution oracle charts.

use super::Sources;
use crate::charts::{self, ChartStyle, GridPanel, MarkerShape, PanelContent, RGBColor, RawSeries};
use crate::dataset::Table;
use crate::model::{SourceKind, Unit};
use crate::range::{self, AxisRange};
use crate::stats::OnlineStats;
use anyhow::Result;
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::Path;

/// Typed view of an oracle measurement row. Blank cells and absent columns
/// both deserialize to `None`, so the same record covers either source.
#[derive(Debug, Clone, Deserialize)]
struct OracleRow {
    #[serde(default)]
    iteration: Option<i64>,
    #[serde(default)]
    consensus_oracle_time_ms: Option<f64>,
    #[serde(default)]
    execution_oracle_time_ms: Option<f64>,
    #[serde(default)]
    memory_bytes: Option<f64>,
    #[serde(default)]
    cpu_percent: Option<f64>,
    #[serde(default)]
    network_bytes_in: Option<f64>,
    #[serde(default)]
    network_bytes_out: Option<f64>,
}

/// One panel of the combined grid: a typed accessor per source plus display
/// parameters. Only the elapsed-time column differs between the sources;
/// the column names ride along for diagnostics.
struct OraclePanel {
    title: &'static str,
    unit: Unit,
    default_range: AxisRange,
    columns: [&'static str; 2],
    consensus: fn(&OracleRow) -> Option<f64>,
    execution: fn(&OracleRow) -> Option<f64>,
}

fn panels() -> [OraclePanel; 5] {
    [
        OraclePanel {
            title: "Oracle Time",
            unit: Unit::Seconds,
            default_range: AxisRange::new(0.0, 30.0),
            columns: ["consensus_oracle_time_ms", "execution_oracle_time_ms"],
            consensus: |r| r.consensus_oracle_time_ms,
            execution: |r| r.execution_oracle_time_ms,
        },
        OraclePanel {
            title: "CPU Usage",
            unit: Unit::Percent,
            default_range: AxisRange::new(0.0, 100.0),
            columns: ["cpu_percent", "cpu_percent"],
            consensus: |r| r.cpu_percent,
            execution: |r| r.cpu_percent,
        },
        OraclePanel {
            title: "Memory Usage",
            unit: Unit::Megabytes,
            default_range: AxisRange::new(0.0, 15_000.0),
            columns: ["memory_bytes", "memory_bytes"],
            consensus: |r| r.memory_bytes,
            execution: |r| r.memory_bytes,
        },
        OraclePanel {
            title: "Network Bytes In",
            unit: Unit::Megabytes,
            default_range: AxisRange::new(0.0, 20.0),
            columns: ["network_bytes_in", "network_bytes_in"],
            consensus: |r| r.network_bytes_in,
            execution: |r| r.network_bytes_in,
        },
        OraclePanel {
            title: "Network Bytes Out",
            unit: Unit::Megabytes,
            default_range: AxisRange::new(0.0, 3.0),
            columns: ["network_bytes_out", "network_bytes_out"],
            consensus: |r| r.network_bytes_out,
            execution: |r| r.network_bytes_out,
        },
    ]
}

/// Per-iteration raw series for one source, already scaled into the display
/// unit. `None` when the source is empty or the column is missing.
fn source_series(
    rows: &[OracleRow],
    table: &Table,
    kind: SourceKind,
    column: &str,
    accessor: fn(&OracleRow) -> Option<f64>,
    unit: Unit,
    color: RGBColor,
    marker: MarkerShape,
) -> Option<RawSeries> {
    if rows.is_empty() {
        return None;
    }
    if !super::require_column(table, kind, column) {
        return None;
    }
    let points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| {
            let x = r.iteration? as f64;
            let y = accessor(r)? / unit.divisor();
            Some((x, y))
        })
        .collect();
    if points.is_empty() {
        warn!("no valid {} samples for {}", column, kind.label());
        return None;
    }
    debug!(
        "plotted {} {} with {} values",
        kind.label(),
        column,
        points.len()
    );
    Some(RawSeries {
        label: kind.display_name().to_string(),
        color,
        marker,
        points,
    })
}

/// The 2×3 grid overlaying consensus and execution per metric, with dynamic
/// y ranges and a mean/std annotation per panel.
pub(crate) fn render_combined(sources: &Sources, out_dir: &Path, style: &ChartStyle) -> Result<()> {
    if sources.consensus.is_empty() && sources.execution.is_empty() {
        info!("no consensus or execution data available; skipping combined oracle plot");
        return Ok(());
    }

    let consensus_rows: Vec<OracleRow> = sources.consensus.deserialize_rows()?;
    let execution_rows: Vec<OracleRow> = sources.execution.deserialize_rows()?;

    let mut grid = Vec::new();
    for panel in panels() {
        let mut series = Vec::new();
        if let Some(s) = source_series(
            &consensus_rows,
            &sources.consensus,
            SourceKind::Consensus,
            panel.columns[0],
            panel.consensus,
            panel.unit,
            charts::PALETTE[0],
            MarkerShape::Circle,
        ) {
            series.push(s);
        }
        if let Some(s) = source_series(
            &execution_rows,
            &sources.execution,
            SourceKind::Execution,
            panel.columns[1],
            panel.execution,
            panel.unit,
            charts::PALETTE[3],
            MarkerShape::Triangle,
        ) {
            series.push(s);
        }

        let mut acc = OnlineStats::default();
        let mut values = Vec::new();
        for &(_, y) in series.iter().flat_map(|s| s.points.iter()) {
            acc.push(y);
            values.push(y);
        }
        let y_range = range::range_for_values(panel.default_range, &values, None);
        let annotation =
            (acc.count() > 0).then(|| format!("mean {:.2}, std {:.2}", acc.mean(), acc.std_dev()));

        let axis_label = format!("{} ({})", panel.title, panel.unit.suffix());
        grid.push(GridPanel {
            title: axis_label.clone(),
            x_desc: "Iteration".into(),
            y_desc: axis_label,
            y_range,
            content: PanelContent::Raw(series),
            annotation,
        });
    }

    let path = out_dir.join("oracles_combined_metrics.png");
    charts::panel_grid(
        &path,
        style,
        "Oracle Measurements - Consensus vs Execution",
        &grid,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_series_scales_and_keys_by_iteration() {
        let table = Table::from_rows(
            &["iteration", "consensus_oracle_time_ms"],
            &[&["1", "5000"], &["2", "7000"], &["3", ""]],
        );
        let rows: Vec<OracleRow> = table.deserialize_rows().unwrap();
        let series = source_series(
            &rows,
            &table,
            SourceKind::Consensus,
            "consensus_oracle_time_ms",
            |r| r.consensus_oracle_time_ms,
            Unit::Seconds,
            charts::PALETTE[0],
            MarkerShape::Circle,
        )
        .unwrap();
        // The blank third sample drops out.
        assert_eq!(series.points, vec![(1.0, 5.0), (2.0, 7.0)]);
    }

    #[test]
    fn source_series_is_none_for_a_missing_column() {
        let table = Table::from_rows(&["iteration", "cpu_percent"], &[&["1", "50"]]);
        let rows: Vec<OracleRow> = table.deserialize_rows().unwrap();
        let series = source_series(
            &rows,
            &table,
            SourceKind::Execution,
            "execution_oracle_time_ms",
            |r| r.execution_oracle_time_ms,
            Unit::Seconds,
            charts::PALETTE[3],
            MarkerShape::Triangle,
        );
        assert!(series.is_none());
    }
}
