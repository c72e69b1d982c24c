//! Tournament charts: per-configuration grids, all-configuration
//! comparisons and projected trends over an extended block range.

use crate::charts::{self, BandSeries, ChartStyle, GridPanel, OverlayLine, PanelContent};
use crate::dataset::Table;
use crate::fit;
use crate::model::{self, MetricKind, MetricSpec, SourceKind};
use crate::range;
use crate::stats::{self, GroupStat};
use anyhow::Result;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Full-node baseline: 10 ms of work per block, in seconds.
const FULL_NODE_SECONDS_PER_BLOCK: f64 = 0.010;
/// Exponential growth baseline: 1 s doubling every 100k blocks.
const EXPONENTIAL_BASE_SECONDS: f64 = 1.0;
const EXPONENTIAL_DOUBLING_BLOCKS: f64 = 100_000.0;
/// Projections extend the fitted trend to ten times the sampled range.
const PROJECTION_SPAN: f64 = 10.0;

type BlockSeries = BTreeMap<i64, Vec<(i64, GroupStat)>>;

pub(crate) fn render(table: &Table, out_dir: &Path, style: &ChartStyle) -> Result<()> {
    if table.is_empty() || !table.has_column(model::GROUP_COLUMN) {
        info!("no tournament data available; skipping tournament charts");
        return Ok(());
    }

    let mut per_metric: Vec<(MetricSpec, BlockSeries)> = Vec::new();
    for spec in model::tournament_metrics() {
        if !super::require_column(table, SourceKind::Tournament, spec.column) {
            continue;
        }
        let series = stats::block_series(table, &spec, model::GROUP_COLUMN, model::BLOCK_COLUMN);
        if series.is_empty() {
            warn!("no valid data for tournament {}", spec.column);
            continue;
        }
        per_metric.push((spec, series));
    }

    render_config_grids(&per_metric, out_dir, style)?;
    for (spec, series) in &per_metric {
        render_final_comparison(spec, series, out_dir, style)?;
        render_projection(spec, series, out_dir, style)?;
    }
    Ok(())
}

fn band_points(points: &[(i64, GroupStat)]) -> Vec<(f64, f64, f64)> {
    points
        .iter()
        .map(|(block, s)| (*block as f64, s.mean, s.std_dev))
        .collect()
}

/// Sampled block extent across every configuration.
fn block_domain(series: &BlockSeries) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (block, _) in series.values().flatten() {
        lo = lo.min(*block as f64);
        hi = hi.max(*block as f64);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

/// One 2×3 grid per prover configuration: every metric against block
/// number, mean line with a ±std band.
fn render_config_grids(
    per_metric: &[(MetricSpec, BlockSeries)],
    out_dir: &Path,
    style: &ChartStyle,
) -> Result<()> {
    let mut configs: BTreeSet<i64> = BTreeSet::new();
    for (_, series) in per_metric {
        configs.extend(series.keys().copied());
    }

    for &config in &configs {
        let display = model::display_provers(config);
        let mut panels = Vec::new();
        for (spec, series) in per_metric {
            let Some(points) = series.get(&config) else {
                continue;
            };
            let means: Vec<f64> = points.iter().map(|(_, s)| s.mean).collect();
            let max_std = points.iter().map(|(_, s)| s.std_dev).fold(0.0, f64::max);
            let y_range = range::range_for_values(spec.default_range, &means, Some(max_std));
            panels.push(GridPanel {
                title: spec.axis_label(),
                x_desc: "Block Number".into(),
                y_desc: spec.axis_label(),
                y_range,
                content: PanelContent::Band(vec![BandSeries {
                    label: format!("{display} provers"),
                    color: charts::PALETTE[0],
                    points: band_points(points),
                }]),
                annotation: None,
            });
        }
        if panels.is_empty() {
            continue;
        }
        let path = out_dir.join(format!("tournament_{display}_provers_combined.png"));
        charts::panel_grid(
            &path,
            style,
            &format!("Tournament Measurements - {display} Provers"),
            &panels,
        )?;
    }
    Ok(())
}

/// Every configuration overlaid for one metric, plus the full-node
/// reference on elapsed-time charts.
fn render_final_comparison(
    spec: &MetricSpec,
    series: &BlockSeries,
    out_dir: &Path,
    style: &ChartStyle,
) -> Result<()> {
    let mut band_series = Vec::new();
    let mut all_means = Vec::new();
    let mut max_std: f64 = 0.0;
    for (i, (&config, points)) in series.iter().enumerate() {
        all_means.extend(points.iter().map(|(_, s)| s.mean));
        max_std = points.iter().map(|(_, s)| s.std_dev).fold(max_std, f64::max);
        band_series.push(BandSeries {
            label: format!("{} provers", model::display_provers(config)),
            color: charts::series_color(i),
            points: band_points(points),
        });
    }
    if band_series.is_empty() {
        return Ok(());
    }

    let mut overlays = Vec::new();
    if spec.kind == MetricKind::ElapsedTime {
        if let Some(domain) = block_domain(series) {
            let (xs, ys) = fit::full_node_reference(domain, FULL_NODE_SECONDS_PER_BLOCK);
            overlays.push(OverlayLine {
                label: "Reference: Full node".into(),
                color: charts::REFERENCE_COLOR,
                points: xs.into_iter().zip(ys).collect(),
            });
        }
    }

    let y_range = range::range_for_values(spec.default_range, &all_means, Some(max_std));
    let path = out_dir.join(format!("tournament_final_{}_comparison.png", spec.column));
    charts::band_chart(
        &path,
        style,
        style.comparison_size,
        &format!(
            "Tournament {} vs Block Number - All Prover Configurations",
            spec.title
        ),
        "Block Number",
        &spec.axis_label(),
        y_range,
        &band_series,
        &overlays,
    )
}

/// Observed series plus a fitted trend extrapolated over an extended block
/// domain. Elapsed time gets a logarithmic fit and the analytic references;
/// CPU and memory are expected to plateau; network traffic grows linearly.
fn render_projection(
    spec: &MetricSpec,
    series: &BlockSeries,
    out_dir: &Path,
    style: &ChartStyle,
) -> Result<()> {
    let samples: Vec<(f64, f64)> = series
        .values()
        .flatten()
        .map(|(block, s)| (*block as f64, s.mean))
        .collect();
    let Some(window) = block_domain(series) else {
        return Ok(());
    };
    let domain = (window.0, window.1 * PROJECTION_SPAN);

    let fitted = match spec.kind {
        MetricKind::ElapsedTime => {
            fit::log10_fit(&samples, window, domain).map(|f| ("Fitted trend (log)", f))
        }
        MetricKind::CpuPercent | MetricKind::Memory => {
            // Steady state taken as the second half of the sampled range.
            let threshold = window.0 + (window.1 - window.0) / 2.0;
            fit::plateau_fit(&samples, threshold, domain).map(|f| ("Fitted plateau", f))
        }
        MetricKind::NetworkBytes => {
            fit::linear_fit(&samples, window, domain).map(|f| ("Fitted trend (linear)", f))
        }
    };
    let Some((fit_label, (xs, ys))) = fitted else {
        info!(
            "not enough {} samples to fit a trend; skipping projection",
            spec.column
        );
        return Ok(());
    };

    let mut range_values: Vec<f64> = samples.iter().map(|&(_, y)| y).collect();
    range_values.extend(ys.iter().copied());

    let mut overlays = vec![OverlayLine {
        label: fit_label.into(),
        color: charts::series_color(1),
        points: xs.into_iter().zip(ys).collect(),
    }];
    if spec.kind == MetricKind::ElapsedTime {
        let (fx, fy) = fit::full_node_reference(domain, FULL_NODE_SECONDS_PER_BLOCK);
        overlays.push(OverlayLine {
            label: "Reference: Full node".into(),
            color: charts::REFERENCE_COLOR,
            points: fx.into_iter().zip(fy).collect(),
        });
        let (ex, ey) = fit::exponential_reference(
            domain,
            EXPONENTIAL_BASE_SECONDS,
            EXPONENTIAL_DOUBLING_BLOCKS,
        );
        overlays.push(OverlayLine {
            label: "Reference: Exponential growth".into(),
            color: charts::PALETTE[5],
            points: ex.into_iter().zip(ey).collect(),
        });
    }

    let band_series: Vec<BandSeries> = series
        .iter()
        .enumerate()
        .map(|(i, (&config, points))| BandSeries {
            label: format!("{} provers", model::display_provers(config)),
            color: charts::series_color(i),
            points: band_points(points),
        })
        .collect();

    let y_range = range::range_for_values(spec.default_range, &range_values, None);
    let path = out_dir.join(format!("tournament_projection_{}.png", spec.column));
    charts::band_chart(
        &path,
        style,
        style.comparison_size,
        &format!(
            "Tournament {} Projection - Extended Block Range",
            spec.title
        ),
        "Block Number",
        &spec.axis_label(),
        y_range,
        &band_series,
        &overlays,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_of(entries: &[(i64, &[(i64, f64)])]) -> BlockSeries {
        entries
            .iter()
            .map(|&(config, points)| {
                let stats = points
                    .iter()
                    .map(|&(block, v)| (block, GroupStat::from_values(vec![v]).unwrap()))
                    .collect();
                (config, stats)
            })
            .collect()
    }

    #[test]
    fn block_domain_spans_every_configuration() {
        let series = series_of(&[
            (0, &[(100, 1.0), (300, 2.0)]),
            (1, &[(50, 1.5), (200, 2.5)]),
        ]);
        assert_eq!(block_domain(&series), Some((50.0, 300.0)));
        assert_eq!(block_domain(&BlockSeries::new()), None);
    }

    #[test]
    fn band_points_carry_mean_and_std() {
        let stat = GroupStat::from_values(vec![5.0, 7.0]).unwrap();
        let band = band_points(&[(100, stat)]);
        assert_eq!(band, vec![(100.0, 6.0, 1.0)]);
    }
}
