//! Console statistics summary.
//!
//! This module computes per-source, per-group statistics and formats
//! human-readable lines; the CLI layer decides where they go.

use crate::dataset::Table;
use crate::model::{self, SourceKind, KEY_COLUMNS};
use crate::report::Sources;
use crate::stats::{self, GroupStat, OnlineStats};
use anyhow::Result;
use hdrhistogram::Histogram;

/// Pre-formatted lines for console output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Build the statistics summary across every loaded source.
pub fn build_summary(sources: &Sources) -> Result<TextSummary> {
    let mut lines = Vec::new();
    for (kind, table) in sources.iter() {
        summarize_source(&mut lines, kind, table)?;
    }
    Ok(TextSummary { lines })
}

fn summarize_source(lines: &mut Vec<String>, kind: SourceKind, table: &Table) -> Result<()> {
    if table.is_empty() {
        lines.push(format!("No data available for {}", kind.label()));
        return Ok(());
    }

    lines.push(String::new());
    lines.push(format!("=== {} STATISTICS ===", kind.label().to_uppercase()));

    let metric_columns: Vec<String> = table
        .columns()
        .filter(|c| !KEY_COLUMNS.contains(c))
        .map(str::to_string)
        .collect();

    if table.has_column(model::GROUP_COLUMN) {
        let counts = stats::group_row_counts(table, model::GROUP_COLUMN);
        lines.push(format!("Prover configurations: {}", counts.len()));

        let per_column: Vec<_> = metric_columns
            .iter()
            .map(|c| {
                (
                    c.clone(),
                    stats::aggregate_column(table, c, Some(model::GROUP_COLUMN)),
                )
            })
            .collect();

        for (&config, &n) in &counts {
            lines.push(String::new());
            lines.push(format!(
                "{} provers (n={}):",
                model::display_provers(config),
                n
            ));
            for (column, groups) in &per_column {
                if let Some(stat) = groups.get(&config) {
                    lines.push(stat_line(column, stat)?);
                }
            }
        }
    } else {
        lines.push(format!("Total measurements: {}", table.len()));
        for column in &metric_columns {
            let groups = stats::aggregate_column(table, column, None);
            if let Some(stat) = groups.get(&stats::IMPLICIT_GROUP_KEY) {
                lines.push(stat_line(column, stat)?);
            }
        }
    }
    Ok(())
}

/// `avg ± std (min/max, n)` for one column partition, with percentiles for
/// millisecond columns.
fn stat_line(column: &str, stat: &GroupStat) -> Result<String> {
    let mut acc = OnlineStats::default();
    for &v in &stat.values {
        acc.push(v);
    }
    let mut line = format!(
        "  {}: {:.2} ± {:.2} (min {:.2}, max {:.2}, n={})",
        column,
        stat.mean,
        stat.std_dev,
        acc.min().unwrap_or(f64::NAN),
        acc.max().unwrap_or(f64::NAN),
        stat.count()
    );
    if column.ends_with("_ms") {
        let mut hist = Histogram::<u64>::new(3)?;
        for &v in &stat.values {
            if v.is_finite() && v >= 0.0 {
                hist.record(v.round() as u64)?;
            }
        }
        line.push_str(&format!(
            " | p50 {} p90 {} p99 {} ms",
            hist.value_at_quantile(0.5),
            hist.value_at_quantile(0.9),
            hist.value_at_quantile(0.99)
        ));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources_with_tournament(table: Table) -> Sources {
        Sources {
            consensus: Table::default(),
            execution: Table::default(),
            tournament: table,
        }
    }

    #[test]
    fn empty_sources_report_no_data() {
        let summary = build_summary(&sources_with_tournament(Table::default())).unwrap();
        assert_eq!(
            summary.lines,
            vec![
                "No data available for consensus",
                "No data available for execution",
                "No data available for tournament",
            ]
        );
    }

    #[test]
    fn grouped_summary_lists_each_configuration() {
        let table = Table::from_rows(
            &["num_provers", "block_number", "sync_time_ms"],
            &[
                &["0", "100", "5000"],
                &["0", "100", "7000"],
                &["1", "100", "3000"],
            ],
        );
        let summary = build_summary(&sources_with_tournament(table)).unwrap();
        let text = summary.lines.join("\n");
        assert!(text.contains("=== TOURNAMENT STATISTICS ==="));
        assert!(text.contains("Prover configurations: 2"));
        // Zero-indexed keys shown one-indexed.
        assert!(text.contains("1 provers (n=2):"));
        assert!(text.contains("2 provers (n=1):"));
        assert!(text.contains("sync_time_ms: 6000.00 ± 1000.00"));
        // Key columns are not summarized.
        assert!(!text.contains("block_number:"));
    }

    #[test]
    fn ungrouped_summary_uses_row_totals_and_percentiles() {
        let table = Table::from_rows(
            &["iteration", "consensus_oracle_time_ms", "cpu_percent"],
            &[&["1", "1000", "10"], &["2", "2000", "20"]],
        );
        let sources = Sources {
            consensus: table,
            execution: Table::default(),
            tournament: Table::default(),
        };
        let summary = build_summary(&sources).unwrap();
        let text = summary.lines.join("\n");
        assert!(text.contains("Total measurements: 2"));
        assert!(text.contains("consensus_oracle_time_ms: 1500.00 ± 500.00"));
        // Percentiles only for millisecond columns.
        assert!(text.contains("p50"));
        assert!(!text.contains("cpu_percent: 15.00 ± 5.00 (min 10.00, max 20.00, n=2) |"));
    }
}
