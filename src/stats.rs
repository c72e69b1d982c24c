//! Aggregation of measurement rows into per-group statistics.

use crate::dataset::{parse_f64, Table};
use crate::model::MetricSpec;
use std::collections::BTreeMap;

/// Group key used when a table has no group column: all rows form one
/// implicit group.
pub const IMPLICIT_GROUP_KEY: i64 = 1;

/// Welford running accumulator for mean and population variance.
#[derive(Debug, Clone)]
pub struct OnlineStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for OnlineStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl OnlineStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance; zero for an empty or single-sample series.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }
}

/// Mean, population standard deviation and the raw values of one partition,
/// in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStat {
    pub mean: f64,
    pub std_dev: f64,
    pub values: Vec<f64>,
}

impl GroupStat {
    /// `None` for an empty partition; empty groups never appear in an
    /// aggregation result.
    pub fn from_values(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut acc = OnlineStats::default();
        for &v in &values {
            acc.push(v);
        }
        Some(GroupStat {
            mean: acc.mean(),
            std_dev: acc.std_dev(),
            values,
        })
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }
}

fn parse_key(cell: Option<&str>) -> Option<i64> {
    let c = cell?.trim();
    c.parse::<i64>()
        .ok()
        .or_else(|| c.parse::<f64>().ok().map(|v| v as i64))
}

fn aggregate_with<F>(
    table: &Table,
    column: &str,
    group_column: Option<&str>,
    scale: F,
) -> BTreeMap<i64, GroupStat>
where
    F: Fn(f64) -> f64,
{
    let Some(metric_idx) = table.column_index(column) else {
        return BTreeMap::new();
    };
    let group_idx = group_column.and_then(|g| table.column_index(g));

    let mut partitions: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        let Some(value) = parse_f64(row.get(metric_idx)) else {
            continue;
        };
        let key = match group_idx {
            Some(idx) => match parse_key(row.get(idx)) {
                Some(k) => k,
                None => continue,
            },
            None => IMPLICIT_GROUP_KEY,
        };
        partitions.entry(key).or_default().push(scale(value));
    }

    partitions
        .into_iter()
        .filter_map(|(key, values)| GroupStat::from_values(values).map(|s| (key, s)))
        .collect()
}

/// Partition `column` by the distinct values of `group_column` (ascending)
/// and compute per-group stats on the raw values. Rows whose metric cell is
/// blank or non-numeric are excluded. A missing or absent group column puts
/// every row into [`IMPLICIT_GROUP_KEY`].
pub fn aggregate_column(
    table: &Table,
    column: &str,
    group_column: Option<&str>,
) -> BTreeMap<i64, GroupStat> {
    aggregate_with(table, column, group_column, |v| v)
}

/// Same partitioning, with the metric scaled into its display unit before
/// aggregation.
pub fn aggregate_metric(
    table: &Table,
    spec: &MetricSpec,
    group_column: Option<&str>,
) -> BTreeMap<i64, GroupStat> {
    aggregate_with(table, spec.column, group_column, |v| spec.scale(v))
}

/// Nested partitioning for per-ordinal series: group key → ordered
/// (ordinal, stats) pairs, with the metric scaled into its display unit.
/// Empty when either key column is absent.
pub fn block_series(
    table: &Table,
    spec: &MetricSpec,
    group_column: &str,
    ordinal_column: &str,
) -> BTreeMap<i64, Vec<(i64, GroupStat)>> {
    let (Some(metric_idx), Some(group_idx), Some(ordinal_idx)) = (
        table.column_index(spec.column),
        table.column_index(group_column),
        table.column_index(ordinal_column),
    ) else {
        return BTreeMap::new();
    };

    let mut nested: BTreeMap<i64, BTreeMap<i64, Vec<f64>>> = BTreeMap::new();
    for row in table.rows() {
        let Some(value) = parse_f64(row.get(metric_idx)) else {
            continue;
        };
        let (Some(group), Some(ordinal)) =
            (parse_key(row.get(group_idx)), parse_key(row.get(ordinal_idx)))
        else {
            continue;
        };
        nested
            .entry(group)
            .or_default()
            .entry(ordinal)
            .or_default()
            .push(spec.scale(value));
    }

    nested
        .into_iter()
        .map(|(group, by_ordinal)| {
            let series = by_ordinal
                .into_iter()
                .filter_map(|(ordinal, values)| {
                    GroupStat::from_values(values).map(|s| (ordinal, s))
                })
                .collect();
            (group, series)
        })
        .collect()
}

/// Row count per group key, for the console summary headers.
pub fn group_row_counts(table: &Table, group_column: &str) -> BTreeMap<i64, usize> {
    let Some(idx) = table.column_index(group_column) else {
        return BTreeMap::new();
    };
    let mut counts = BTreeMap::new();
    for row in table.rows() {
        if let Some(key) = parse_key(row.get(idx)) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MetricKind, Unit};
    use crate::range::AxisRange;

    fn sample_table() -> Table {
        Table::from_rows(
            &["num_provers", "block_number", "sync_time_ms"],
            &[
                &["0", "100", "5000"],
                &["0", "100", "7000"],
                &["1", "100", "3000"],
            ],
        )
    }

    fn sync_spec() -> MetricSpec {
        MetricSpec::new(
            "sync_time_ms",
            MetricKind::ElapsedTime,
            Unit::Milliseconds,
            "Sync Time",
            AxisRange::new(0.0, 30_000.0),
        )
    }

    #[test]
    fn aggregates_mean_and_population_std_per_group() {
        let groups = aggregate_column(&sample_table(), "sync_time_ms", Some("num_provers"));
        assert_eq!(groups.len(), 2);

        let g0 = &groups[&0];
        assert_eq!(g0.mean, 6000.0);
        assert_eq!(g0.std_dev, 1000.0);
        assert_eq!(g0.count(), 2);
        assert_eq!(g0.values, vec![5000.0, 7000.0]);

        let g1 = &groups[&1];
        assert_eq!(g1.mean, 3000.0);
        assert_eq!(g1.std_dev, 0.0);
        assert_eq!(g1.count(), 1);
    }

    #[test]
    fn partitions_are_disjoint_and_cover_all_numeric_rows() {
        let table = Table::from_rows(
            &["num_provers", "v"],
            &[
                &["0", "1"],
                &["2", "2"],
                &["0", "3"],
                &["1", ""],
                &["1", "4"],
            ],
        );
        let groups = aggregate_column(&table, "v", Some("num_provers"));
        let total: usize = groups.values().map(GroupStat::count).sum();
        // Four rows carry a numeric value; the blank one is excluded.
        assert_eq!(total, 4);
        for stat in groups.values() {
            assert_eq!(stat.count(), stat.values.len());
            let mean = stat.values.iter().sum::<f64>() / stat.values.len() as f64;
            assert!((stat.mean - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_group_column_uses_the_implicit_key() {
        let table = Table::from_rows(&["v"], &[&["2"], &["4"]]);
        let groups = aggregate_column(&table, "v", Some("num_provers"));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&IMPLICIT_GROUP_KEY].mean, 3.0);
    }

    #[test]
    fn empty_table_aggregates_to_empty_mapping() {
        let groups = aggregate_column(&Table::default(), "v", Some("num_provers"));
        assert!(groups.is_empty());
    }

    #[test]
    fn block_series_groups_by_config_then_block() {
        let series = block_series(&sample_table(), &sync_spec(), "num_provers", "block_number");
        assert_eq!(series.len(), 2);

        let (block, stat) = &series[&0][0];
        assert_eq!(*block, 100);
        assert_eq!(stat.mean, 6000.0);
        assert_eq!(stat.std_dev, 1000.0);
        assert_eq!(stat.count(), 2);

        let (_, stat) = &series[&1][0];
        assert_eq!(stat.mean, 3000.0);
        assert_eq!(stat.std_dev, 0.0);
    }

    #[test]
    fn block_series_applies_the_display_unit() {
        let spec = MetricSpec::new(
            "sync_time_ms",
            MetricKind::ElapsedTime,
            Unit::Seconds,
            "Sync Time",
            AxisRange::new(0.0, 30.0),
        );
        let series = block_series(&sample_table(), &spec, "num_provers", "block_number");
        assert_eq!(series[&0][0].1.mean, 6.0);
    }

    #[test]
    fn online_stats_match_direct_computation() {
        let mut acc = OnlineStats::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.push(v);
        }
        assert_eq!(acc.count(), 8);
        assert!((acc.mean() - 5.0).abs() < 1e-12);
        assert!((acc.std_dev() - 2.0).abs() < 1e-12);
        assert_eq!(acc.min(), Some(2.0));
        assert_eq!(acc.max(), Some(9.0));
    }

    #[test]
    fn group_row_counts_counts_rows_not_values() {
        let table = Table::from_rows(
            &["num_provers", "v"],
            &[&["0", ""], &["0", "1"], &["1", "2"]],
        );
        let counts = group_row_counts(&table, "num_provers");
        assert_eq!(counts[&0], 2);
        assert_eq!(counts[&1], 1);
    }
}
