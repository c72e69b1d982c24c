use crate::range::AxisRange;

/// Column holding the prover-configuration key (zero-indexed: 0 means one
/// prover). Oracle exports may omit it entirely.
pub const GROUP_COLUMN: &str = "num_provers";
/// Ordinal column for tournament series.
pub const BLOCK_COLUMN: &str = "block_number";
/// Ordinal column for oracle series.
pub const ITERATION_COLUMN: &str = "iteration";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Columns that key or annotate a row rather than measure anything; the
/// statistics summary skips them.
pub const KEY_COLUMNS: [&str; 4] = [
    GROUP_COLUMN,
    BLOCK_COLUMN,
    ITERATION_COLUMN,
    TIMESTAMP_COLUMN,
];

/// Prover counts are stored zero-indexed; charts and the console summary
/// show them one-indexed. Presentation only, stored keys are never changed.
pub fn display_provers(key: i64) -> i64 {
    key + 1
}

/// Semantic kind of a measured quantity. Drives which units and which trend
/// model apply to a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    ElapsedTime,
    CpuPercent,
    Memory,
    NetworkBytes,
}

/// Display unit for a metric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Milliseconds,
    Seconds,
    Minutes,
    Bytes,
    Megabytes,
    Gigabytes,
    Percent,
}

impl Unit {
    /// Divisor taking a raw sample into this unit.
    pub fn divisor(self) -> f64 {
        match self {
            Unit::Milliseconds | Unit::Bytes | Unit::Percent => 1.0,
            Unit::Seconds => 1_000.0,
            Unit::Minutes => 60_000.0,
            Unit::Megabytes => 1024.0 * 1024.0,
            Unit::Gigabytes => 1024.0 * 1024.0 * 1024.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Milliseconds => "ms",
            Unit::Seconds => "s",
            Unit::Minutes => "min",
            Unit::Bytes => "bytes",
            Unit::Megabytes => "MB",
            Unit::Gigabytes => "GB",
            Unit::Percent => "percent",
        }
    }

    fn fits(self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::ElapsedTime => {
                matches!(self, Unit::Milliseconds | Unit::Seconds | Unit::Minutes)
            }
            MetricKind::CpuPercent => matches!(self, Unit::Percent),
            MetricKind::Memory | MetricKind::NetworkBytes => {
                matches!(self, Unit::Bytes | Unit::Megabytes | Unit::Gigabytes)
            }
        }
    }
}

/// A metric column together with its kind and the unit charts display it in.
/// The conversion is resolved here, once, so call sites never branch on
/// column names.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub column: &'static str,
    pub kind: MetricKind,
    pub unit: Unit,
    pub title: &'static str,
    pub default_range: AxisRange,
}

impl MetricSpec {
    pub fn new(
        column: &'static str,
        kind: MetricKind,
        unit: Unit,
        title: &'static str,
        default_range: AxisRange,
    ) -> Self {
        debug_assert!(unit.fits(kind), "{column}: {unit:?} does not fit {kind:?}");
        Self {
            column,
            kind,
            unit,
            title,
            default_range,
        }
    }

    /// Convert a raw sample into the display unit.
    pub fn scale(&self, raw: f64) -> f64 {
        raw / self.unit.divisor()
    }

    /// Label for the y axis, e.g. "Sync Time (s)".
    pub fn axis_label(&self) -> String {
        format!("{} ({})", self.title, self.unit.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Consensus,
    Execution,
    Tournament,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Consensus => "consensus",
            SourceKind::Execution => "execution",
            SourceKind::Tournament => "tournament",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::Consensus => "Consensus",
            SourceKind::Execution => "Execution",
            SourceKind::Tournament => "Tournament",
        }
    }

    pub fn csv_name(self) -> &'static str {
        match self {
            SourceKind::Consensus => "consensus_oracle_measurements.csv",
            SourceKind::Execution => "execution_oracle_measurements.csv",
            SourceKind::Tournament => "tournament_measurements.csv",
        }
    }

    /// Elapsed-time column for this source; the collector prefixes the
    /// oracle columns with the oracle name.
    pub fn time_column(self) -> &'static str {
        match self {
            SourceKind::Consensus => "consensus_oracle_time_ms",
            SourceKind::Execution => "execution_oracle_time_ms",
            SourceKind::Tournament => "sync_time_ms",
        }
    }
}

/// Metrics charted for the tournament source. Memory is shown in GB here,
/// in MB on the oracle views.
pub fn tournament_metrics() -> [MetricSpec; 5] {
    [
        MetricSpec::new(
            "sync_time_ms",
            MetricKind::ElapsedTime,
            Unit::Seconds,
            "Sync Time",
            AxisRange::new(0.0, 30.0),
        ),
        MetricSpec::new(
            "cpu_percent",
            MetricKind::CpuPercent,
            Unit::Percent,
            "CPU Usage",
            AxisRange::new(0.0, 100.0),
        ),
        MetricSpec::new(
            "memory_bytes",
            MetricKind::Memory,
            Unit::Gigabytes,
            "Memory Usage",
            AxisRange::new(0.0, 15.0),
        ),
        MetricSpec::new(
            "network_bytes_in",
            MetricKind::NetworkBytes,
            Unit::Megabytes,
            "Network Bytes In",
            AxisRange::new(0.0, 20.0),
        ),
        MetricSpec::new(
            "network_bytes_out",
            MetricKind::NetworkBytes,
            Unit::Megabytes,
            "Network Bytes Out",
            AxisRange::new(0.0, 3.0),
        ),
    ]
}

/// Metrics charted for a single oracle source.
pub fn oracle_metrics(kind: SourceKind) -> [MetricSpec; 5] {
    [
        MetricSpec::new(
            kind.time_column(),
            MetricKind::ElapsedTime,
            Unit::Seconds,
            "Oracle Time",
            AxisRange::new(0.0, 30.0),
        ),
        MetricSpec::new(
            "cpu_percent",
            MetricKind::CpuPercent,
            Unit::Percent,
            "CPU Usage",
            AxisRange::new(0.0, 100.0),
        ),
        MetricSpec::new(
            "memory_bytes",
            MetricKind::Memory,
            Unit::Megabytes,
            "Memory Usage",
            AxisRange::new(0.0, 15_000.0),
        ),
        MetricSpec::new(
            "network_bytes_in",
            MetricKind::NetworkBytes,
            Unit::Megabytes,
            "Network Bytes In",
            AxisRange::new(0.0, 20.0),
        ),
        MetricSpec::new(
            "network_bytes_out",
            MetricKind::NetworkBytes,
            Unit::Megabytes,
            "Network Bytes Out",
            AxisRange::new(0.0, 3.0),
        ),
    ]
}
