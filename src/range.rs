//! Axis-range selection.
//!
//! Charts start from a fixed per-metric default range; when the data only
//! occupies a sliver of it, the range narrows toward the data so the series
//! stays readable.

/// Display range of a chart axis. Every measured quantity is non-negative,
/// so `min` is clamped to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        let min = min.max(0.0);
        AxisRange {
            min,
            max: max.max(min),
        }
    }

    pub fn span(self) -> f64 {
        self.max - self.min
    }
}

/// Halvings applied before the loop gives up.
const MAX_NARROWING_STEPS: usize = 3;
/// Padding on the realized data span before comparing it to the displayed
/// span.
const DATA_PADDING: f64 = 1.2;
/// Narrowing stops once the padded data span fills at least this fraction
/// of the displayed span.
const MIN_SPAN_RATIO: f64 = 0.3;
/// Fraction of the displayed span kept per narrowing step.
const SHRINK_FACTOR: f64 = 0.5;

/// Narrow `default` toward the realized data range. The data span is the
/// observed extent, widened by the largest standard deviation on each side
/// when one is supplied, then padded. Each step recenters on the data
/// midpoint, halves the displayed span, and clamps to `[0, previous max]`;
/// the loop is capped so the result is never tighter than three halvings.
pub fn select_range(
    default: AxisRange,
    data_min: f64,
    data_max: f64,
    max_std: Option<f64>,
) -> AxisRange {
    let std = max_std.unwrap_or(0.0);
    let padded_span = ((data_max + std) - (data_min - std)) * DATA_PADDING;
    let center = (data_min + data_max) / 2.0;

    let mut current = default;
    for _ in 0..MAX_NARROWING_STEPS {
        if padded_span >= current.span() * MIN_SPAN_RATIO {
            break;
        }
        let half = current.span() * SHRINK_FACTOR / 2.0;
        let max = (center + half).min(current.max);
        let min = (center - half).max(0.0).min(max);
        current = AxisRange { min, max };
    }
    current
}

/// Range for a set of aggregated values; the default is returned unchanged
/// when there are none.
pub fn range_for_values(default: AxisRange, values: &[f64], max_std: Option<f64>) -> AxisRange {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let Some(first) = finite.next() else {
        return default;
    };
    let (min, max) = finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    select_range(default, min, max, max_std)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_data_keeps_the_default_range() {
        let default = AxisRange::new(0.0, 30.0);
        // 10..25 padded is well above 30% of the default span.
        let r = select_range(default, 10.0, 25.0, None);
        assert_eq!(r, default);
    }

    #[test]
    fn narrow_data_shrinks_toward_the_data_center() {
        let default = AxisRange::new(0.0, 30.0);
        let r = select_range(default, 1.0, 1.2, None);
        assert!(r.min >= 0.0);
        assert!(r.min <= r.max);
        assert!(r.span() < default.span());
        // The data center stays inside the narrowed range.
        assert!(r.min <= 1.1 && 1.1 <= r.max);
    }

    #[test]
    fn narrowing_is_capped_at_three_halvings() {
        let default = AxisRange::new(0.0, 1000.0);
        // A point in the middle of the range never clamps, so each of the
        // three steps is an exact halving around it.
        let r = select_range(default, 500.0, 500.0, None);
        assert_eq!(r.span(), 1000.0 * 0.5f64.powi(3));
        assert_eq!(r, AxisRange::new(437.5, 562.5));
    }

    #[test]
    fn near_zero_data_clamps_the_minimum_at_zero() {
        let default = AxisRange::new(0.0, 1000.0);
        let r = select_range(default, 0.5, 0.5, None);
        assert_eq!(r.min, 0.0);
        assert!(r.min <= r.max);
        assert!(r.max <= default.max);
        assert!(r.max >= 0.5);
    }

    #[test]
    fn std_widens_the_data_span_and_stops_narrowing_earlier() {
        let default = AxisRange::new(0.0, 30.0);
        let tight = select_range(default, 10.0, 10.5, None);
        let wide = select_range(default, 10.0, 10.5, Some(4.0));
        assert!(wide.span() >= tight.span());
        assert_eq!(wide, default);
    }

    #[test]
    fn max_never_exceeds_the_default() {
        let default = AxisRange::new(0.0, 10.0);
        // Data far above the default: the range may recenter but not grow.
        let r = select_range(default, 0.2, 0.4, None);
        assert!(r.max <= default.max);
        assert!(r.min <= r.max);
    }

    #[test]
    fn empty_values_return_the_default_unchanged() {
        let default = AxisRange::new(0.0, 30.0);
        assert_eq!(range_for_values(default, &[], None), default);
    }

    #[test]
    fn axis_range_clamps_negative_minimum() {
        let r = AxisRange::new(-5.0, 10.0);
        assert_eq!(r.min, 0.0);
        assert_eq!(r.max, 10.0);
    }
}
