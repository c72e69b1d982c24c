//! Trend-line and reference-series generators.
//!
//! Each generator is a stateless transform from (x, y) samples and a domain
//! window to two parallel x/y vectors sized for the renderer. Generators
//! that fit observed data return `None` when fewer than two usable samples
//! fall inside the fit window.

/// Evaluation points produced by every generator.
pub const CURVE_POINTS: usize = 100;

/// Least-squares slope and intercept; `None` with fewer than two samples or
/// a degenerate x spread.
fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

fn in_window(samples: &[(f64, f64)], window: (f64, f64)) -> Vec<(f64, f64)> {
    samples
        .iter()
        .copied()
        .filter(|&(x, _)| x >= window.0 && x <= window.1)
        .collect()
}

pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Log10-spaced grid from `start` to `end`; both must be positive.
pub fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    linspace(start.log10(), end.log10(), n)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect()
}

/// Fit `y = a·log10(x) + b` over the samples inside `fit_window` and
/// evaluate on a log-spaced grid across `domain`, extrapolating the trend
/// beyond the sampled range.
pub fn log10_fit(
    samples: &[(f64, f64)],
    fit_window: (f64, f64),
    domain: (f64, f64),
) -> Option<(Vec<f64>, Vec<f64>)> {
    let points: Vec<(f64, f64)> = in_window(samples, fit_window)
        .into_iter()
        .filter(|&(x, _)| x > 0.0)
        .map(|(x, y)| (x.log10(), y))
        .collect();
    let (a, b) = least_squares(&points)?;
    let xs = logspace(domain.0.max(f64::MIN_POSITIVE), domain.1, CURVE_POINTS);
    let ys = xs.iter().map(|x| a * x.log10() + b).collect();
    Some((xs, ys))
}

/// Fit `y = a·x + b` over the samples inside `fit_window` and evaluate on a
/// linearly spaced grid across `domain`.
pub fn linear_fit(
    samples: &[(f64, f64)],
    fit_window: (f64, f64),
    domain: (f64, f64),
) -> Option<(Vec<f64>, Vec<f64>)> {
    let points = in_window(samples, fit_window);
    let (a, b) = least_squares(&points)?;
    let xs = linspace(domain.0, domain.1, CURVE_POINTS);
    let ys = xs.iter().map(|x| a * x + b).collect();
    Some((xs, ys))
}

/// Average of the samples at or beyond `threshold`, replicated across
/// `domain`; for metrics that flatten out at steady state.
pub fn plateau_fit(
    samples: &[(f64, f64)],
    threshold: f64,
    domain: (f64, f64),
) -> Option<(Vec<f64>, Vec<f64>)> {
    let tail: Vec<f64> = samples
        .iter()
        .filter(|&&(x, _)| x >= threshold)
        .map(|&(_, y)| y)
        .collect();
    if tail.len() < 2 {
        return None;
    }
    let level = tail.iter().sum::<f64>() / tail.len() as f64;
    let xs = linspace(domain.0, domain.1, CURVE_POINTS);
    let ys = vec![level; xs.len()];
    Some((xs, ys))
}

/// Fixed-rate model of a full node that processes every block:
/// `y = rate·x`. Independent of observed data.
pub fn full_node_reference(domain: (f64, f64), seconds_per_block: f64) -> (Vec<f64>, Vec<f64>) {
    let xs = linspace(domain.0, domain.1, CURVE_POINTS);
    let ys = xs.iter().map(|x| x * seconds_per_block).collect();
    (xs, ys)
}

/// Closed-form growth baseline: `y0` doubling every `doubling` units of x.
pub fn exponential_reference(domain: (f64, f64), y0: f64, doubling: f64) -> (Vec<f64>, Vec<f64>) {
    let xs = linspace(domain.0, domain.1, CURVE_POINTS);
    let ys = xs.iter().map(|x| y0 * (x / doubling).exp2()).collect();
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_two_points_in_window_yields_none() {
        let samples = vec![(1.0, 1.0), (100.0, 2.0)];
        // Only one sample falls inside the window.
        assert!(log10_fit(&samples, (0.5, 2.0), (1.0, 1000.0)).is_none());
        assert!(linear_fit(&samples, (0.5, 2.0), (1.0, 1000.0)).is_none());
        assert!(plateau_fit(&samples, 50.0, (1.0, 1000.0)).is_none());
        assert!(log10_fit(&[], (0.0, 1.0), (1.0, 10.0)).is_none());
    }

    #[test]
    fn log_fit_recovers_an_exact_logarithmic_series() {
        // y = 2·log10(x) + 1
        let samples: Vec<(f64, f64)> = [10.0, 100.0, 1000.0]
            .iter()
            .map(|&x: &f64| (x, 2.0 * x.log10() + 1.0))
            .collect();
        let (xs, ys) = log10_fit(&samples, (1.0, 1000.0), (10.0, 100_000.0)).unwrap();
        assert_eq!(xs.len(), CURVE_POINTS);
        assert_eq!(ys.len(), CURVE_POINTS);
        assert!((xs[0] - 10.0).abs() < 1e-6);
        assert!((xs[CURVE_POINTS - 1] - 100_000.0).abs() < 1e-3);
        // Extrapolated endpoint: 2·log10(1e5) + 1 = 11.
        assert!((ys[CURVE_POINTS - 1] - 11.0).abs() < 1e-6);
    }

    #[test]
    fn linear_fit_recovers_slope_and_intercept() {
        let samples = vec![(0.0, 3.0), (1.0, 5.0), (2.0, 7.0)];
        let (xs, ys) = linear_fit(&samples, (0.0, 2.0), (0.0, 10.0)).unwrap();
        assert_eq!(xs.len(), CURVE_POINTS);
        assert!((ys[0] - 3.0).abs() < 1e-9);
        assert!((ys[CURVE_POINTS - 1] - 23.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_samples_do_not_fit() {
        let samples = vec![(1.0, 1.0), (1.0, 5.0)];
        assert!(linear_fit(&samples, (0.0, 2.0), (0.0, 10.0)).is_none());
    }

    #[test]
    fn plateau_fit_averages_the_tail_only() {
        let samples = vec![(1.0, 100.0), (50.0, 10.0), (60.0, 14.0), (70.0, 12.0)];
        let (xs, ys) = plateau_fit(&samples, 50.0, (0.0, 200.0)).unwrap();
        assert_eq!(xs.len(), CURVE_POINTS);
        assert!(ys.iter().all(|&y| (y - 12.0).abs() < 1e-9));
    }

    #[test]
    fn full_node_reference_is_ten_seconds_at_block_1000() {
        let (_, ys) = full_node_reference((0.0, 1000.0), 0.010);
        assert!((ys[CURVE_POINTS - 1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn exponential_reference_doubles_per_doubling_interval() {
        let (xs, ys) = exponential_reference((0.0, 200.0), 1.5, 100.0);
        assert!((ys[0] - 1.5).abs() < 1e-9);
        let mid = xs.iter().position(|&x| (x - 100.0).abs() < 1.1).unwrap();
        assert!((ys[mid] / ys[0] - 2.0).abs() < 0.05);
        assert!((ys[CURVE_POINTS - 1] - 6.0).abs() < 1e-9);
    }

    #[test]
    fn logspace_spans_the_requested_decades() {
        let xs = logspace(1.0, 1000.0, 4);
        assert_eq!(xs.len(), 4);
        assert!((xs[0] - 1.0).abs() < 1e-9);
        assert!((xs[1] - 10.0).abs() < 1e-6);
        assert!((xs[3] - 1000.0).abs() < 1e-6);
    }
}
