//! Statistical utility functions shared by the normalizer and calculators.
//!
//! Every function here drops non-finite inputs rather than propagating them,
//! so a NaN can never leak into a percentile or score.

/// Minimum spread between two breakpoints for them to be treated as distinct.
pub const MIN_SPREAD_THRESHOLD: f64 = 1e-12;

/// Collect the finite values of a slice, in input order.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::finite_values;
///
/// let values = finite_values(&[1.0, f64::NAN, 3.0, f64::INFINITY]);
/// assert_eq!(values, vec![1.0, 3.0]);
/// ```
pub fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|x| x.is_finite()).collect()
}

/// Sort finite values ascending, dropping non-finite ones.
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted = finite_values(values);
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolation quantile of pre-sorted values.
///
/// Uses the `q * (n - 1)` position convention: the quantile lies between the
/// order statistics on either side of that position. `q` is clamped to [0, 1].
///
/// # Returns
///
/// `None` when `sorted` is empty.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::quantile_sorted;
///
/// let sorted = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(quantile_sorted(&sorted, 0.5), Some(3.0));
/// assert_eq!(quantile_sorted(&sorted, 0.25), Some(2.0));
/// assert!((quantile_sorted(&sorted, 0.1).unwrap() - 1.4).abs() < 1e-12);
/// ```
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Winsorize finite values: clip everything outside the `[lower_q, upper_q]`
/// quantiles to those quantiles.
///
/// Non-finite values are dropped. The result is sorted ascending.
///
/// # Edge Cases
///
/// - Empty or all non-finite input: returns an empty vector
/// - `lower_q >= upper_q`: values are returned sorted and unclipped
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::winsorize;
///
/// let values: Vec<f64> = (1..=20).map(f64::from).collect();
/// let clipped = winsorize(&values, 0.01, 0.99);
///
/// assert_eq!(clipped.len(), 20);
/// assert!((clipped[0] - 1.19).abs() < 1e-12);
/// assert!((clipped[19] - 19.81).abs() < 1e-12);
/// ```
pub fn winsorize(values: &[f64], lower_q: f64, upper_q: f64) -> Vec<f64> {
    let mut sorted = sorted_finite(values);
    if sorted.is_empty() || lower_q >= upper_q {
        return sorted;
    }

    // quantile_sorted only returns None for empty input
    let (Some(lo), Some(hi)) = (
        quantile_sorted(&sorted, lower_q),
        quantile_sorted(&sorted, upper_q),
    ) else {
        return sorted;
    };

    for v in &mut sorted {
        *v = v.clamp(lo, hi);
    }
    sorted
}

/// Mean of the finite values, `None` if there are none.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::mean;
///
/// assert_eq!(mean(&[2.0, 4.0, f64::NAN]), Some(3.0));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(values: &[f64]) -> Option<f64> {
    let finite = finite_values(values);
    if finite.is_empty() {
        return None;
    }
    Some(finite.iter().sum::<f64>() / finite.len() as f64)
}

/// Weighted mean over `(value, weight)` pairs, skipping non-finite values and
/// non-positive weights. The weights of the skipped pairs are redistributed
/// implicitly by normalizing over the remaining weights.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    let (sum, total) = pairs
        .iter()
        .filter(|(v, w)| v.is_finite() && w.is_finite() && *w > 0.0)
        .fold((0.0, 0.0), |(sum, total), (v, w)| (sum + v * w, total + w));

    (total > 0.0).then(|| sum / total)
}

/// Number of quarters between a period and the same period a year earlier.
pub const QUARTERS_PER_YEAR: usize = 4;

/// Year-over-year percent change of a quarterly series, most recent first.
///
/// Compares the latest quarter with the quarter four periods earlier using a
/// sign-aware denominator, `(current - prior) / |prior| * 100`, so a move from
/// a loss to a profit is a large positive change instead of a negative one.
///
/// # Returns
///
/// `None` when fewer than five quarters are available, when either value is
/// non-finite, or when the prior value is zero.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::year_over_year_growth;
///
/// // Turnaround: EPS from -1.00 to +2.00
/// let eps = [2.0, 0.5, 0.1, -0.4, -1.0];
/// assert_eq!(year_over_year_growth(&eps), Some(300.0));
///
/// // Not enough history
/// assert_eq!(year_over_year_growth(&[1.0, 1.0, 1.0, 1.0]), None);
/// ```
pub fn year_over_year_growth(quarters: &[f64]) -> Option<f64> {
    let current = *quarters.first()?;
    let prior = *quarters.get(QUARTERS_PER_YEAR)?;

    if !current.is_finite() || !prior.is_finite() || prior.abs() < MIN_SPREAD_THRESHOLD {
        return None;
    }

    let growth = (current - prior) / prior.abs() * 100.0;
    growth.is_finite().then_some(growth)
}
