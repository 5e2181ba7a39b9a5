//! Small numeric helpers shared by the estimators.

use mktstructure_core::TimestampNs;
use statrs::statistics::Statistics;

/// Σ(x·w) / Σw. NaN when there are no observations.
pub fn weighted_mean(values: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let (num, den) = values
        .into_iter()
        .fold((0.0, 0.0), |(num, den), (x, w)| (num + x * w, den + w));
    num / den
}

/// Mean of the finite values. NaN when there are none.
pub fn finite_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>()
        .mean()
}

/// For each row, the first row at or after `ts + horizon_ns`.
///
/// The index must be sorted. Matching stops at the first row without a
/// match, so the result covers a prefix of the rows.
pub fn forward_match(index: &[TimestampNs], horizon_ns: i64) -> Vec<usize> {
    index
        .iter()
        .map(|&ts| index.partition_point(|&t| t < ts + horizon_ns))
        .take_while(|&j| j < index.len())
        .collect()
}

/// OLS slope of `y` on `x` with an intercept. NaN if `x` has no variance.
pub fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let mx = x.mean();
    let my = y.mean();
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (xi, yi)| {
            (sxy + (xi - mx) * (yi - my), sxx + (xi - mx) * (xi - mx))
        });
    if sxx == 0.0 {
        f64::NAN
    } else {
        sxy / sxx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weighted_mean() {
        assert_relative_eq!(weighted_mean([(1.0, 1.0), (3.0, 3.0)]), 2.5);
        assert!(weighted_mean(std::iter::empty()).is_nan());
    }

    #[test]
    fn test_finite_mean() {
        assert_relative_eq!(finite_mean([1.0, f64::INFINITY, 3.0, f64::NAN]), 2.0);
        assert!(finite_mean([f64::NAN]).is_nan());
    }

    #[test]
    fn test_forward_match() {
        // Horizon 5: 0 -> 5 (row 2), 3 -> 8 (row 3), 5 -> 10 (row 3), 9 -> none.
        let index = [0, 3, 5, 10];
        assert_eq!(forward_match(&index, 5), vec![2, 3, 3]);
    }

    #[test]
    fn test_forward_match_none() {
        assert!(forward_match(&[0, 1, 2], 100).is_empty());
        assert!(forward_match(&[], 100).is_empty());
    }

    #[test]
    fn test_ols_slope() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(ols_slope(&x, &y), 2.0, epsilon = 1e-12);
        assert!(ols_slope(&[1.0, 1.0], &[2.0, 3.0]).is_nan());
    }
}
