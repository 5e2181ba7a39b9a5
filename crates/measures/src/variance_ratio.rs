//! Lo–MacKinlay (1988) variance ratio and its test statistics.
//!
//! For each lag `k` the ratio of the k-period log-return variance to `k`
//! times the one-period variance is reported together with the z-statistics
//! under homoscedastic and heteroscedasticity-consistent assumptions.

use mktstructure_core::frame::COL_PRICE;
use mktstructure_core::{Frame, MeasureOutput};

use crate::estimator::{columns, Estimator, InputKind};

/// Variance ratio and test statistics for one lag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceRatio {
    pub ratio: f64,
    pub z_homoscedastic: f64,
    pub z_heteroscedastic: f64,
}

impl VarianceRatio {
    fn nan() -> Self {
        Self {
            ratio: f64::NAN,
            z_homoscedastic: f64::NAN,
            z_heteroscedastic: f64::NAN,
        }
    }
}

/// Compute the variance ratio of a log-price series at lag `k`.
///
/// Undefined (all NaN) when there are no more returns than the lag.
pub fn variance_ratio(log_prices: &[f64], k: usize) -> VarianceRatio {
    if log_prices.len() < 2 || k < 2 {
        return VarianceRatio::nan();
    }
    let rets: Vec<f64> = log_prices.windows(2).map(|w| w[1] - w[0]).collect();
    let t = rets.len();
    if t <= k {
        return VarianceRatio::nan();
    }
    let tf = t as f64;
    let kf = k as f64;

    let mu = rets.iter().sum::<f64>() / tf;
    let sq: Vec<f64> = rets.iter().map(|r| (r - mu) * (r - mu)).collect();
    let sum_sq: f64 = sq.iter().sum();
    let var_1 = sum_sq / (tf - 1.0);

    let m = kf * (tf - kf + 1.0) * (1.0 - kf / tf);
    let var_k = log_prices
        .iter()
        .skip(k)
        .zip(log_prices)
        .map(|(later, earlier)| {
            let d = later - earlier - kf * mu;
            d * d
        })
        .sum::<f64>()
        / m;
    let ratio = var_k / var_1;

    // Heteroscedasticity-consistent asymptotic variance.
    let phi2: f64 = (1..k)
        .map(|j| {
            let b: f64 = (j + 1..t).map(|i| sq[i] * sq[i - j]).sum();
            let delta = tf * b / (sum_sq * sum_sq);
            let a = 2.0 * (k - j) as f64 / kf;
            a * a * delta
        })
        .sum();
    let phi1 = 2.0 * (2.0 * kf - 1.0) * (kf - 1.0) / (3.0 * kf * tf);

    VarianceRatio {
        ratio,
        z_homoscedastic: (ratio - 1.0) / phi1.sqrt(),
        z_heteroscedastic: (ratio - 1.0) / phi2.sqrt(),
    }
}

/// Variance ratio test over trade prices for a set of lags.
#[derive(Debug, Clone)]
pub struct LoMacKinlay {
    lags: Vec<usize>,
}

impl LoMacKinlay {
    pub fn new(lags: Vec<usize>) -> Self {
        Self { lags }
    }
}

impl Estimator for LoMacKinlay {
    fn name(&self) -> &str {
        "LoMacKinlay1988"
    }

    fn input(&self) -> InputKind {
        InputKind::SignedTrades
    }

    fn required_columns(&self) -> Vec<String> {
        columns(&[COL_PRICE])
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let log_prices: Vec<f64> = frame
            .column(COL_PRICE)
            .unwrap_or_default()
            .iter()
            .map(|p| p.ln())
            .collect();

        let mut out = MeasureOutput::new();
        for &k in &self.lags {
            let vr = variance_ratio(&log_prices, k);
            out.push(format!("Variance Ratio (k={k})"), vr.ratio);
            out.push(
                format!("Variance Ratio Test Statistic (k={k}) Homoscedasticity Assumption"),
                vr.z_homoscedastic,
            );
            out.push(
                format!("Variance Ratio Test Statistic (k={k}) Heteroscedasticity Assumption"),
                vr.z_heteroscedastic,
            );
        }
        out
    }
}
