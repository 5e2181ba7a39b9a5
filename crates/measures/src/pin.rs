//! Probability of informed trading (Easley et al.) by maximum likelihood.
//!
//! Buy and sell counts per fixed-width bucket are fitted to the EKOP mixture
//! model with parameters (α, δ, μ, εb, εs). Two numerically different
//! factorizations of the same likelihood are provided: Easley, Hvidkjaer and
//! O'Hara (2010) and Lin and Ke (2011). PIN = αμ / (αμ + εb + εs).

use mktstructure_core::frame::COL_DIRECTION;
use mktstructure_core::{Frame, MeasureOutput, NANOS_PER_MINUTE};
use ordered_float::OrderedFloat;
use statrs::function::factorial::ln_factorial;
use tracing::trace;

use crate::estimator::{columns, Estimator, InputKind};
use crate::optimize::{nelder_mead, SimplexOptions};
use crate::resample::Buckets;

/// Likelihood factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Eho2010,
    Lk2011,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Eho2010 => "EHO2010",
            Method::Lk2011 => "LK2011",
        }
    }
}

/// Model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinParams {
    /// Probability of an information event.
    pub alpha: f64,
    /// Probability that an event is bad news.
    pub delta: f64,
    /// Informed arrival rate.
    pub mu: f64,
    /// Uninformed buy arrival rate.
    pub eps_b: f64,
    /// Uninformed sell arrival rate.
    pub eps_s: f64,
}

impl PinParams {
    #[inline]
    pub fn pin(&self) -> f64 {
        let informed = self.alpha * self.mu;
        informed / (informed + self.eps_b + self.eps_s)
    }

    fn is_valid(&self) -> bool {
        let probability = |p: f64| p > 0.0 && p < 1.0;
        probability(self.alpha)
            && probability(self.delta)
            && self.mu > 0.0
            && self.eps_b > 0.0
            && self.eps_s > 0.0
    }

    /// Unconstrained coordinates: logit for probabilities, log for rates.
    fn to_unconstrained(self) -> [f64; 5] {
        let logit = |p: f64| (p / (1.0 - p)).ln();
        [
            logit(self.alpha),
            logit(self.delta),
            self.mu.ln(),
            self.eps_b.ln(),
            self.eps_s.ln(),
        ]
    }

    fn from_unconstrained(u: &[f64]) -> Self {
        let sigmoid = |x: f64| 1.0 / (1.0 + (-x).exp());
        Self {
            alpha: sigmoid(u[0]),
            delta: sigmoid(u[1]),
            mu: u[2].exp(),
            eps_b: u[3].exp(),
            eps_s: u[4].exp(),
        }
    }
}

/// Fitted model.
#[derive(Debug, Clone, Copy)]
pub struct PinEstimate {
    pub params: PinParams,
    pub log_likelihood: f64,
}

impl PinEstimate {
    #[inline]
    pub fn pin(&self) -> f64 {
        self.params.pin()
    }
}

fn ln_count_factorials(b: f64, s: f64) -> f64 {
    ln_factorial(b as u64) + ln_factorial(s as u64)
}

/// Log-likelihood, EHO (2010) factorization.
pub fn log_likelihood_eho(p: &PinParams, buys: &[f64], sells: &[f64]) -> f64 {
    let xb = p.eps_b / (p.mu + p.eps_b);
    let xs = p.eps_s / (p.mu + p.eps_s);
    let e_mu = (-p.mu).exp();
    buys.iter()
        .zip(sells)
        .map(|(&b, &s)| {
            let m = b.min(s) + b.max(s) / 2.0;
            let mix = p.alpha * (1.0 - p.delta) * e_mu * xs.powf(s - m) * xb.powf(-m)
                + p.alpha * p.delta * e_mu * xb.powf(b - m) * xs.powf(-m)
                + (1.0 - p.alpha) * xs.powf(s - m) * xb.powf(b - m);
            -p.eps_b - p.eps_s
                + m * (xb.ln() + xs.ln())
                + b * (p.mu + p.eps_b).ln()
                + s * (p.mu + p.eps_s).ln()
                + mix.ln()
                - ln_count_factorials(b, s)
        })
        .sum()
}

/// Log-likelihood, Lin–Ke (2011) factorization (log-sum-exp over regimes).
pub fn log_likelihood_lk(p: &PinParams, buys: &[f64], sells: &[f64]) -> f64 {
    buys.iter()
        .zip(sells)
        .map(|(&b, &s)| {
            let lb = b * (p.mu / p.eps_b).ln_1p();
            let ls = s * (p.mu / p.eps_s).ln_1p();
            let good = -p.mu - ls;
            let bad = -p.mu - lb;
            let none = -lb - ls;
            let e_max = good.max(bad).max(none);
            let mix = p.alpha * (1.0 - p.delta) * (good - e_max).exp()
                + p.alpha * p.delta * (bad - e_max).exp()
                + (1.0 - p.alpha) * (none - e_max).exp();
            -p.eps_b - p.eps_s
                + b * (p.mu + p.eps_b).ln()
                + s * (p.mu + p.eps_s).ln()
                + e_max
                + mix.ln()
                - ln_count_factorials(b, s)
        })
        .sum()
}

/// Yan and Zhang (2012) grid of starting values. Infeasible points are skipped.
fn starting_points(mean_b: f64, mean_s: f64) -> Vec<PinParams> {
    const GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];
    let mut starts = Vec::new();
    for alpha in GRID {
        for delta in GRID {
            for gamma in GRID {
                let eps_b = gamma * mean_b;
                let mu = (mean_b - eps_b) / (alpha * (1.0 - delta));
                let eps_s = mean_s - alpha * delta * mu;
                let p = PinParams {
                    alpha,
                    delta,
                    mu,
                    eps_b,
                    eps_s,
                };
                if p.is_valid() {
                    starts.push(p);
                }
            }
        }
    }
    if starts.is_empty() {
        let rate = ((mean_b + mean_s) / 2.0).max(1e-3);
        starts.push(PinParams {
            alpha: 0.5,
            delta: 0.5,
            mu: rate,
            eps_b: mean_b.max(1e-3),
            eps_s: mean_s.max(1e-3),
        });
    }
    starts
}

/// Maximum likelihood fit over every starting point; the best optimum wins.
pub fn fit(buys: &[f64], sells: &[f64], method: Method) -> Option<PinEstimate> {
    if buys.is_empty() || buys.len() != sells.len() {
        return None;
    }
    let n = buys.len() as f64;
    let mean_b = buys.iter().sum::<f64>() / n;
    let mean_s = sells.iter().sum::<f64>() / n;

    let neg_ll = |u: &[f64]| {
        let p = PinParams::from_unconstrained(u);
        match method {
            Method::Eho2010 => -log_likelihood_eho(&p, buys, sells),
            Method::Lk2011 => -log_likelihood_lk(&p, buys, sells),
        }
    };

    let best = starting_points(mean_b, mean_s)
        .into_iter()
        .map(|start| nelder_mead(&neg_ll, &start.to_unconstrained(), SimplexOptions::default()))
        .filter(|m| m.value.is_finite())
        .min_by_key(|m| OrderedFloat(m.value))?;

    trace!(method = method.as_str(), iterations = best.iterations, "PIN fitted");
    Some(PinEstimate {
        params: PinParams::from_unconstrained(&best.x),
        log_likelihood: -best.value,
    })
}

/// PIN from bucketed trade directions.
#[derive(Debug, Clone)]
pub struct Pin {
    interval_mins: u32,
}

impl Pin {
    pub fn new(interval_mins: u32) -> Self {
        Self { interval_mins }
    }

    fn output_name(&self, method: Method) -> String {
        format!("PIN_{}_{}min", method.as_str(), self.interval_mins)
    }
}

impl Estimator for Pin {
    fn name(&self) -> &str {
        "PIN"
    }

    fn input(&self) -> InputKind {
        InputKind::SignedTrades
    }

    fn required_columns(&self) -> Vec<String> {
        columns(&[COL_DIRECTION])
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let methods = [Method::Eho2010, Method::Lk2011];
        let direction = frame.column(COL_DIRECTION).unwrap_or_default();
        let buckets = Buckets::new(frame.index(), self.interval_mins as i64 * NANOS_PER_MINUTE);
        let buys = buckets.count(|i| direction[i] == 1.0);
        let sells = buckets.count(|i| direction[i] == -1.0);
        let total: f64 = buys.iter().chain(&sells).sum();

        let mut out = MeasureOutput::new();
        for method in methods {
            let value = if buckets.non_empty() < 2 || total == 0.0 {
                f64::NAN
            } else {
                fit(&buys, &sells, method).map_or(f64::NAN, |e| e.pin())
            };
            out.push(self.output_name(method), value);
        }
        out
    }
}
