//! Kyle's lambda: price impact of signed order flow.
//!
//! Trades are grouped into fixed buckets. Bucket percentage returns (from the
//! last price, carried through empty buckets) are regressed on the bucket sum
//! of signed square-root dollar volume; lambda is the OLS slope.

use mktstructure_core::frame::{COL_DIRECTION, COL_PRICE, COL_VOLUME};
use mktstructure_core::{Frame, MeasureOutput, NANOS_PER_MINUTE};

use crate::estimator::{columns, Estimator, InputKind};
use crate::resample::Buckets;
use crate::stats::ols_slope;

#[derive(Debug, Clone)]
pub struct KyleLambda {
    interval_mins: u32,
}

impl KyleLambda {
    pub fn new(interval_mins: u32) -> Self {
        Self { interval_mins }
    }
}

impl Estimator for KyleLambda {
    fn name(&self) -> &str {
        "KyleLambda"
    }

    fn input(&self) -> InputKind {
        InputKind::SignedTrades
    }

    fn required_columns(&self) -> Vec<String> {
        columns(&[COL_PRICE, COL_VOLUME, COL_DIRECTION])
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let (Some(price), Some(volume), Some(direction)) = (
            frame.column(COL_PRICE),
            frame.column(COL_VOLUME),
            frame.column(COL_DIRECTION),
        ) else {
            return MeasureOutput::nan(["KyleLambda"]);
        };

        let buckets = Buckets::new(frame.index(), self.interval_mins as i64 * NANOS_PER_MINUTE);
        if buckets.non_empty() < 2 {
            return MeasureOutput::nan(["KyleLambda"]);
        }

        let signed_flow: Vec<f64> = (0..frame.len())
            .map(|i| direction[i] * (price[i] * volume[i]).abs().sqrt())
            .collect();
        let flow = buckets.sum(&signed_flow);
        let last = buckets.last_filled(price);

        let (returns, flow): (Vec<f64>, Vec<f64>) = last
            .windows(2)
            .zip(&flow[1..])
            .map(|(w, &x)| ((w[1] / w[0] - 1.0) * 100.0, x))
            .filter(|(r, _)| r.is_finite())
            .unzip();

        MeasureOutput::new().with("KyleLambda", ols_slope(&flow, &returns))
    }
}
