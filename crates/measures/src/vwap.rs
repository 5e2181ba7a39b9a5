//! Volume-weighted average price, overall and by trade direction.

use mktstructure_core::frame::{COL_DIRECTION, COL_PRICE, COL_VOLUME};
use mktstructure_core::{Frame, MeasureOutput};

use crate::estimator::{columns, Estimator, InputKind};
use crate::stats::weighted_mean;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Estimator for Vwap {
    fn name(&self) -> &str {
        "VWAP"
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
            return MeasureOutput::nan(["VWAP", "VWAPBuys", "VWAPSells"]);
        };
        let vwap_where = |keep: &dyn Fn(f64) -> bool| {
            weighted_mean(
                (0..frame.len())
                    .filter(|&i| keep(direction[i]))
                    .map(|i| (price[i], volume[i])),
            )
        };
        MeasureOutput::new()
            .with("VWAP", vwap_where(&|_| true))
            .with("VWAPBuys", vwap_where(&|d| d == 1.0))
            .with("VWAPSells", vwap_where(&|d| d == -1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vwap() {
        let frame = Frame::new(vec![0, 1, 2])
            .with_column(COL_PRICE, vec![10.0, 11.0, 12.0])
            .unwrap()
            .with_column(COL_VOLUME, vec![100.0, 300.0, 100.0])
            .unwrap()
            .with_column(COL_DIRECTION, vec![1.0, -1.0, 1.0])
            .unwrap();
        let out = Vwap.estimate(&frame).unwrap();
        assert_relative_eq!(out.get("VWAP").unwrap(), 5500.0 / 500.0);
        assert_relative_eq!(out.get("VWAPBuys").unwrap(), 11.0);
        assert_relative_eq!(out.get("VWAPSells").unwrap(), 11.0);
    }

    #[test]
    fn test_no_sells_is_nan() {
        let frame = Frame::new(vec![0])
            .with_column(COL_PRICE, vec![10.0])
            .unwrap()
            .with_column(COL_VOLUME, vec![100.0])
            .unwrap()
            .with_column(COL_DIRECTION, vec![1.0])
            .unwrap();
        let out = Vwap.estimate(&frame).unwrap();
        assert_relative_eq!(out.get("VWAP").unwrap(), 10.0);
        assert!(out.get("VWAPSells").unwrap().is_nan());
    }
}
