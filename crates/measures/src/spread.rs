//! Spread-type measures: quoted, effective and realized spread, price impact.
//!
//! All values are proportions of the prevailing midpoint. Trade-based
//! measures are volume-weighted; `WithDirection` variants use the signed
//! trade direction and `AbsoluteVal` variants the absolute deviation.

use mktstructure_core::frame::{
    COL_ASK_PRICE, COL_BID_PRICE, COL_DIRECTION, COL_MID_POINT, COL_PRICE, COL_VOLUME,
};
use mktstructure_core::{Frame, MeasureOutput, NANOS_PER_SECOND};

use crate::estimator::{columns, Estimator, InputKind};
use crate::stats::{finite_mean, forward_match, weighted_mean};

const TRADE_COLUMNS: [&str; 4] = [COL_PRICE, COL_VOLUME, COL_MID_POINT, COL_DIRECTION];

/// Trade columns borrowed from a signed-trade frame.
struct TradeColumns<'a> {
    price: &'a [f64],
    volume: &'a [f64],
    mid: &'a [f64],
    direction: &'a [f64],
}

impl<'a> TradeColumns<'a> {
    fn from_frame(frame: &'a Frame) -> Option<Self> {
        Some(Self {
            price: frame.column(COL_PRICE)?,
            volume: frame.column(COL_VOLUME)?,
            mid: frame.column(COL_MID_POINT)?,
            direction: frame.column(COL_DIRECTION)?,
        })
    }
}

/// Average quoted spread over the quotes of a day.
#[derive(Debug, Clone, Default)]
pub struct QuotedSpread;

impl Estimator for QuotedSpread {
    fn name(&self) -> &str {
        "QuotedSpread"
    }

    fn input(&self) -> InputKind {
        InputKind::Quotes
    }

    fn required_columns(&self) -> Vec<String> {
        columns(&[COL_BID_PRICE, COL_ASK_PRICE])
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let frame = frame.drop_nan(&[COL_BID_PRICE, COL_ASK_PRICE]);
        let (Some(bid), Some(ask)) = (frame.column(COL_BID_PRICE), frame.column(COL_ASK_PRICE)) else {
            return MeasureOutput::nan(["QuotedSpreadSimpleWeighted", "QuotedSpreadTimeWeighted"]);
        };

        let simple = finite_mean(bid.iter().zip(ask).map(|(b, a)| (a - b) / ((a + b) / 2.0)));

        // Each quote is weighted by how long it stood; the last has no duration.
        let index = frame.index();
        let time_weighted = weighted_mean((0..index.len().saturating_sub(1)).map(|i| {
            let spread_pct = 2.0 * (ask[i] - bid[i]) / (ask[i] + bid[i]) * 100.0;
            let seconds = (index[i + 1] - index[i]) as f64 / NANOS_PER_SECOND as f64;
            (spread_pct, seconds)
        }));

        MeasureOutput::new()
            .with("QuotedSpreadSimpleWeighted", simple)
            .with("QuotedSpreadTimeWeighted", time_weighted)
    }
}

/// Effective spread: 2·q·(p − m) / m.
#[derive(Debug, Clone, Default)]
pub struct EffectiveSpread;

impl Estimator for EffectiveSpread {
    fn name(&self) -> &str {
        "EffectiveSpread"
    }

    fn input(&self) -> InputKind {
        InputKind::SignedTrades
    }

    fn required_columns(&self) -> Vec<String> {
        columns(&TRADE_COLUMNS)
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let Some(t) = TradeColumns::from_frame(frame) else {
            return MeasureOutput::nan(["EffectiveSpreadWithDirection", "EffectiveSpreadAbsoluteVal"]);
        };
        let n = frame.len();
        let signed = weighted_mean((0..n).map(|i| {
            (2.0 * t.direction[i] * (t.price[i] - t.mid[i]) / t.mid[i], t.volume[i])
        }));
        let absolute = weighted_mean((0..n).map(|i| {
            (2.0 * (t.price[i] - t.mid[i]).abs() / t.mid[i], t.volume[i])
        }));
        MeasureOutput::new()
            .with("EffectiveSpreadWithDirection", signed)
            .with("EffectiveSpreadAbsoluteVal", absolute)
    }
}

/// Realized spread against the midpoint one horizon later: 2·q·(p − m₊) / m.
#[derive(Debug, Clone)]
pub struct RealizedSpread {
    horizon_ns: i64,
}

impl RealizedSpread {
    pub fn new(horizon_ns: i64) -> Self {
        Self { horizon_ns }
    }
}

impl Estimator for RealizedSpread {
    fn name(&self) -> &str {
        "RealizedSpread"
    }

    fn input(&self) -> InputKind {
        InputKind::SignedTrades
    }

    fn required_columns(&self) -> Vec<String> {
        columns(&TRADE_COLUMNS)
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let Some(t) = TradeColumns::from_frame(frame) else {
            return MeasureOutput::nan(["RealizedSpreadwithDirection", "RealizedSpreadAbsoluteVal"]);
        };
        let matched = forward_match(frame.index(), self.horizon_ns);
        let signed = weighted_mean(matched.iter().enumerate().map(|(i, &j)| {
            (2.0 * t.direction[i] * (t.price[i] - t.mid[j]) / t.mid[i], t.volume[i])
        }));
        let absolute = weighted_mean(matched.iter().enumerate().map(|(i, &j)| {
            (2.0 * (t.price[i] - t.mid[j]).abs() / t.mid[i], t.volume[i])
        }));
        MeasureOutput::new()
            .with("RealizedSpreadwithDirection", signed)
            .with("RealizedSpreadAbsoluteVal", absolute)
    }
}

/// Price impact: 2·q·(m₊ − m) / m, the midpoint move one horizon later.
#[derive(Debug, Clone)]
pub struct PriceImpact {
    horizon_ns: i64,
}

impl PriceImpact {
    pub fn new(horizon_ns: i64) -> Self {
        Self { horizon_ns }
    }
}

impl Estimator for PriceImpact {
    fn name(&self) -> &str {
        "PriceImpact"
    }

    fn input(&self) -> InputKind {
        InputKind::SignedTrades
    }

    fn required_columns(&self) -> Vec<String> {
        columns(&TRADE_COLUMNS)
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let Some(t) = TradeColumns::from_frame(frame) else {
            return MeasureOutput::nan(["PriceImpactwithDirection", "PriceImpactAbsoluteVal"]);
        };
        let matched = forward_match(frame.index(), self.horizon_ns);
        let signed = weighted_mean(matched.iter().enumerate().map(|(i, &j)| {
            (2.0 * t.direction[i] * (t.mid[j] - t.mid[i]) / t.mid[i], t.volume[i])
        }));
        let absolute = weighted_mean(matched.iter().enumerate().map(|(i, &j)| {
            (2.0 * (t.mid[j] - t.mid[i]).abs() / t.mid[i], t.volume[i])
        }));
        MeasureOutput::new()
            .with("PriceImpactwithDirection", signed)
            .with("PriceImpactAbsoluteVal", absolute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mktstructure_core::{Error, NANOS_PER_MINUTE};

    const M: i64 = NANOS_PER_MINUTE;

    fn trades(rows: &[(i64, f64, f64, f64, f64)]) -> Frame {
        Frame::new(rows.iter().map(|r| r.0).collect())
            .with_column(COL_PRICE, rows.iter().map(|r| r.1).collect())
            .unwrap()
            .with_column(COL_VOLUME, rows.iter().map(|r| r.2).collect())
            .unwrap()
            .with_column(COL_MID_POINT, rows.iter().map(|r| r.3).collect())
            .unwrap()
            .with_column(COL_DIRECTION, rows.iter().map(|r| r.4).collect())
            .unwrap()
    }

    #[test]
    fn test_quoted_spread() {
        let frame = Frame::new(vec![0, 10 * NANOS_PER_SECOND, 40 * NANOS_PER_SECOND])
            .with_column(COL_BID_PRICE, vec![9.9, 9.8, 9.9])
            .unwrap()
            .with_column(COL_ASK_PRICE, vec![10.1, 10.2, 10.1])
            .unwrap();
        let out = QuotedSpread.estimate(&frame).unwrap();
        let s1 = 0.2 / 10.0;
        let s2 = 0.4 / 10.0;
        assert_relative_eq!(
            out.get("QuotedSpreadSimpleWeighted").unwrap(),
            (2.0 * s1 + s2) / 3.0,
            epsilon = 1e-12
        );
        // 10s at 2%, 30s at 4%.
        assert_relative_eq!(
            out.get("QuotedSpreadTimeWeighted").unwrap(),
            (10.0 * s1 * 100.0 + 30.0 * s2 * 100.0) / 40.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_effective_spread() {
        let frame = trades(&[(0, 10.1, 100.0, 10.0, 1.0), (M, 9.95, 300.0, 10.0, -1.0)]);
        let out = EffectiveSpread.estimate(&frame).unwrap();
        let expected = (100.0 * 0.02 + 300.0 * 0.01) / 400.0;
        assert_relative_eq!(out.get("EffectiveSpreadWithDirection").unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(out.get("EffectiveSpreadAbsoluteVal").unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_effective_spread_misclassified_sign() {
        // A sell above the midpoint contributes a negative effective spread.
        let frame = trades(&[(0, 10.1, 100.0, 10.0, -1.0)]);
        let out = EffectiveSpread.estimate(&frame).unwrap();
        assert_relative_eq!(out.get("EffectiveSpreadWithDirection").unwrap(), -0.02, epsilon = 1e-12);
        assert_relative_eq!(out.get("EffectiveSpreadAbsoluteVal").unwrap(), 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_realized_spread_and_price_impact_exclude_trailing() {
        // Only the first trade has a trade five minutes later (the third).
        let frame = trades(&[
            (0, 10.1, 100.0, 10.0, 1.0),
            (4 * M, 10.2, 100.0, 10.1, 1.0),
            (5 * M, 10.3, 100.0, 10.2, 1.0),
        ]);
        let horizon = 5 * M;

        let rs = RealizedSpread::new(horizon).estimate(&frame).unwrap();
        assert_relative_eq!(
            rs.get("RealizedSpreadwithDirection").unwrap(),
            2.0 * (10.1 - 10.2) / 10.0,
            epsilon = 1e-12
        );

        let pi = PriceImpact::new(horizon).estimate(&frame).unwrap();
        assert_relative_eq!(
            pi.get("PriceImpactwithDirection").unwrap(),
            2.0 * (10.2 - 10.0) / 10.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            pi.get("PriceImpactAbsoluteVal").unwrap(),
            2.0 * (10.2 - 10.0) / 10.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_no_match_is_nan() {
        let frame = trades(&[(0, 10.1, 100.0, 10.0, 1.0), (M, 10.1, 100.0, 10.0, 1.0)]);
        let out = PriceImpact::new(5 * M).estimate(&frame).unwrap();
        assert!(out.iter().all(|(_, v)| v.is_nan()));
    }

    #[test]
    fn test_empty_input_is_nan() {
        let empty = trades(&[]);
        for estimator in [
            &EffectiveSpread as &dyn Estimator,
            &RealizedSpread::new(5 * M),
            &PriceImpact::new(5 * M),
        ] {
            let out = estimator.estimate(&empty).unwrap();
            assert_eq!(out.len(), 2);
            assert!(out.iter().all(|(_, v)| v.is_nan()));
        }
        let quotes = Frame::new(vec![])
            .with_column(COL_BID_PRICE, vec![])
            .unwrap()
            .with_column(COL_ASK_PRICE, vec![])
            .unwrap();
        let out = QuotedSpread.estimate(&quotes).unwrap();
        assert!(out.iter().all(|(_, v)| v.is_nan()));
    }

    #[test]
    fn test_missing_columns() {
        let frame = Frame::new(vec![0]).with_column(COL_PRICE, vec![1.0]).unwrap();
        match EffectiveSpread.estimate(&frame) {
            Err(Error::MissingColumns { estimator, missing }) => {
                assert_eq!(estimator, "EffectiveSpread");
                assert_eq!(missing.len(), 3);
                assert!(!missing.contains(COL_PRICE));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
