//! Order-book shape measures over five-level snapshots.
//!
//! Every estimator here reads the full 5-level book, drops rows with any
//! missing level, and excludes locked or crossed rows (best bid >= best ask).
//! Depth is cumulative across levels.

use mktstructure_core::frame::lob_column;
use mktstructure_core::{Frame, MeasureOutput};

use crate::estimator::{Estimator, InputKind};
use crate::stats::finite_mean;

/// Number of book levels the estimators read.
pub const LEVELS: usize = 5;

/// Book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "Bid",
            Side::Ask => "Ask",
        }
    }
}

/// All 20 `L{1..5}-{Bid,Ask}{Price,Size}` columns.
pub fn book_columns() -> Vec<String> {
    (1..=LEVELS)
        .flat_map(|level| {
            [Side::Bid, Side::Ask].into_iter().flat_map(move |side| {
                ["Price", "Size"]
                    .into_iter()
                    .map(move |field| lob_column(level, side.as_str(), field))
            })
        })
        .collect()
}

/// Price and size per level for one side of one snapshot.
#[derive(Debug, Clone, Copy)]
struct Ladder {
    prices: [f64; LEVELS],
    sizes: [f64; LEVELS],
}

impl Ladder {
    /// Cumulative depth down to `level` (1-based).
    fn depth(&self, level: usize) -> f64 {
        self.sizes[..level].iter().sum()
    }

    fn price(&self, level: usize) -> f64 {
        self.prices[level - 1]
    }
}

/// Rows of a book frame after NaN and locked-book filtering.
struct Book {
    bids: Vec<Ladder>,
    asks: Vec<Ladder>,
}

impl Book {
    fn from_frame(frame: &Frame) -> Option<Self> {
        let cols = book_columns();
        let frame = frame.drop_nan(&cols);
        let best_bid = frame.column(&lob_column(1, "Bid", "Price"))?;
        let best_ask = frame.column(&lob_column(1, "Ask", "Price"))?;
        let valid: Vec<usize> = (0..frame.len()).filter(|&i| best_bid[i] < best_ask[i]).collect();

        let ladder = |side: Side, row: usize| -> Option<Ladder> {
            let mut ladder = Ladder {
                prices: [0.0; LEVELS],
                sizes: [0.0; LEVELS],
            };
            for level in 1..=LEVELS {
                ladder.prices[level - 1] = frame.column(&lob_column(level, side.as_str(), "Price"))?[row];
                ladder.sizes[level - 1] = frame.column(&lob_column(level, side.as_str(), "Size"))?[row];
            }
            Some(ladder)
        };

        let mut book = Book {
            bids: Vec::with_capacity(valid.len()),
            asks: Vec::with_capacity(valid.len()),
        };
        for &row in &valid {
            book.bids.push(ladder(Side::Bid, row)?);
            book.asks.push(ladder(Side::Ask, row)?);
        }
        Some(book)
    }

    fn side(&self, side: Side) -> &[Ladder] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn mid(&self, row: usize) -> f64 {
        (self.bids[row].price(1) + self.asks[row].price(1)) / 2.0
    }
}

/// Depth to level 5 per unit of relative price distance from the midpoint.
#[derive(Debug, Clone)]
pub struct Slope {
    side: Side,
}

impl Slope {
    pub fn bid() -> Self {
        Self { side: Side::Bid }
    }

    pub fn ask() -> Self {
        Self { side: Side::Ask }
    }

    fn output_name(&self) -> String {
        format!("{}Slope{LEVELS}SimpleWeighted", self.side.as_str())
    }
}

impl Estimator for Slope {
    fn name(&self) -> &str {
        match self.side {
            Side::Bid => "BidSlope",
            Side::Ask => "AskSlope",
        }
    }

    fn input(&self) -> InputKind {
        InputKind::OrderBook
    }

    fn required_columns(&self) -> Vec<String> {
        book_columns()
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let Some(book) = Book::from_frame(frame) else {
            return MeasureOutput::nan([self.output_name()]);
        };
        let slopes = book.side(self.side).iter().enumerate().map(|(row, ladder)| {
            let distance = (ladder.price(LEVELS) / book.mid(row) - 1.0).abs();
            ladder.depth(LEVELS) / distance
        });
        MeasureOutput::new().with(self.output_name(), finite_mean(slopes))
    }
}

/// Far-book minus near-book slope, each the relative depth change per
/// relative price change (levels 1→3 and 3→5).
#[derive(Debug, Clone)]
pub struct SlopeDifference {
    side: Side,
}

impl SlopeDifference {
    pub fn bid() -> Self {
        Self { side: Side::Bid }
    }

    pub fn ask() -> Self {
        Self { side: Side::Ask }
    }

    fn output_name(&self) -> String {
        format!("{}SimpleWeighted", self.name())
    }
}

fn segment_slope(ladder: &Ladder, from: usize, to: usize) -> f64 {
    let depth_change = ladder.depth(to) / ladder.depth(from) - 1.0;
    let price_change = (ladder.price(to) / ladder.price(from) - 1.0).abs();
    depth_change / price_change
}

impl Estimator for SlopeDifference {
    fn name(&self) -> &str {
        match self.side {
            Side::Bid => "BidSlopeDifference",
            Side::Ask => "AskSlopeDifference",
        }
    }

    fn input(&self) -> InputKind {
        InputKind::OrderBook
    }

    fn required_columns(&self) -> Vec<String> {
        book_columns()
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let Some(book) = Book::from_frame(frame) else {
            return MeasureOutput::nan([self.output_name()]);
        };
        let diffs = book
            .side(self.side)
            .iter()
            .map(|ladder| segment_slope(ladder, 3, LEVELS) - segment_slope(ladder, 1, 3));
        MeasureOutput::new().with(self.output_name(), finite_mean(diffs))
    }
}

/// Mean (ask size − bid size) / (ask size + bid size) at one level.
#[derive(Debug, Clone)]
pub struct ScaledDepthDifference {
    level: usize,
    name: String,
}

impl ScaledDepthDifference {
    pub fn new(level: usize) -> Self {
        Self {
            level,
            name: format!("ScaledDepthDifferenceLvl{level}"),
        }
    }
}

impl Estimator for ScaledDepthDifference {
    fn name(&self) -> &str {
        &self.name
    }

    fn input(&self) -> InputKind {
        InputKind::OrderBook
    }

    fn required_columns(&self) -> Vec<String> {
        book_columns()
    }

    fn compute(&self, frame: &Frame) -> MeasureOutput {
        let Some(book) = Book::from_frame(frame) else {
            return MeasureOutput::nan([self.name.clone()]);
        };
        let level = self.level.clamp(1, LEVELS) - 1;
        let values = book.bids.iter().zip(&book.asks).map(|(bid, ask)| {
            (ask.sizes[level] - bid.sizes[level]) / (ask.sizes[level] + bid.sizes[level])
        });
        MeasureOutput::new().with(self.name.clone(), finite_mean(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mktstructure_core::Error;

    /// One snapshot: bid levels at `best_bid - 0.01*(l-1)`, ask levels at
    /// `best_ask + 0.01*(l-1)`, sizes given per level.
    type Snapshot = (f64, f64, [f64; LEVELS], [f64; LEVELS]);

    fn book(rows: &[Snapshot]) -> Frame {
        let mut frame = Frame::new((0..rows.len() as i64).collect());
        for level in 1..=LEVELS {
            let step = 0.01 * (level - 1) as f64;
            frame
                .insert(
                    lob_column(level, "Bid", "Price"),
                    rows.iter().map(|r| r.0 - step).collect(),
                )
                .unwrap();
            frame
                .insert(
                    lob_column(level, "Ask", "Price"),
                    rows.iter().map(|r| r.1 + step).collect(),
                )
                .unwrap();
            frame
                .insert(lob_column(level, "Bid", "Size"), rows.iter().map(|r| r.2[level - 1]).collect())
                .unwrap();
            frame
                .insert(lob_column(level, "Ask", "Size"), rows.iter().map(|r| r.3[level - 1]).collect())
                .unwrap();
        }
        frame
    }

    const VALID: Snapshot = (
        10.00,
        10.02,
        [100.0, 200.0, 300.0, 400.0, 500.0],
        [150.0, 250.0, 350.0, 450.0, 550.0],
    );
    const LOCKED: Snapshot = (
        10.02,
        10.02,
        [9.0, 9.0, 9.0, 9.0, 9.0],
        [1.0, 1.0, 1.0, 1.0, 1.0],
    );

    fn all_estimators() -> Vec<Box<dyn Estimator>> {
        vec![
            Box::new(Slope::bid()),
            Box::new(Slope::ask()),
            Box::new(SlopeDifference::bid()),
            Box::new(SlopeDifference::ask()),
            Box::new(ScaledDepthDifference::new(1)),
            Box::new(ScaledDepthDifference::new(5)),
        ]
    }

    #[test]
    fn test_book_columns() {
        let cols = book_columns();
        assert_eq!(cols.len(), 20);
        assert!(cols.contains(&"L1-BidPrice".to_string()));
        assert!(cols.contains(&"L5-AskSize".to_string()));
    }

    #[test]
    fn test_bid_slope_missing_one_column() {
        let mut frame = Frame::new(vec![0]);
        for name in book_columns().into_iter().filter(|c| c != "L5-AskSize") {
            frame.insert(name, vec![1.0]).unwrap();
        }
        match Slope::bid().estimate(&frame) {
            Err(Error::MissingColumns { estimator, missing }) => {
                assert_eq!(estimator, "BidSlope");
                assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["L5-AskSize".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_bid_slope_value() {
        let out = Slope::bid().estimate(&book(&[VALID])).unwrap();
        let mid = 10.01;
        let expected = 1500.0 / ((9.96 / mid) - 1.0_f64).abs();
        assert_relative_eq!(out.get("BidSlope5SimpleWeighted").unwrap(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_ask_slope_value() {
        let out = Slope::ask().estimate(&book(&[VALID])).unwrap();
        let expected = 1750.0 / (10.06 / 10.01 - 1.0);
        assert_relative_eq!(out.get("AskSlope5SimpleWeighted").unwrap(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_slope_difference_value() {
        let out = SlopeDifference::bid().estimate(&book(&[VALID])).unwrap();
        // Cumulative bid depth: 100, 300, 600, 1000, 1500.
        let near = (600.0 / 100.0 - 1.0) / (9.98_f64 / 10.00 - 1.0).abs();
        let far = (1500.0 / 600.0 - 1.0) / (9.96_f64 / 9.98 - 1.0).abs();
        assert_relative_eq!(
            out.get("BidSlopeDifferenceSimpleWeighted").unwrap(),
            far - near,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_scaled_depth_difference() {
        let out = ScaledDepthDifference::new(1).estimate(&book(&[VALID])).unwrap();
        assert_relative_eq!(out.get("ScaledDepthDifferenceLvl1").unwrap(), 50.0 / 250.0);
        let out = ScaledDepthDifference::new(5).estimate(&book(&[VALID])).unwrap();
        assert_relative_eq!(out.get("ScaledDepthDifferenceLvl5").unwrap(), 50.0 / 1050.0);
    }

    #[test]
    fn test_locked_rows_excluded() {
        for estimator in all_estimators() {
            let single = estimator.estimate(&book(&[VALID])).unwrap();
            let mixed = estimator.estimate(&book(&[LOCKED, VALID])).unwrap();
            assert_eq!(single, mixed, "{}", estimator.name());
        }
    }

    #[test]
    fn test_nan_rows_dropped() {
        let mut frame = book(&[VALID, VALID]);
        let mut sizes = frame.column("L3-BidSize").unwrap().to_vec();
        sizes[0] = f64::NAN;
        frame.insert("L3-BidSize", sizes).unwrap();
        let out = ScaledDepthDifference::new(1).estimate(&frame).unwrap();
        assert_relative_eq!(out.get("ScaledDepthDifferenceLvl1").unwrap(), 0.2);
    }

    #[test]
    fn test_empty_input_is_nan() {
        for estimator in all_estimators() {
            let out = estimator.estimate(&book(&[])).unwrap();
            assert_eq!(out.len(), 1);
            assert!(out.iter().all(|(_, v)| v.is_nan()), "{}", estimator.name());
        }
    }
}
