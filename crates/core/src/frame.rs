//! Columnar table of numeric columns over a timestamp index.
//!
//! Column names are the exchange format between loaders and estimators and
//! match case-sensitively (`Price`, `Mid Point`, `L1-BidPrice`, ...).

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::{ClassifiedTrade, Tick, TickKind, TimestampNs};

pub const COL_PRICE: &str = "Price";
pub const COL_VOLUME: &str = "Volume";
pub const COL_BID_PRICE: &str = "Bid Price";
pub const COL_ASK_PRICE: &str = "Ask Price";
pub const COL_BID_SIZE: &str = "Bid Size";
pub const COL_ASK_SIZE: &str = "Ask Size";
pub const COL_DIRECTION: &str = "Direction";
pub const COL_MID_POINT: &str = "Mid Point";

/// Order-book column name, e.g. `lob_column(5, "Ask", "Size")` = `L5-AskSize`.
pub fn lob_column(level: usize, side: &str, field: &str) -> String {
    format!("L{level}-{side}{field}")
}

/// A table of `f64` columns sharing one timestamp index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    index: Vec<TimestampNs>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Frame {
    /// Create a frame with the given index and no columns.
    pub fn new(index: Vec<TimestampNs>) -> Self {
        Self {
            index,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Add or replace a column. The column length must match the index.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(Error::data(format!(
                "column '{}' has {} rows, index has {}",
                name,
                values.len(),
                self.index.len()
            )));
        }
        match self.names.iter().position(|n| *n == name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Builder-style insert.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Timestamp index.
    pub fn index(&self) -> &[TimestampNs] {
        &self.index
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Column values by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Check that every required column is present.
    ///
    /// Fails with `Error::MissingColumns` naming the estimator and exactly the
    /// absent columns.
    pub fn require<S: AsRef<str>>(&self, estimator: &str, required: &[S]) -> Result<()> {
        let missing: BTreeSet<String> = required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.has_column(name))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingColumns {
                estimator: estimator.to_string(),
                missing,
            })
        }
    }

    /// New frame keeping only rows where `keep(row)` is true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Frame
    where
        F: FnMut(usize) -> bool,
    {
        let rows: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        Frame {
            index: rows.iter().map(|&i| self.index[i]).collect(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| rows.iter().map(|&i| col[i]).collect())
                .collect(),
        }
    }

    /// New frame without rows holding NaN in any of the given columns.
    /// Columns not present are ignored.
    pub fn drop_nan<S: AsRef<str>>(&self, subset: &[S]) -> Frame {
        let cols: Vec<&[f64]> = subset
            .iter()
            .filter_map(|name| self.column(name.as_ref()))
            .collect();
        self.filter_rows(|i| cols.iter().all(|c| !c[i].is_nan()))
    }

    /// Frame of classified trades with the signed-trade column set.
    pub fn from_classified(trades: &[ClassifiedTrade]) -> Frame {
        let mut frame = Frame::new(trades.iter().map(|t| t.ts_ns).collect());
        let columns: [(&str, fn(&ClassifiedTrade) -> f64); 6] = [
            (COL_PRICE, |t| t.price),
            (COL_VOLUME, |t| t.volume),
            (COL_BID_PRICE, |t| t.bid_px),
            (COL_ASK_PRICE, |t| t.ask_px),
            (COL_DIRECTION, |t| t.direction.sign_f64()),
            (COL_MID_POINT, |t| t.mid),
        ];
        for (name, field) in columns {
            frame.names.push(name.to_string());
            frame.columns.push(trades.iter().map(field).collect());
        }
        frame
    }

    /// Frame of the quote records among `ticks`.
    pub fn from_quotes(ticks: &[Tick]) -> Frame {
        let quotes: Vec<&Tick> = ticks.iter().filter(|t| t.kind == TickKind::Quote).collect();
        let mut frame = Frame::new(quotes.iter().map(|t| t.ts_ns).collect());
        let columns: [(&str, fn(&Tick) -> f64); 4] = [
            (COL_BID_PRICE, |t| t.bid_px),
            (COL_ASK_PRICE, |t| t.ask_px),
            (COL_BID_SIZE, |t| t.bid_sz),
            (COL_ASK_SIZE, |t| t.ask_sz),
        ];
        for (name, field) in columns {
            frame.names.push(name.to_string());
            frame.columns.push(quotes.iter().map(|t| field(t)).collect());
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use approx::assert_relative_eq;

    fn sample() -> Frame {
        Frame::new(vec![1, 2, 3])
            .with_column(COL_PRICE, vec![10.0, f64::NAN, 10.2])
            .unwrap()
            .with_column(COL_VOLUME, vec![100.0, 200.0, 300.0])
            .unwrap()
    }

    #[test]
    fn test_insert_length_mismatch() {
        let mut frame = Frame::new(vec![1, 2]);
        assert!(frame.insert(COL_PRICE, vec![1.0]).is_err());
    }

    #[test]
    fn test_insert_replaces() {
        let mut frame = sample();
        frame.insert(COL_PRICE, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(frame.column(COL_PRICE).unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(frame.columns().count(), 2);
    }

    #[test]
    fn test_require_names_missing() {
        let frame = sample();
        assert!(frame.require("X", &[COL_PRICE, COL_VOLUME]).is_ok());
        match frame.require("X", &[COL_PRICE, COL_DIRECTION, COL_MID_POINT]) {
            Err(Error::MissingColumns { estimator, missing }) => {
                assert_eq!(estimator, "X");
                let expected: BTreeSet<String> =
                    [COL_DIRECTION, COL_MID_POINT].iter().map(|s| s.to_string()).collect();
                assert_eq!(missing, expected);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_drop_nan() {
        let frame = sample().drop_nan(&[COL_PRICE]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.index(), &[1, 3]);
        assert_eq!(frame.column(COL_VOLUME).unwrap(), &[100.0, 300.0]);
    }

    #[test]
    fn test_from_classified() {
        let trades = vec![ClassifiedTrade {
            ts_ns: 5,
            price: 10.1,
            volume: 50.0,
            direction: Direction::Sell,
            bid_px: 10.0,
            ask_px: 10.2,
            mid: 10.1,
        }];
        let frame = Frame::from_classified(&trades);
        assert_eq!(frame.index(), &[5]);
        assert_relative_eq!(frame.column(COL_DIRECTION).unwrap()[0], -1.0);
        assert_relative_eq!(frame.column(COL_MID_POINT).unwrap()[0], 10.1);
        assert_relative_eq!(frame.column(COL_VOLUME).unwrap()[0], 50.0);
    }

    #[test]
    fn test_from_quotes_skips_trades() {
        let ticks = vec![
            Tick::quote(1, 10.0, 10.2, 100.0, 200.0),
            Tick::trade(2, 10.1, 50.0),
            Tick::quote(3, 10.1, 10.3, 300.0, 400.0),
        ];
        let frame = Frame::from_quotes(&ticks);
        assert_eq!(frame.index(), &[1, 3]);
        assert!(!frame.has_column(COL_PRICE));
        let asks = frame.column(COL_ASK_SIZE).unwrap();
        assert_relative_eq!(asks[0], 200.0);
        assert_relative_eq!(asks[1], 400.0);
    }

    #[test]
    fn test_lob_column_name() {
        assert_eq!(lob_column(5, "Ask", "Size"), "L5-AskSize");
        assert_eq!(lob_column(1, "Bid", "Price"), "L1-BidPrice");
    }
}
