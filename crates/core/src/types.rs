//! Core data types for the market-microstructure toolkit.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Timestamp in nanoseconds since the Unix epoch (timezone-naive).
pub type TimestampNs = i64;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;
pub const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
pub const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
pub const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// Parse a `Date-Time` cell into nanoseconds.
///
/// Accepts RFC 3339 (`2012-01-03T14:30:00.123456789Z`) as well as the naive
/// forms written back by this toolkit (`2012-01-03 09:30:00.123456789`).
pub fn parse_timestamp(s: &str) -> Result<TimestampNs> {
    let s = s.trim();
    let naive = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => dt.naive_utc(),
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .map_err(|e| Error::data(format!("invalid timestamp '{s}': {e}")))?,
    };
    naive
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| Error::data(format!("timestamp out of range: '{s}'")))
}

/// Format nanoseconds as a naive timestamp with full nanosecond precision.
pub fn format_timestamp(ts_ns: TimestampNs) -> String {
    DateTime::from_timestamp_nanos(ts_ns)
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S%.9f")
        .to_string()
}

/// Nanoseconds elapsed since midnight of the timestamp's day.
#[inline]
pub fn time_of_day_ns(ts_ns: TimestampNs) -> i64 {
    ts_ns.rem_euclid(NANOS_PER_DAY)
}

/// Floor a timestamp to a bucket boundary of the given width.
#[inline]
pub fn ts_to_bucket(ts_ns: TimestampNs, width_ns: i64) -> TimestampNs {
    ts_ns.div_euclid(width_ns) * width_ns
}

/// Kind of a raw tick record (`Type` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickKind {
    Trade,
    Quote,
}

impl TickKind {
    /// Parse the `Type` column value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Trade" => Some(TickKind::Trade),
            "Quote" => Some(TickKind::Quote),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TickKind::Trade => "Trade",
            TickKind::Quote => "Quote",
        }
    }
}

/// One raw trade-and-quote record.
///
/// Absent numeric fields are NaN: a quote has no price or volume, and a
/// trade row often carries no bid/ask of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tick {
    /// Timestamp in nanoseconds.
    pub ts_ns: TimestampNs,
    /// Record type.
    pub kind: TickKind,
    /// Trade price.
    pub price: f64,
    /// Trade volume.
    pub volume: f64,
    /// Bid price.
    pub bid_px: f64,
    /// Ask price.
    pub ask_px: f64,
    /// Bid size.
    pub bid_sz: f64,
    /// Ask size.
    pub ask_sz: f64,
}

impl Tick {
    /// Build a trade tick.
    pub fn trade(ts_ns: TimestampNs, price: f64, volume: f64) -> Self {
        Self {
            ts_ns,
            kind: TickKind::Trade,
            price,
            volume,
            bid_px: f64::NAN,
            ask_px: f64::NAN,
            bid_sz: f64::NAN,
            ask_sz: f64::NAN,
        }
    }

    /// Build a quote tick.
    pub fn quote(ts_ns: TimestampNs, bid_px: f64, ask_px: f64, bid_sz: f64, ask_sz: f64) -> Self {
        Self {
            ts_ns,
            kind: TickKind::Quote,
            price: f64::NAN,
            volume: f64::NAN,
            bid_px,
            ask_px,
            bid_sz,
            ask_sz,
        }
    }

    /// Whether this record updates the prevailing quote: no price, and all
    /// four quote fields present and non-zero.
    pub fn is_quote_update(&self) -> bool {
        let usable = |v: f64| !v.is_nan() && v != 0.0;
        self.price.is_nan()
            && usable(self.bid_px)
            && usable(self.ask_px)
            && usable(self.bid_sz)
            && usable(self.ask_sz)
    }
}

/// Inferred trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum Direction {
    /// Buyer-initiated.
    Buy = 1,
    /// Seller-initiated.
    Sell = -1,
    /// Could not be classified.
    Unclassified = 0,
}

impl Direction {
    /// Get the sign as i8.
    #[inline]
    pub fn sign(self) -> i8 {
        self as i8
    }

    /// Get the sign as f64.
    #[inline]
    pub fn sign_f64(self) -> f64 {
        self.sign() as f64
    }
}

/// A trade with inferred direction and the quote prevailing before it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedTrade {
    /// Timestamp in nanoseconds.
    pub ts_ns: TimestampNs,
    /// Trade price.
    pub price: f64,
    /// Trade volume.
    pub volume: f64,
    /// Inferred direction.
    pub direction: Direction,
    /// Bid prevailing immediately before the trade.
    pub bid_px: f64,
    /// Ask prevailing immediately before the trade.
    pub ask_px: f64,
    /// (bid + ask) / 2, always defined.
    pub mid: f64,
}

/// One unit of batch work: a security-day file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Security identifier (RIC), treated as an opaque key.
    pub security: String,
    /// Trading date.
    pub date: NaiveDate,
    /// File holding the security-day's data.
    pub path: PathBuf,
}

/// Ordered (name, value) pairs produced by one estimator call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureOutput(Vec<(String, f64)>);

impl MeasureOutput {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Output with every name set to NaN.
    pub fn nan<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(|n| (n.into(), f64::NAN)).collect())
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.0.push((name.into(), value));
    }

    /// Builder-style push.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.push(name, value);
        self
    }

    /// Value of the first entry with the given name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for MeasureOutput {
    type Item = (String, f64);
    type IntoIter = std::vec::IntoIter<(String, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// One row of the results ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureResult {
    pub date: NaiveDate,
    pub security: String,
    pub measure: String,
    pub value: f64,
}

impl MeasureResult {
    /// Flatten an estimator output into ledger rows for one work item.
    pub fn from_output(item: &WorkItem, output: MeasureOutput) -> Vec<MeasureResult> {
        output
            .into_iter()
            .map(|(measure, value)| MeasureResult {
                date: item.date,
                security: item.security.clone(),
                measure,
                value,
            })
            .collect()
    }

    /// Ledger line: `date,security,measure_name,value`.
    pub fn to_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.date.format("%Y-%m-%d"),
            self.security,
            self.measure,
            format_value(self.value)
        )
    }
}

/// Format a ledger value: `nan`, `inf`, `-inf`, or the shortest round-trip
/// decimal form.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{value:?}")
    }
}
