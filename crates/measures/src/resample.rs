//! Fixed-width time buckets over a sorted timestamp index.

use std::ops::Range;

use mktstructure_core::{ts_to_bucket, TimestampNs};

/// Consecutive buckets from the first to the last observation, including
/// empty buckets in between.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    /// Bucket start times.
    pub starts: Vec<TimestampNs>,
    /// Row range of each bucket in the source index.
    pub rows: Vec<Range<usize>>,
}

impl Buckets {
    /// Bucket a sorted index. Boundaries are multiples of `width_ns`.
    pub fn new(index: &[TimestampNs], width_ns: i64) -> Self {
        let (Some(&first), Some(&last)) = (index.first(), index.last()) else {
            return Self::default();
        };
        let first = ts_to_bucket(first, width_ns);
        let last = ts_to_bucket(last, width_ns);
        let count = ((last - first) / width_ns + 1) as usize;

        let mut buckets = Self {
            starts: Vec::with_capacity(count),
            rows: Vec::with_capacity(count),
        };
        let mut row = 0;
        for b in 0..count {
            let start = first + b as i64 * width_ns;
            let end = start + width_ns;
            let begin = row;
            while row < index.len() && index[row] < end {
                row += 1;
            }
            buckets.starts.push(start);
            buckets.rows.push(begin..row);
        }
        buckets
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Number of buckets holding at least one row.
    pub fn non_empty(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_empty()).count()
    }

    /// Sum of `values` within each bucket (0 for empty buckets).
    pub fn sum(&self, values: &[f64]) -> Vec<f64> {
        self.rows.iter().map(|r| values[r.clone()].iter().sum()).collect()
    }

    /// Count of rows in each bucket satisfying `pred`.
    pub fn count<F: Fn(usize) -> bool>(&self, pred: F) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.clone().filter(|&i| pred(i)).count() as f64)
            .collect()
    }

    /// Last value of each bucket, carrying the previous bucket's value
    /// through empty buckets.
    pub fn last_filled(&self, values: &[f64]) -> Vec<f64> {
        let mut prev = f64::NAN;
        self.rows
            .iter()
            .map(|r| {
                if let Some(&v) = values[r.clone()].last() {
                    prev = v;
                }
                prev
            })
            .collect()
    }
}
