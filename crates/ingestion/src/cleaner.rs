//! Sorting and de-duplication of raw tick files.
//!
//! Two records holding the same values in every field are treated as a feed
//! duplicate. Cells compare by parsed value, so `10.10` and `10.1` match.
//! Timestamps are parsed only to order and compare records; the source text is
//! written back untouched so nanosecond precision is preserved.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use mktstructure_core::{parse_timestamp, Error, Result, TimestampNs};
use tracing::debug;

use crate::io::{parse_cell, read_records, write_records, COL_DATE_TIME};

/// Outcome of cleaning one file.
#[derive(Debug, Clone)]
pub struct CleanSummary {
    pub rows_in: usize,
    pub rows_out: usize,
    pub output: PathBuf,
}

/// Comparable value of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey {
    /// Bit pattern of the parsed number; empty cells are NaN.
    Number(u64),
    Text(String),
}

impl CellKey {
    fn new(cell: &str) -> Self {
        match parse_cell(cell) {
            // -0.0 and 0.0 are the same value.
            Some(v) if v == 0.0 => CellKey::Number(0f64.to_bits()),
            Some(v) if v.is_nan() => CellKey::Number(f64::NAN.to_bits()),
            Some(v) => CellKey::Number(v.to_bits()),
            None => CellKey::Text(cell.to_string()),
        }
    }
}

/// Remove duplicates (first occurrence kept), then stable-sort by
/// `Date-Time`.
pub fn clean_records(headers: &StringRecord, records: Vec<StringRecord>) -> Result<Vec<StringRecord>> {
    let ts_col = headers
        .iter()
        .position(|h| h == COL_DATE_TIME)
        .ok_or_else(|| Error::data(format!("no '{COL_DATE_TIME}' column")))?;

    let mut seen: HashSet<(TimestampNs, Vec<CellKey>)> = HashSet::with_capacity(records.len());
    let mut keyed = Vec::with_capacity(records.len());
    for record in records {
        let ts = parse_timestamp(record.get(ts_col).unwrap_or_default())?;
        let cells: Vec<CellKey> = record
            .iter()
            .enumerate()
            .filter(|(col, _)| *col != ts_col)
            .map(|(_, cell)| CellKey::new(cell))
            .collect();
        if seen.insert((ts, cells)) {
            keyed.push((ts, record));
        }
    }

    keyed.sort_by_key(|(ts, _)| *ts);
    Ok(keyed.into_iter().map(|(_, r)| r).collect())
}

/// Path of the cleaned copy: `2012-01-03.csv.gz` -> `2012-01-03.sorted.csv.gz`.
pub fn sorted_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let renamed = match name.find(".csv") {
        Some(pos) => format!("{}.sorted{}", &name[..pos], &name[pos..]),
        None => format!("{name}.sorted"),
    };
    path.with_file_name(renamed)
}

/// Clean one raw file, either in place or into its `.sorted` sibling.
pub fn clean_file(path: &Path, replace: bool) -> Result<CleanSummary> {
    let (headers, records) = read_records(path)?;
    let rows_in = records.len();
    let cleaned = clean_records(&headers, records)?;
    let output = if replace {
        path.to_path_buf()
    } else {
        sorted_path(path)
    };
    write_records(&output, &headers, &cleaned)?;
    debug!(
        path = %path.display(),
        rows_in,
        rows_out = cleaned.len(),
        "cleaned"
    );
    Ok(CleanSummary {
        rows_in,
        rows_out: cleaned.len(),
        output,
    })
}
