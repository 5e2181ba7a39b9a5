//! Discovery of per-security, per-day data files.
//!
//! Layout: `<data_dir>/<security>/<YYYY-MM-DD><suffix>`, e.g.
//! `data/A.N/2012-01-03.signed-trades.csv.gz`.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use mktstructure_core::config::SelectionConfig;
use mktstructure_core::{Result, WorkItem};
use tracing::debug;

/// Raw tick files as delivered.
pub const RAW_SUFFIX: &str = ".csv.gz";
/// Raw files after sorting and de-duplication.
pub const SORTED_SUFFIX: &str = ".sorted.csv.gz";
/// Classified trades.
pub const SIGNED_TRADES_SUFFIX: &str = ".signed-trades.csv.gz";
/// Quotes split out during classification.
pub const QUOTES_SUFFIX: &str = ".quotes.csv.gz";
/// Five-level order book snapshots.
pub const DEPTH_SUFFIX: &str = ".depth.csv.gz";

/// Date encoded in a file name, if the name is exactly `<date><suffix>`.
pub fn parse_file_date(name: &str, suffix: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(suffix)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Find every `<security>/<date><suffix>` file below `data_dir`, sorted by
/// security then date. Files whose names do not parse are skipped.
pub fn discover(data_dir: &Path, suffix: &str) -> Result<Vec<WorkItem>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let security = entry.file_name().to_string_lossy().into_owned();
        for file in fs::read_dir(entry.path())? {
            let file = file?;
            let name = file.file_name().to_string_lossy().into_owned();
            match parse_file_date(&name, suffix) {
                Some(date) => items.push(WorkItem {
                    security: security.clone(),
                    date,
                    path: file.path(),
                }),
                None => debug!(file = %name, "skipped"),
            }
        }
    }
    items.sort_by(|a, b| (&a.security, a.date).cmp(&(&b.security, b.date)));
    Ok(items)
}

/// Keep the items accepted by the selection, preserving order.
pub fn select(items: Vec<WorkItem>, selection: &SelectionConfig) -> Vec<WorkItem> {
    items.into_iter().filter(|i| selection.accepts(i)).collect()
}
