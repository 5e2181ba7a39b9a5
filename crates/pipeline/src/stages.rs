//! The three batch stages: clean, classify and compute.
//!
//! Each stage discovers its work items, applies the configured selection,
//! runs one unit of work per security-day through the parallel runner, and
//! logs and skips items that fail.

use std::path::PathBuf;

use mktstructure_core::{Config, Error, MeasureResult, Result, WorkItem};
use mktstructure_ingestion::cleaner::CleanSummary;
use mktstructure_ingestion::discovery::{
    DEPTH_SUFFIX, QUOTES_SUFFIX, RAW_SUFFIX, SIGNED_TRADES_SUFFIX, SORTED_SUFFIX,
};
use mktstructure_ingestion::io::{read_frame, read_ticks, write_quotes, write_signed_trades, TickFile};
use mktstructure_ingestion::session::localize;
use mktstructure_ingestion::{classify_trades, clean_file, discover, select, ClassificationStats, SessionFilter};
use mktstructure_measures::{registry, Estimator, InputKind};
use mktstructure_runner::ParallelRunner;
use tracing::{info, warn};

use crate::ledger::LedgerWriter;

/// Outcome counts of one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub processed: usize,
    pub failed: usize,
    /// Ledger rows written (compute only).
    pub rows: usize,
}

fn work_items(config: &Config, suffix: &str) -> Result<Vec<WorkItem>> {
    let items = discover(&config.data.data_dir, suffix)?;
    let found = items.len();
    let items = select(items, &config.selection);
    info!(suffix, found, selected = items.len(), "discovered work items");
    Ok(items)
}

/// Keep successful outcomes, logging failures against their work item.
fn keep_ok<O>(stage: &str, items: &[WorkItem], outcomes: Vec<Result<O>>, report: &mut StageReport) -> Vec<O> {
    let mut kept = Vec::with_capacity(outcomes.len());
    for (item, outcome) in items.iter().zip(outcomes) {
        match outcome {
            Ok(value) => {
                report.processed += 1;
                kept.push(value);
            }
            Err(e) => {
                report.failed += 1;
                warn!(stage, security = %item.security, date = %item.date, error = %e, "item failed");
            }
        }
    }
    kept
}

/// Sort and de-duplicate every raw file.
pub fn clean_stage(config: &Config, runner: &ParallelRunner) -> Result<StageReport> {
    let items = work_items(config, RAW_SUFFIX)?;
    let replace = config.data.replace;
    let paths: Vec<PathBuf> = items.iter().map(|i| i.path.clone()).collect();
    let outcomes = runner.run(paths, |path| clean_file(&path, replace), None);

    let mut report = StageReport::default();
    let summaries: Vec<CleanSummary> = keep_ok("clean", &items, outcomes, &mut report);
    let dropped: usize = summaries.iter().map(|s| s.rows_in - s.rows_out).sum();
    info!(files = report.processed, failed = report.failed, duplicates = dropped, "clean finished");
    Ok(report)
}

fn sibling(item: &WorkItem, suffix: &str) -> PathBuf {
    item.path.with_file_name(format!("{}{suffix}", item.date))
}

fn classify_item(item: &WorkItem, session: Option<SessionFilter>) -> Result<ClassificationStats> {
    let TickFile {
        mut ticks,
        gmt_offset_hours,
    } = read_ticks(&item.path)?;
    if let Some(offset) = gmt_offset_hours {
        localize(&mut ticks, offset);
    }
    if let Some(session) = session {
        ticks = session.apply(ticks);
    }

    let trades = classify_trades(&ticks);
    write_signed_trades(&sibling(item, SIGNED_TRADES_SUFFIX), &trades)?;
    write_quotes(&sibling(item, QUOTES_SUFFIX), &ticks)?;
    Ok(ClassificationStats::from_trades(&trades))
}

/// Classify every cleaned file into signed-trade and quote files.
pub fn classify_stage(config: &Config, runner: &ParallelRunner) -> Result<StageReport> {
    let suffix = if config.data.replace { RAW_SUFFIX } else { SORTED_SUFFIX };
    let items = work_items(config, suffix)?;
    let session = if config.session.enabled {
        Some(SessionFilter::from_config(&config.session)?)
    } else {
        None
    };

    let outcomes = runner.run(items.clone(), |item| classify_item(&item, session), None);
    let mut report = StageReport::default();
    let stats = keep_ok("classify", &items, outcomes, &mut report);

    let trades: u64 = stats.iter().map(|s| s.total_trades).sum();
    let unclassified: u64 = stats.iter().map(|s| s.unclassified_trades).sum();
    info!(
        files = report.processed,
        failed = report.failed,
        trades,
        unclassified,
        "classify finished"
    );
    Ok(report)
}

fn input_suffix(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Quotes => QUOTES_SUFFIX,
        InputKind::SignedTrades => SIGNED_TRADES_SUFFIX,
        InputKind::OrderBook => DEPTH_SUFFIX,
    }
}

/// Resolve estimator names; an empty list selects all of them.
pub fn estimators(config: &Config, names: &[String]) -> Result<Vec<Box<dyn Estimator>>> {
    if names.is_empty() {
        return Ok(registry::all(&config.measures));
    }
    names
        .iter()
        .map(|name| {
            registry::by_name(name, &config.measures)
                .ok_or_else(|| Error::config(format!("unknown measure '{name}'")))
        })
        .collect()
}

fn compute_measure(estimator: &dyn Estimator, items: &[WorkItem], runner: &ParallelRunner) -> (Vec<MeasureResult>, StageReport) {
    let outcomes = runner.run(
        items.to_vec(),
        |item| {
            let frame = read_frame(&item.path)?;
            let output = estimator.estimate(&frame)?;
            Ok(MeasureResult::from_output(&item, output))
        },
        None,
    );
    let mut report = StageReport::default();
    let rows: Vec<MeasureResult> = keep_ok(estimator.name(), items, outcomes, &mut report)
        .into_iter()
        .flatten()
        .collect();
    report.rows = rows.len();
    (rows, report)
}

/// Run the named estimators (all when empty) and write the ledger.
///
/// Rows are grouped by estimator, then in work-item order.
pub fn compute_stage(config: &Config, runner: &ParallelRunner, names: &[String]) -> Result<StageReport> {
    let estimators = estimators(config, names)?;
    let mut ledger = LedgerWriter::from_config(&config.ledger)?;
    let mut total = StageReport::default();

    for estimator in &estimators {
        let items = work_items(config, input_suffix(estimator.input()))?;
        let (rows, report) = compute_measure(estimator.as_ref(), &items, runner);
        ledger.write_all(&rows)?;
        info!(
            measure = estimator.name(),
            items = report.processed,
            failed = report.failed,
            rows = report.rows,
            "measure finished"
        );
        total.processed += report.processed;
        total.failed += report.failed;
        total.rows += report.rows;
    }

    let written = ledger.finish()?;
    info!(rows = written, out = %config.ledger.out.display(), "ledger written");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use csv::StringRecord;
    use mktstructure_ingestion::io::write_records;
    use std::fs;
    use std::path::Path;

    const HEADER: [&str; 10] = [
        "#RIC",
        "Date-Time",
        "GMT Offset",
        "Type",
        "Price",
        "Volume",
        "Bid Price",
        "Bid Size",
        "Ask Price",
        "Ask Size",
    ];

    fn quote(ts: &str, bid: &str, ask: &str) -> StringRecord {
        StringRecord::from(vec!["A.N", ts, "-5", "Quote", "", "", bid, "100", ask, "100"])
    }

    fn trade(ts: &str, price: &str, volume: &str) -> StringRecord {
        StringRecord::from(vec!["A.N", ts, "-5", "Trade", price, volume, "", "", "", ""])
    }

    fn setup(dir: &Path) -> Config {
        let day = dir.join("data").join("A.N");
        fs::create_dir_all(&day).unwrap();
        // Unsorted, with one duplicate and one pre-open trade.
        let records = vec![
            trade("2012-01-03T14:30:03.000000000Z", "10.15", "100"),
            quote("2012-01-03T14:30:01.000000000Z", "10.00", "10.20"),
            quote("2012-01-03T14:30:02.000000000Z", "10.10", "10.30"),
            trade("2012-01-03T14:00:00.000000000Z", "9.90", "500"),
            trade("2012-01-03T14:30:04.000000000Z", "10.05", "300"),
            trade("2012-01-03T14:30:04.000000000Z", "10.05", "300"),
        ];
        write_records(&day.join("2012-01-03.csv.gz"), &StringRecord::from(HEADER.to_vec()), &records).unwrap();

        let mut config = Config::default();
        config.data.data_dir = dir.join("data");
        config.ledger.out = dir.join("results.csv");
        config.runner.workers = 2;
        config
    }

    #[test]
    fn test_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let runner = ParallelRunner::from_config(&config.runner);

        let report = clean_stage(&config, &runner).unwrap();
        assert_eq!(report, StageReport { processed: 1, failed: 0, rows: 0 });
        let day = config.data.data_dir.join("A.N");
        assert!(day.join("2012-01-03.sorted.csv.gz").exists());

        let report = classify_stage(&config, &runner).unwrap();
        assert_eq!(report.processed, 1);
        assert!(day.join("2012-01-03.signed-trades.csv.gz").exists());
        assert!(day.join("2012-01-03.quotes.csv.gz").exists());

        let trades = read_frame(&day.join("2012-01-03.signed-trades.csv.gz")).unwrap();
        // The pre-open trade and the duplicate are gone.
        assert_eq!(trades.len(), 2);
        // Both trades see the lagged midpoint 10.1: 10.15 buys, 10.05 sells.
        assert_eq!(trades.column("Direction").unwrap(), &[1.0, -1.0]);
        // The recorded midpoint is the prevailing quote's.
        for mid in trades.column("Mid Point").unwrap() {
            assert_relative_eq!(*mid, 10.2, epsilon = 1e-9);
        }

        let names = vec!["VWAP".to_string(), "QuotedSpread".to_string()];
        let report = compute_stage(&config, &runner, &names).unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(report.rows, 5);

        let ledger = fs::read_to_string(&config.ledger.out).unwrap();
        let lines: Vec<&str> = ledger.lines().collect();
        assert_eq!(lines.len(), 5);
        let parsed: Vec<(&str, f64)> = lines
            .iter()
            .map(|line| {
                let fields: Vec<&str> = line.split(',').collect();
                assert_eq!(&fields[..2], &["2012-01-03", "A.N"]);
                (fields[2], fields[3].parse().unwrap())
            })
            .collect();
        let names: Vec<&str> = parsed.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "VWAP",
                "VWAPBuys",
                "VWAPSells",
                "QuotedSpreadSimpleWeighted",
                "QuotedSpreadTimeWeighted"
            ]
        );
        assert_relative_eq!(parsed[0].1, (10.15 * 100.0 + 10.05 * 300.0) / 400.0, epsilon = 1e-9);
        assert_relative_eq!(parsed[1].1, 10.15, epsilon = 1e-9);
        assert_relative_eq!(parsed[2].1, 10.05, epsilon = 1e-9);
        // Quotes 10.00/10.20 then 10.10/10.30.
        let expected = (0.2 / 10.1 + 0.2 / 10.2) / 2.0;
        assert_relative_eq!(parsed[3].1, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let runner = ParallelRunner::new(1);
        clean_stage(&config, &runner).unwrap();
        classify_stage(&config, &runner).unwrap();

        // Order-book estimators find no depth files; spread reads signed trades.
        let names = vec!["BidSlope".to_string(), "EffectiveSpread".to_string()];
        let report = compute_stage(&config, &runner, &names).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.rows, 2);
    }

    #[test]
    fn test_unreadable_item_logged_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path());
        let day = config.data.data_dir.join("A.N");
        fs::write(day.join("2012-01-04.signed-trades.csv.gz"), b"not gzip").unwrap();
        let runner = ParallelRunner::new(2);
        clean_stage(&config, &runner).unwrap();
        classify_stage(&config, &runner).unwrap();

        let report = compute_stage(&config, &runner, &["VWAP".to_string()]).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.rows, 3);
    }

    #[test]
    fn test_unknown_measure() {
        let config = Config::default();
        assert!(matches!(estimators(&config, &["Nope".to_string()]), Err(Error::Config(_))));
        assert_eq!(estimators(&config, &[]).unwrap().len(), registry::NAMES.len());
    }
}
