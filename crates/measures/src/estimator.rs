//! The contract every measure estimator implements.

use mktstructure_core::{Frame, MeasureOutput, Result};

/// Which classified file an estimator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Quote records split out during classification.
    Quotes,
    /// Classified trades.
    SignedTrades,
    /// Five-level order book snapshots.
    OrderBook,
}

/// A per-security, per-day statistic computed from one table.
///
/// Estimators are pure: they never mutate their input and return NaN values
/// rather than failing when there are too few observations.
pub trait Estimator: Send + Sync {
    /// Estimator name.
    fn name(&self) -> &str;

    /// Input table this estimator reads.
    fn input(&self) -> InputKind;

    /// Columns that must be present in the input.
    fn required_columns(&self) -> Vec<String>;

    /// Compute the output. Called only after the column check passed.
    fn compute(&self, frame: &Frame) -> MeasureOutput;

    /// Validate the input columns, then compute.
    fn estimate(&self, frame: &Frame) -> Result<MeasureOutput> {
        frame.require(self.name(), &self.required_columns())?;
        Ok(self.compute(frame))
    }
}

pub(crate) fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
