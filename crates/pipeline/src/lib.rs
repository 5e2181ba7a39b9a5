//! Batch stages wiring discovery, classification and estimators to the
//! parallel runner.
//!
//! This crate handles:
//! - The clean, classify and compute stages
//! - The results ledger
//! - Logging setup for the `mktstructure` binary

pub mod ledger;
pub mod logging;
pub mod stages;

pub use ledger::LedgerWriter;
pub use stages::{classify_stage, clean_stage, compute_stage, StageReport};
