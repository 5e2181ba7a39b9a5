//! Data ingestion and normalization for the market-microstructure toolkit.
//!
//! This crate handles:
//! - Trade direction inference (Lee and Ready, 1991)
//! - Sorting and de-duplicating raw tick files
//! - Localising timestamps and trimming to the regular session
//! - Reading and writing delimited (optionally gzipped) tick files
//! - Discovering per-security, per-day files

pub mod classifier;
pub mod cleaner;
pub mod discovery;
pub mod io;
pub mod session;

pub use classifier::{classify, classify_trades, Classification, ClassificationStats, LeeReadyState, Step};
pub use cleaner::{clean_file, clean_records};
pub use discovery::{discover, select};
pub use session::SessionFilter;
