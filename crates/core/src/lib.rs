//! Core types and configuration for the market-microstructure toolkit.
//!
//! This crate provides shared types used across all other crates:
//! - Tick and classified-trade records
//! - The columnar `Frame` handed to measure estimators
//! - Measure results and ledger lines
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod frame;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use frame::Frame;
pub use types::*;
