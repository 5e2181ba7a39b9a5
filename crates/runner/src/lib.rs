//! Generic batch execution for per-file work.
//!
//! This crate handles:
//! - Fan-out of a unit of work over a worker pool
//! - Restoring input order in the collected results
//! - Per-item failure isolation and progress reporting

pub mod parallel;
pub mod progress;

pub use parallel::ParallelRunner;
pub use progress::ProgressTracker;
