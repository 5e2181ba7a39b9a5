//! Market microstructure estimators.
//!
//! This crate handles:
//! - Quoted, effective and realized spreads, and price impact
//! - Lo–MacKinlay variance ratio tests
//! - Order-book slope and depth asymmetry
//! - Probability of informed trading (PIN)
//! - Kyle's lambda and VWAP

pub mod estimator;
pub mod kyle_lambda;
pub mod lob;
pub mod optimize;
pub mod pin;
pub mod registry;
pub mod resample;
pub mod spread;
pub mod stats;
pub mod variance_ratio;
pub mod vwap;

pub use estimator::{Estimator, InputKind};
pub use kyle_lambda::KyleLambda;
pub use lob::{ScaledDepthDifference, Slope, SlopeDifference};
pub use pin::Pin;
pub use spread::{EffectiveSpread, PriceImpact, QuotedSpread, RealizedSpread};
pub use variance_ratio::LoMacKinlay;
pub use vwap::Vwap;
