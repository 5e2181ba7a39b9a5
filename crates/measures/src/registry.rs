//! Lookup of estimators by name.

use mktstructure_core::config::MeasureConfig;

use crate::estimator::Estimator;
use crate::kyle_lambda::KyleLambda;
use crate::lob::{ScaledDepthDifference, Slope, SlopeDifference};
use crate::pin::Pin;
use crate::spread::{EffectiveSpread, PriceImpact, QuotedSpread, RealizedSpread};
use crate::variance_ratio::LoMacKinlay;
use crate::vwap::Vwap;

/// Every estimator name, in the order [`all`] returns them.
pub const NAMES: [&str; 14] = [
    "QuotedSpread",
    "EffectiveSpread",
    "RealizedSpread",
    "PriceImpact",
    "LoMacKinlay1988",
    "BidSlope",
    "AskSlope",
    "BidSlopeDifference",
    "AskSlopeDifference",
    "ScaledDepthDifferenceLvl1",
    "ScaledDepthDifferenceLvl5",
    "PIN",
    "KyleLambda",
    "VWAP",
];

/// Build the estimator with the given name, configured from `config`.
pub fn by_name(name: &str, config: &MeasureConfig) -> Option<Box<dyn Estimator>> {
    let estimator: Box<dyn Estimator> = match name {
        "QuotedSpread" => Box::new(QuotedSpread),
        "EffectiveSpread" => Box::new(EffectiveSpread),
        "RealizedSpread" => Box::new(RealizedSpread::new(config.horizon_ns())),
        "PriceImpact" => Box::new(PriceImpact::new(config.horizon_ns())),
        "LoMacKinlay1988" => Box::new(LoMacKinlay::new(config.variance_ratio_lags.clone())),
        "BidSlope" => Box::new(Slope::bid()),
        "AskSlope" => Box::new(Slope::ask()),
        "BidSlopeDifference" => Box::new(SlopeDifference::bid()),
        "AskSlopeDifference" => Box::new(SlopeDifference::ask()),
        "ScaledDepthDifferenceLvl1" => Box::new(ScaledDepthDifference::new(1)),
        "ScaledDepthDifferenceLvl5" => Box::new(ScaledDepthDifference::new(5)),
        "PIN" => Box::new(Pin::new(config.pin_interval_mins)),
        "KyleLambda" => Box::new(KyleLambda::new(config.kyle_interval_mins)),
        "VWAP" => Box::new(Vwap),
        _ => return None,
    };
    Some(estimator)
}

/// All estimators.
pub fn all(config: &MeasureConfig) -> Vec<Box<dyn Estimator>> {
    NAMES.iter().filter_map(|name| by_name(name, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::InputKind;
    use mktstructure_core::frame::{lob_column, COL_BID_PRICE};
    use mktstructure_core::Frame;

    #[test]
    fn test_names_resolve() {
        let config = MeasureConfig::default();
        for name in NAMES {
            let estimator = by_name(name, &config).unwrap();
            assert_eq!(estimator.name(), name);
        }
        assert_eq!(all(&config).len(), NAMES.len());
        assert!(by_name("Nope", &config).is_none());
    }

    #[test]
    fn test_input_kinds() {
        let config = MeasureConfig::default();
        let kind = |name| by_name(name, &config).unwrap().input();
        assert_eq!(kind("QuotedSpread"), InputKind::Quotes);
        assert_eq!(kind("PIN"), InputKind::SignedTrades);
        assert_eq!(kind("AskSlope"), InputKind::OrderBook);
    }

    #[test]
    fn test_every_estimator_nan_on_empty_input() {
        let config = MeasureConfig::default();
        for estimator in all(&config) {
            let mut frame = Frame::new(vec![]);
            for column in estimator.required_columns() {
                frame.insert(column, vec![]).unwrap();
            }
            let out = estimator.estimate(&frame).unwrap();
            assert!(!out.is_empty(), "{}", estimator.name());
            assert!(out.iter().all(|(_, v)| v.is_nan()), "{}", estimator.name());
        }
    }

    #[test]
    fn test_missing_columns_reported_per_estimator() {
        let frame = Frame::new(vec![0]).with_column(COL_BID_PRICE, vec![1.0]).unwrap();
        for estimator in all(&MeasureConfig::default()) {
            let err = estimator.estimate(&frame).unwrap_err();
            assert!(err.to_string().starts_with(estimator.name()), "{err}");
        }
        // The book estimators ask for the full five levels.
        let err = by_name("BidSlope", &MeasureConfig::default())
            .unwrap()
            .estimate(&frame)
            .unwrap_err();
        assert!(err.to_string().contains(&lob_column(5, "Ask", "Size")));
    }
}
