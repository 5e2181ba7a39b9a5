//! Trade direction inference using the Lee and Ready (1991) algorithm.
//!
//! Each trade is first compared with the quote midpoint (quote test). When the
//! trade prints exactly at the midpoint, or no midpoint exists yet, it is
//! compared with the previous two trade prices (tick test).
//!
//! The midpoint used by the quote test lags by one quote: it is the midpoint
//! of the bid/ask pair that was in force *before* the most recent quote
//! update, not the most recent quote itself.

use mktstructure_core::{ClassifiedTrade, Direction, Tick, TickKind};

/// Lag state carried through one forward scan. Undefined values are NaN and
/// never satisfy a comparison.
#[derive(Debug, Clone, Copy)]
pub struct LeeReadyState {
    last_bid: f64,
    last_ask: f64,
    last_quote_mid: f64,
    last_trade_price: f64,
    last2_trade_price: f64,
}

impl Default for LeeReadyState {
    fn default() -> Self {
        Self {
            last_bid: f64::NAN,
            last_ask: f64::NAN,
            last_quote_mid: f64::NAN,
            last_trade_price: f64::NAN,
            last2_trade_price: f64::NAN,
        }
    }
}

/// Outcome of feeding one record to the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// The record updated the prevailing quote.
    Quote,
    /// The record was classified as a trade.
    Trade {
        direction: Direction,
        /// Bid prevailing before the trade (the record's own bid if no quote yet).
        bid_px: f64,
        /// Ask prevailing before the trade (the record's own ask if no quote yet).
        ask_px: f64,
    },
}

impl LeeReadyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one record.
    pub fn step(&mut self, tick: &Tick) -> Step {
        if tick.is_quote_update() {
            self.last_quote_mid = (self.last_bid + self.last_ask) / 2.0;
            self.last_bid = tick.bid_px;
            self.last_ask = tick.ask_px;
            return Step::Quote;
        }

        let price = tick.price;
        let direction = self
            .quote_test(price)
            .unwrap_or_else(|| self.tick_test(price));

        let bid_px = if self.last_bid.is_nan() { tick.bid_px } else { self.last_bid };
        let ask_px = if self.last_ask.is_nan() { tick.ask_px } else { self.last_ask };

        self.last2_trade_price = self.last_trade_price;
        self.last_trade_price = price;

        Step::Trade {
            direction,
            bid_px,
            ask_px,
        }
    }

    /// Compare against the lagged quote midpoint. `None` means fall through.
    fn quote_test(&self, price: f64) -> Option<Direction> {
        if price > self.last_quote_mid {
            Some(Direction::Buy)
        } else if price < self.last_quote_mid {
            Some(Direction::Sell)
        } else {
            None
        }
    }

    /// Compare against the last trade price, then the one before it.
    fn tick_test(&self, price: f64) -> Direction {
        for prior in [self.last_trade_price, self.last2_trade_price] {
            if prior.is_nan() {
                break;
            }
            if price > prior {
                return Direction::Buy;
            }
            if price < prior {
                return Direction::Sell;
            }
        }
        Direction::Unclassified
    }
}

/// Per-record classification output, aligned with the input.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Direction per record (`Unclassified` for quote updates).
    pub directions: Vec<Direction>,
    /// Bid per record; trades carry the prevailing bid.
    pub bids: Vec<f64>,
    /// Ask per record; trades carry the prevailing ask.
    pub asks: Vec<f64>,
}

/// Run the state machine over a timestamp-sorted sequence of records.
///
/// The input is assumed sorted and validated; no sorting happens here.
pub fn classify(ticks: &[Tick]) -> Classification {
    let mut state = LeeReadyState::new();
    let mut out = Classification {
        directions: Vec::with_capacity(ticks.len()),
        bids: Vec::with_capacity(ticks.len()),
        asks: Vec::with_capacity(ticks.len()),
    };

    for tick in ticks {
        let (direction, bid, ask) = match state.step(tick) {
            Step::Quote => (Direction::Unclassified, tick.bid_px, tick.ask_px),
            Step::Trade {
                direction,
                bid_px,
                ask_px,
            } => (direction, bid_px, ask_px),
        };
        out.directions.push(direction);
        out.bids.push(bid);
        out.asks.push(ask);
    }

    out
}

/// Classify and keep only trade records with a defined midpoint.
///
/// Trades printed before the first quote have no midpoint and are dropped.
pub fn classify_trades(ticks: &[Tick]) -> Vec<ClassifiedTrade> {
    let classification = classify(ticks);
    ticks
        .iter()
        .enumerate()
        .filter(|(_, tick)| tick.kind == TickKind::Trade)
        .filter_map(|(i, tick)| {
            let bid_px = classification.bids[i];
            let ask_px = classification.asks[i];
            let mid = (bid_px + ask_px) / 2.0;
            if mid.is_nan() {
                return None;
            }
            Some(ClassifiedTrade {
                ts_ns: tick.ts_ns,
                price: tick.price,
                volume: tick.volume,
                direction: classification.directions[i],
                bid_px,
                ask_px,
                mid,
            })
        })
        .collect()
}

/// Statistics about classification quality.
#[derive(Debug, Clone, Default)]
pub struct ClassificationStats {
    /// Total trades classified.
    pub total_trades: u64,
    /// Trades classified as buy.
    pub buy_trades: u64,
    /// Trades classified as sell.
    pub sell_trades: u64,
    /// Trades left unclassified.
    pub unclassified_trades: u64,
    /// Total volume.
    pub total_volume: f64,
    /// Unclassified volume.
    pub unclassified_volume: f64,
}

impl ClassificationStats {
    pub fn from_trades(trades: &[ClassifiedTrade]) -> Self {
        let mut stats = Self::default();
        for trade in trades {
            stats.total_trades += 1;
            stats.total_volume += trade.volume;
            match trade.direction {
                Direction::Buy => stats.buy_trades += 1,
                Direction::Sell => stats.sell_trades += 1,
                Direction::Unclassified => {
                    stats.unclassified_trades += 1;
                    stats.unclassified_volume += trade.volume;
                }
            }
        }
        stats
    }

    /// Get the fraction of trades left unclassified.
    pub fn unclassified_frac(&self) -> f64 {
        if self.total_trades > 0 {
            self.unclassified_trades as f64 / self.total_trades as f64
        } else {
            0.0
        }
    }
}
