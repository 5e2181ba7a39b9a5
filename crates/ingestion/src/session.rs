//! Local-time conversion and regular-session trimming.

use chrono::{NaiveTime, Timelike};
use mktstructure_core::config::SessionConfig;
use mktstructure_core::{time_of_day_ns, Result, Tick, NANOS_PER_HOUR, NANOS_PER_SECOND};

/// Shift UTC timestamps to local exchange time by a fixed offset in hours.
pub fn localize(ticks: &mut [Tick], gmt_offset_hours: f64) {
    let shift = (gmt_offset_hours * NANOS_PER_HOUR as f64).round() as i64;
    for tick in ticks {
        tick.ts_ns += shift;
    }
}

fn time_ns(t: NaiveTime) -> i64 {
    t.num_seconds_from_midnight() as i64 * NANOS_PER_SECOND + t.nanosecond() as i64
}

/// Keeps records whose local time of day is within `[open, close]`.
#[derive(Debug, Clone, Copy)]
pub struct SessionFilter {
    open_ns: i64,
    close_ns: i64,
}

impl SessionFilter {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            open_ns: time_ns(open),
            close_ns: time_ns(close),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Ok(Self::new(config.open_time()?, config.close_time()?))
    }

    /// Whether a timestamp falls inside the session (both ends inclusive).
    #[inline]
    pub fn contains(&self, ts_ns: i64) -> bool {
        let tod = time_of_day_ns(ts_ns);
        tod >= self.open_ns && tod <= self.close_ns
    }

    /// Drop records outside the session, preserving order.
    pub fn apply(&self, ticks: Vec<Tick>) -> Vec<Tick> {
        ticks.into_iter().filter(|t| self.contains(t.ts_ns)).collect()
    }
}
