//! Market bar — a single symbol's OHLCV record at a timestamp.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Symbol;

/// One OHLCV row for a single symbol at a single timestamp.
///
/// Constructed only by [`crate::feed::BarFeed`] after validation; every
/// `MarketBar` reaching a `Strategy` or the `Broker` already satisfies
/// `high >= max(open, close)` and `low <= min(open, close)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl MarketBar {
    /// True if any OHLC field is NaN or infinite, or volume overflowed to 0
    /// from a negative/non-numeric source value during loading.
    pub fn is_void(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .any(|v| !v.is_finite())
    }

    /// True if the bar satisfies the post-validation price ordering invariant.
    pub fn is_sane(&self) -> bool {
        !self.is_void()
            && self.open >= 0.0
            && self.high >= 0.0
            && self.low >= 0.0
            && self.close >= 0.0
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }

    /// Repair a `high < low` row by swapping the two fields in place.
    pub(crate) fn repair_high_low(&mut self) {
        if self.high < self.low {
            std::mem::swap(&mut self.high, &mut self.low);
        }
    }
}

/// A named bar paired with its symbol, as produced by `BarFeed::iter`.
pub type SymbolBar = (Symbol, MarketBar);
