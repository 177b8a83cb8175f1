//! Moving-average crossover strategy — golden cross / death cross on a single symbol.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{MarketBar, Signal, SignalDirection, Symbol};
use crate::feed::BarFeed;

use super::{sma, Strategy};

/// Emits LONG on a golden cross (fast SMA crosses above slow SMA) and FLAT
/// on a death cross (fast crosses below slow). Computes both averages
/// directly from `history()` on each bar — no precomputed indicator pipeline.
pub struct MaCrossoverStrategy {
    strategy_id: String,
    symbol: Symbol,
    fast_period: usize,
    slow_period: usize,
    feed: Option<Rc<BarFeed>>,
    pending: Vec<Signal>,
    /// Whether the fast average was above the slow average as of the
    /// previous bar; `None` until enough history exists to tell.
    was_above: Option<bool>,
}

impl MaCrossoverStrategy {
    pub fn new(strategy_id: impl Into<String>, symbol: impl Into<Symbol>, fast_period: usize, slow_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(slow_period > fast_period, "slow_period must be > fast_period");
        Self {
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            fast_period,
            slow_period,
            feed: None,
            pending: Vec::new(),
            was_above: None,
        }
    }
}

impl Strategy for MaCrossoverStrategy {
    fn strategy_id(&self) -> &str {
        &self.strategy_id
    }

    fn symbols(&self) -> &[Symbol] {
        std::slice::from_ref(&self.symbol)
    }

    fn attach_feed(&mut self, feed: Rc<BarFeed>) {
        self.feed = Some(feed);
    }

    fn on_bar(&mut self, timestamp: NaiveDateTime, bars: &BTreeMap<Symbol, MarketBar>) {
        let Some(bar) = bars.get(&self.symbol) else { return };
        let Some(feed) = &self.feed else {
            debug!(strategy = %self.strategy_id, "feed not attached, skipping bar");
            return;
        };

        let history = match feed.history(&self.symbol, timestamp, Some(self.slow_period)) {
            Ok(h) => h,
            Err(_) => return,
        };
        if history.len() < self.slow_period {
            self.was_above = None;
            return;
        }

        let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
        let (Some(fast), Some(slow)) = (sma(&closes, self.fast_period), sma(&closes, self.slow_period)) else {
            return;
        };
        if bar.close.is_nan() {
            return;
        }

        let now_above = fast > slow;
        if let Some(was_above) = self.was_above {
            if now_above && !was_above {
                self.pending.push(Signal::new(timestamp, self.symbol.clone(), &self.strategy_id, SignalDirection::Long, 1.0));
            } else if !now_above && was_above {
                self.pending.push(Signal::new(timestamp, self.symbol.clone(), &self.strategy_id, SignalDirection::Flat, 1.0));
            }
        }
        self.was_above = Some(now_above);
    }

    fn flush_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.pending)
    }
}
