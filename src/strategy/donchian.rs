//! Donchian channel breakout strategy — the classic turtle/channel-breakout signal.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::domain::{MarketBar, Signal, SignalDirection, Symbol};
use crate::feed::BarFeed;

use super::Strategy;

/// Emits LONG when the close exceeds the highest high of the prior
/// `lookback` bars (excluding the current bar); emits FLAT when the close
/// falls back below the lowest low of the same window.
pub struct DonchianBreakoutStrategy {
    strategy_id: String,
    symbol: Symbol,
    lookback: usize,
    feed: Option<Rc<BarFeed>>,
    pending: Vec<Signal>,
    in_position: bool,
}

impl DonchianBreakoutStrategy {
    pub fn new(strategy_id: impl Into<String>, symbol: impl Into<Symbol>, lookback: usize) -> Self {
        assert!(lookback >= 1, "lookback must be >= 1");
        Self {
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            lookback,
            feed: None,
            pending: Vec::new(),
            in_position: false,
        }
    }
}

impl Strategy for DonchianBreakoutStrategy {
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
        let Some(feed) = &self.feed else { return };

        // history() up to and including the current bar; the window used for
        // the channel is everything before the current bar.
        let history = match feed.history(&self.symbol, timestamp, Some(self.lookback + 1)) {
            Ok(h) => h,
            Err(_) => return,
        };
        if history.len() <= self.lookback {
            return; // not enough prior bars to form a full channel
        }

        let window = &history[..history.len() - 1];
        let upper = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lower = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        if bar.close.is_nan() {
            return;
        }

        if !self.in_position && bar.close > upper {
            self.pending.push(Signal::new(timestamp, self.symbol.clone(), &self.strategy_id, SignalDirection::Long, 1.0));
            self.in_position = true;
        } else if self.in_position && bar.close < lower {
            self.pending.push(Signal::new(timestamp, self.symbol.clone(), &self.strategy_id, SignalDirection::Flat, 1.0));
            self.in_position = false;
        }
    }

    fn flush_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.pending)
    }
}
