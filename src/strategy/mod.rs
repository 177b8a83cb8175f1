//! Strategy — per-bar signal producer, stateless with respect to the engine.
//!
//! A strategy is polymorphic over its capability set: `on_bar`, `flush_signals`,
//! `on_fill` (default no-op), `attach_feed`. It is not permitted to place
//! orders directly — only the RiskManager translates signals into orders.

mod donchian;
mod ma_crossover;

pub use donchian::DonchianBreakoutStrategy;
pub use ma_crossover::MaCrossoverStrategy;

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::domain::{Fill, MarketBar, Signal, Symbol};
use crate::feed::BarFeed;

/// Capability set a strategy exposes to the Engine.
pub trait Strategy {
    /// Stable identifier used for fill/order attribution.
    fn strategy_id(&self) -> &str;

    /// Symbols this strategy watches.
    fn symbols(&self) -> &[Symbol];

    /// Called once by the Engine before the first bar.
    fn attach_feed(&mut self, feed: Rc<BarFeed>);

    /// Called once per bar with the bars present at that timestamp. The
    /// strategy may call `history(sym, up_to=timestamp, ...)` on its
    /// attached feed and buffer zero or more signals internally.
    fn on_bar(&mut self, timestamp: NaiveDateTime, bars: &BTreeMap<Symbol, MarketBar>);

    /// Drains and returns the signals accumulated since the last call.
    fn flush_signals(&mut self) -> Vec<Signal>;

    /// Notified after a fill attributed to this strategy is applied to the
    /// portfolio. No-op by default — most strategies are stateless about fills.
    fn on_fill(&mut self, _fill: &Fill) {}
}

/// Simple moving average over the last `period` closes; `None` if fewer bars.
pub(crate) fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period || period == 0 {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}
