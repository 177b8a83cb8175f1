//! RiskManager — stateless per-bar transformer from signals to orders.
//!
//! Consumes signals, current market bars, and portfolio state; produces
//! orders with sizing, stops, and take-profits. Also sweeps existing
//! positions for intrabar stop-loss / take-profit triggers.

pub mod atr;
pub mod sizer;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{IdGen, MarketBar, Order, OrderSide, Position, Signal, SignalDirection, Symbol};
use atr::compute_atr;
use sizer::{AtrSizer, PositionSizer};

use crate::feed::BarFeed;

/// Configuration and pluggable sizer for signal-to-order translation.
pub struct RiskManager {
    pub sizer: Box<dyn PositionSizer>,
    pub atr_period: usize,
    pub stop_atr_multiple: f64,
    pub tp_atr_multiple: f64,
    pub max_open_positions: usize,
    pub allow_short: bool,
}

impl Default for RiskManager {
    fn default() -> Self {
        Self {
            sizer: Box::new(AtrSizer::default()),
            atr_period: 14,
            stop_atr_multiple: 2.0,
            tp_atr_multiple: 4.0,
            max_open_positions: 10,
            allow_short: false,
        }
    }
}

impl RiskManager {
    /// Translate this bar's signals into orders, applying sizing and suppression.
    /// Orders are submitted in signal order; the caller (Engine) attributes
    /// each to its originating signal's strategy_id.
    #[allow(clippy::too_many_arguments)]
    pub fn process_signals(
        &self,
        signals: &[Signal],
        bars: &BTreeMap<Symbol, MarketBar>,
        feed: &BarFeed,
        equity: f64,
        open_positions: &BTreeMap<Symbol, Position>,
        id_gen: &mut IdGen,
    ) -> Vec<Order> {
        let mut orders = Vec::new();

        let open_long_count = open_positions.values().filter(|p| p.is_long()).count();

        for sig in signals {
            let Some(bar) = bars.get(&sig.symbol) else { continue };
            let price = bar.close;

            let history = match feed.history(&sig.symbol, sig.timestamp, Some(self.atr_period + 5)) {
                Ok(h) => h,
                Err(_) => continue,
            };
            let atr = compute_atr(&history, self.atr_period);

            let held_qty = open_positions.get(&sig.symbol).map(|p| p.quantity).unwrap_or(0.0);

            match sig.direction {
                SignalDirection::Long => {
                    if held_qty > 0.0 {
                        continue;
                    }
                    if open_long_count >= self.max_open_positions {
                        debug!(symbol = %sig.symbol, "max open positions reached, skipping");
                        continue;
                    }
                    let qty = self.sizer.size(equity, price, atr, sig.strength);
                    if qty <= 0.0 {
                        continue;
                    }
                    let sl = sig.stop_loss.or_else(|| (!atr.is_nan()).then(|| price - atr * self.stop_atr_multiple));
                    let tp = sig.take_profit.or_else(|| (!atr.is_nan()).then(|| price + atr * self.tp_atr_multiple));
                    orders.push(
                        Order::market(id_gen.next_order_id(), sig.timestamp, sig.symbol.clone(), OrderSide::Buy, qty)
                            .with_stops(sl, tp),
                    );
                }
                SignalDirection::Flat => {
                    if held_qty > 0.0 {
                        orders.push(Order::market(id_gen.next_order_id(), sig.timestamp, sig.symbol.clone(), OrderSide::Sell, held_qty));
                    } else if held_qty < 0.0 && self.allow_short {
                        orders.push(Order::market(id_gen.next_order_id(), sig.timestamp, sig.symbol.clone(), OrderSide::Buy, held_qty.abs()));
                    }
                }
                SignalDirection::Short => {
                    if !self.allow_short || held_qty < 0.0 {
                        continue;
                    }
                    let qty = self.sizer.size(equity, price, atr, sig.strength);
                    if qty <= 0.0 {
                        continue;
                    }
                    let sl = sig.stop_loss.or_else(|| (!atr.is_nan()).then(|| price + atr * self.stop_atr_multiple));
                    let tp = sig.take_profit.or_else(|| (!atr.is_nan()).then(|| price - atr * self.tp_atr_multiple));
                    orders.push(
                        Order::market(id_gen.next_order_id(), sig.timestamp, sig.symbol.clone(), OrderSide::Sell, qty)
                            .with_stops(sl, tp),
                    );
                }
            }
        }

        orders
    }

    /// Sweep open positions for intrabar stop-loss / take-profit triggers
    /// using the current bar's high/low. SL takes priority over TP on the
    /// same bar (mutually exclusive — `else if`, matching the reference
    /// risk model). Returned orders are attributed to `"__risk__"`.
    pub fn check_stop_conditions(
        &self,
        open_positions: &BTreeMap<Symbol, Position>,
        bars: &BTreeMap<Symbol, MarketBar>,
        timestamp: NaiveDateTime,
        id_gen: &mut IdGen,
    ) -> Vec<Order> {
        let mut orders = Vec::new();

        for (symbol, pos) in open_positions {
            if pos.is_flat() {
                continue;
            }
            let Some(bar) = bars.get(symbol) else { continue };

            if pos.is_long() {
                if pos.stop_loss.is_some_and(|sl| bar.low <= sl) {
                    orders.push(Order::market(id_gen.next_order_id(), timestamp, symbol.clone(), OrderSide::Sell, pos.quantity));
                } else if pos.take_profit.is_some_and(|tp| bar.high >= tp) {
                    orders.push(Order::market(id_gen.next_order_id(), timestamp, symbol.clone(), OrderSide::Sell, pos.quantity));
                }
            } else if pos.is_short() {
                if pos.stop_loss.is_some_and(|sl| bar.high >= sl) {
                    orders.push(Order::market(id_gen.next_order_id(), timestamp, symbol.clone(), OrderSide::Buy, pos.quantity.abs()));
                } else if pos.take_profit.is_some_and(|tp| bar.low <= tp) {
                    orders.push(Order::market(id_gen.next_order_id(), timestamp, symbol.clone(), OrderSide::Buy, pos.quantity.abs()));
                }
            }
        }

        // Attribution to "__risk__" is stamped by the Engine, not here.
        orders
    }
}
