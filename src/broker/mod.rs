//! Broker — pending-order queue that fills against subsequent bars.
//!
//! Orders created at bar T can never fill on bar T: `process_bar` is only
//! ever called by the Engine on the bar *after* submission, and each pending
//! entry is checked against whatever bar is current when `process_bar` runs.

pub mod commission;
pub mod slippage;

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{Fill, MarketBar, Order, OrderSide, OrderStatus, OrderType, OrderId, Symbol};
use commission::{CommissionModel, PercentCommission};
use slippage::{FixedSlippage, SlippageModel};

struct PendingEntry {
    order: Order,
    bars_waited: u32,
}

/// Maintains the pending-order queue and matches it against each subsequent bar.
pub struct Broker {
    pub slippage: Box<dyn SlippageModel>,
    pub commission: Box<dyn CommissionModel>,
    pub max_bars_pending: u32,
    pending: Vec<PendingEntry>,
}

impl Default for Broker {
    fn default() -> Self {
        Self {
            slippage: Box::new(FixedSlippage::default()),
            commission: Box::new(PercentCommission::default()),
            max_bars_pending: 1,
            pending: Vec::new(),
        }
    }
}

impl Broker {
    pub fn submit(&mut self, order: Order) {
        self.pending.push(PendingEntry { order, bars_waited: 0 });
    }

    /// Attempt to fill every pending order against `bars`, in FIFO submission
    /// order. Returns the fills produced this bar, in the same FIFO order.
    pub fn process_bar(
        &mut self,
        bars: &std::collections::BTreeMap<Symbol, MarketBar>,
        attribution: &HashMap<OrderId, String>,
    ) -> Vec<Fill> {
        let mut fills = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for mut entry in std::mem::take(&mut self.pending) {
            entry.bars_waited += 1;

            let Some(bar) = bars.get(&entry.order.symbol) else {
                still_pending.push(entry);
                continue;
            };

            match Self::try_fill(&entry.order, bar) {
                Some(trial_price) => {
                    let raw_slippage = self.slippage.apply(trial_price, entry.order.quantity, bar);
                    let fill_price = match entry.order.side {
                        OrderSide::Buy => trial_price + raw_slippage,
                        OrderSide::Sell => trial_price - raw_slippage,
                    };
                    let commission = self.commission.calculate(entry.order.quantity, fill_price);

                    entry.order.status = OrderStatus::Filled;
                    let strategy_id = attribution.get(&entry.order.order_id).cloned().unwrap_or_default();

                    fills.push(Fill {
                        timestamp: bar.timestamp,
                        symbol: entry.order.symbol.clone(),
                        side: entry.order.side,
                        quantity: entry.order.quantity,
                        fill_price,
                        commission,
                        slippage: raw_slippage * entry.order.quantity,
                        order_id: entry.order.order_id.clone(),
                        strategy_id,
                        stop_loss: entry.order.stop_loss,
                        take_profit: entry.order.take_profit,
                    });
                }
                None if entry.bars_waited >= self.max_bars_pending => {
                    debug!(order_id = %entry.order.order_id, symbol = %entry.order.symbol, "order cancelled: max_bars_pending exceeded");
                }
                None => {
                    still_pending.push(entry);
                }
            }
        }

        self.pending = still_pending;
        fills
    }

    fn try_fill(order: &Order, bar: &MarketBar) -> Option<f64> {
        match order.order_type {
            OrderType::Market => Some(bar.open),
            OrderType::Limit => {
                let limit = order.limit_price?;
                match order.side {
                    OrderSide::Buy if bar.low <= limit => Some(limit.min(bar.open)),
                    OrderSide::Sell if bar.high >= limit => Some(limit.max(bar.open)),
                    _ => None,
                }
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    fn pending_bars_waited(&self, order_id: &OrderId) -> Option<u32> {
        self.pending.iter().find(|e| &e.order.order_id == order_id).map(|e| e.bars_waited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IdGen;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::BTreeMap;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn bar(day: u32, open: f64, high: f64, low: f64, close: f64) -> MarketBar {
        MarketBar { timestamp: ts(day), open, high, low, close, volume: 1_000_000 }
    }

    fn bars_for(day: u32, open: f64, high: f64, low: f64, close: f64) -> BTreeMap<Symbol, MarketBar> {
        let mut m = BTreeMap::new();
        m.insert("AAPL".to_string(), bar(day, open, high, low, close));
        m
    }

    #[test]
    fn market_order_fills_at_next_open() {
        let mut broker = Broker { slippage: Box::new(FixedSlippage::new(0.0)), commission: Box::new(PercentCommission { pct: 0.0 }), ..Broker::default() };
        let mut idgen = IdGen::new();
        let order = Order::market(idgen.next_order_id(), ts(1), "AAPL", OrderSide::Buy, 10.0);
        broker.submit(order);

        let fills = broker.process_bar(&bars_for(2, 101.0, 102.0, 100.0, 101.5), &HashMap::new());
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].fill_price, 101.0);
    }

    #[test]
    fn fixed_slippage_adds_for_buy_subtracts_for_sell() {
        let mut broker = Broker { slippage: Box::new(FixedSlippage::new(5.0)), commission: Box::new(PercentCommission { pct: 0.0 }), ..Broker::default() };
        let mut idgen = IdGen::new();
        broker.submit(Order::market(idgen.next_order_id(), ts(1), "AAPL", OrderSide::Buy, 10.0));
        let fills = broker.process_bar(&bars_for(2, 101.0, 102.0, 100.0, 101.5), &HashMap::new());
        assert!((fills[0].fill_price - 101.0505).abs() < 1e-6);
    }

    #[test]
    fn limit_buy_fills_only_when_crossed() {
        let mut broker = Broker::default();
        let mut idgen = IdGen::new();
        let order = Order::limit(idgen.next_order_id(), ts(1), "AAPL", OrderSide::Buy, 10.0, 90.0);
        broker.submit(order);

        // bar where low doesn't reach 90 -> stays pending
        let fills = broker.process_bar(&bars_for(2, 100.0, 101.0, 95.0, 100.0), &HashMap::new());
        assert!(fills.is_empty());
        assert_eq!(broker.pending_count(), 1);
    }

    #[test]
    fn limit_order_expires_after_max_bars_pending() {
        let mut broker = Broker { max_bars_pending: 2, ..Broker::default() };
        let mut idgen = IdGen::new();
        broker.submit(Order::limit(idgen.next_order_id(), ts(1), "AAPL", OrderSide::Buy, 10.0, 50.0));

        broker.process_bar(&bars_for(2, 100.0, 101.0, 95.0, 100.0), &HashMap::new());
        assert_eq!(broker.pending_count(), 1);
        let fills = broker.process_bar(&bars_for(3, 100.0, 101.0, 95.0, 100.0), &HashMap::new());
        assert!(fills.is_empty());
        assert_eq!(broker.pending_count(), 0);
    }

    #[test]
    fn order_missing_its_symbol_bar_stays_pending_without_incrementing_twice() {
        let mut broker = Broker::default();
        let mut idgen = IdGen::new();
        broker.submit(Order::market(idgen.next_order_id(), ts(1), "AAPL", OrderSide::Buy, 10.0));
        let mut other = BTreeMap::new();
        other.insert("MSFT".to_string(), bar(2, 300.0, 301.0, 299.0, 300.5));
        let fills = broker.process_bar(&other, &HashMap::new());
        assert!(fills.is_empty());
        assert_eq!(broker.pending_count(), 1);
    }

    #[test]
    fn attribution_map_stamps_strategy_id() {
        let mut broker = Broker::default();
        let mut idgen = IdGen::new();
        let order_id = idgen.next_order_id();
        broker.submit(Order::market(order_id.clone(), ts(1), "AAPL", OrderSide::Buy, 10.0));
        let mut attribution = HashMap::new();
        attribution.insert(order_id, "ma_cross".to_string());

        let fills = broker.process_bar(&bars_for(2, 101.0, 102.0, 100.0, 101.5), &attribution);
        assert_eq!(fills[0].strategy_id, "ma_cross");
    }

    #[test]
    fn bars_waited_increments_while_pending() {
        let mut broker = Broker { max_bars_pending: 5, ..Broker::default() };
        let mut idgen = IdGen::new();
        let order_id = idgen.next_order_id();
        broker.submit(Order::limit(order_id.clone(), ts(1), "AAPL", OrderSide::Buy, 10.0, 1.0));
        broker.process_bar(&bars_for(2, 100.0, 101.0, 95.0, 100.0), &HashMap::new());
        assert_eq!(broker.pending_bars_waited(&order_id), Some(1));
        broker.process_bar(&bars_for(3, 100.0, 101.0, 95.0, 100.0), &HashMap::new());
        assert_eq!(broker.pending_bars_waited(&order_id), Some(2));
    }
}
