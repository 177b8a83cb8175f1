//! Portfolio — the cash/positions ledger. Sole owner of accounting state.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{EquitySnapshot, Fill, MarketBar, OrderSide, Position, Symbol, TradeRecord};

/// Cash and positions ledger, processing fills and producing the two output
/// tables (equity curve, trade log) the engine returns at the end of a run.
pub struct Portfolio {
    pub cash: f64,
    pub positions: BTreeMap<Symbol, Position>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquitySnapshot>,
    pub total_commission: f64,
    pub total_slippage: f64,
    pub initial_capital: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            positions: BTreeMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            total_commission: 0.0,
            total_slippage: 0.0,
            initial_capital,
        }
    }

    /// Apply a fill to cash and positions, appending one TradeRecord.
    pub fn on_fill(&mut self, fill: &Fill) {
        let pnl = match fill.side {
            OrderSide::Buy => self.apply_buy(fill),
            OrderSide::Sell => self.apply_sell(fill),
        };

        self.total_commission += fill.commission;
        self.total_slippage += fill.slippage;

        debug!(
            side = ?fill.side,
            symbol = %fill.symbol,
            quantity = fill.quantity,
            price = fill.fill_price,
            cash = self.cash,
            "fill applied"
        );

        self.trades.push(TradeRecord {
            timestamp: fill.timestamp,
            symbol: fill.symbol.clone(),
            side: fill.side,
            quantity: fill.quantity,
            fill_price: fill.fill_price,
            commission: fill.commission,
            slippage: fill.slippage,
            pnl,
            order_id: fill.order_id.clone(),
            strategy_id: fill.strategy_id.clone(),
        });
    }

    /// BUY: averages into an existing long, or covers/reduces a short,
    /// or opens a new long if flat.
    fn apply_buy(&mut self, fill: &Fill) -> f64 {
        self.cash -= fill.fill_price * fill.quantity + fill.commission;

        let existing = self.positions.get(&fill.symbol).copied();
        match existing {
            Some(pos) if pos.is_short() => {
                let realized = (pos.avg_entry - fill.fill_price) * fill.quantity;
                let new_qty = pos.quantity + fill.quantity;
                self.update_or_erase(&fill.symbol, pos, new_qty, realized);
                realized
            }
            Some(pos) if pos.is_long() => {
                let new_qty = pos.quantity + fill.quantity;
                let new_avg = (pos.quantity * pos.avg_entry + fill.quantity * fill.fill_price) / new_qty;
                self.positions.insert(
                    fill.symbol.clone(),
                    Position { quantity: new_qty, avg_entry: new_avg, ..pos },
                );
                0.0
            }
            _ => {
                let mut pos = Position::new_long(fill.quantity, fill.fill_price);
                pos.stop_loss = fill.stop_loss;
                pos.take_profit = fill.take_profit;
                self.positions.insert(fill.symbol.clone(), pos);
                0.0
            }
        }
    }

    /// SELL: realizes P&L against an existing long, or opens/adds to a
    /// short if flat (only reachable when shorting is permitted upstream).
    fn apply_sell(&mut self, fill: &Fill) -> f64 {
        self.cash += fill.fill_price * fill.quantity - fill.commission;

        let existing = self.positions.get(&fill.symbol).copied();
        match existing {
            Some(pos) if pos.is_long() => {
                let realized = (fill.fill_price - pos.avg_entry) * fill.quantity;
                let new_qty = pos.quantity - fill.quantity;
                self.update_or_erase(&fill.symbol, pos, new_qty, realized);
                realized
            }
            Some(pos) if pos.is_short() => {
                let new_qty = pos.quantity - fill.quantity;
                let new_avg = (pos.quantity.abs() * pos.avg_entry + fill.quantity * fill.fill_price) / new_qty.abs();
                self.positions.insert(
                    fill.symbol.clone(),
                    Position { quantity: new_qty, avg_entry: new_avg, ..pos },
                );
                0.0
            }
            _ => {
                let mut pos = Position::new_short(fill.quantity, fill.fill_price);
                pos.stop_loss = fill.stop_loss;
                pos.take_profit = fill.take_profit;
                self.positions.insert(fill.symbol.clone(), pos);
                0.0
            }
        }
    }

    fn update_or_erase(&mut self, symbol: &Symbol, pos: Position, new_qty: f64, realized: f64) {
        if new_qty.abs() < crate::domain::POSITION_EPSILON {
            self.positions.remove(symbol);
        } else {
            self.positions.insert(
                symbol.clone(),
                Position { quantity: new_qty, realized_pnl: pos.realized_pnl + realized, ..pos },
            );
        }
    }

    /// Value open positions at the current bar's close (stale at avg_entry
    /// if no bar is present for that symbol this step) and append a snapshot.
    pub fn mark_to_market(&mut self, timestamp: NaiveDateTime, bars: &BTreeMap<Symbol, MarketBar>) {
        let mut holdings_value = 0.0;
        let mut unrealized_pnl = 0.0;

        for (symbol, pos) in &self.positions {
            let price = bars.get(symbol).map(|b| b.close).unwrap_or(pos.avg_entry);
            holdings_value += pos.market_value(price);
            unrealized_pnl += pos.unrealized_pnl(price);
        }

        let realized_pnl: f64 = self.trades.iter().map(|t| t.pnl).sum();
        let equity = self.cash + holdings_value;

        self.equity_curve.push(EquitySnapshot {
            timestamp,
            cash: self.cash,
            holdings_value,
            equity,
            realized_pnl,
            unrealized_pnl,
            drawdown: 0.0,
        });
    }

    pub fn equity(&self) -> f64 {
        self.equity_curve.last().map(|s| s.equity).unwrap_or(self.initial_capital)
    }

    /// The equity curve with `drawdown` recomputed as a running peak-to-trough
    /// fraction; `mark_to_market` leaves the field at 0 since the running
    /// peak is only knowable once the full curve exists.
    pub fn equity_curve_with_drawdown(&self) -> Vec<EquitySnapshot> {
        let mut peak = f64::MIN;
        self.equity_curve
            .iter()
            .map(|snap| {
                peak = peak.max(snap.equity);
                let drawdown = if peak > 0.0 { (peak - snap.equity) / peak } else { 0.0 };
                EquitySnapshot { drawdown, ..*snap }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IdGen, OrderId};
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn fill(side: OrderSide, qty: f64, price: f64, id_gen: &mut IdGen) -> Fill {
        Fill {
            timestamp: ts(2),
            symbol: "AAPL".into(),
            side,
            quantity: qty,
            fill_price: price,
            commission: 1.0,
            slippage: 0.0,
            order_id: id_gen.next_order_id(),
            strategy_id: "ma_cross".into(),
            stop_loss: None,
            take_profit: None,
        }
    }

    #[test]
    fn buy_opens_long_and_debits_cash() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Buy, 10.0, 100.0, &mut idgen));
        assert_eq!(p.cash, 100_000.0 - 1001.0);
        assert_eq!(p.positions["AAPL"].quantity, 10.0);
        assert_eq!(p.trades[0].pnl, 0.0);
    }

    #[test]
    fn buy_averages_into_existing_long() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Buy, 10.0, 100.0, &mut idgen));
        p.on_fill(&fill(OrderSide::Buy, 10.0, 110.0, &mut idgen));
        let pos = p.positions["AAPL"];
        assert_eq!(pos.quantity, 20.0);
        assert!((pos.avg_entry - 105.0).abs() < 1e-9);
    }

    #[test]
    fn sell_against_long_realizes_pnl_and_credits_cash() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Buy, 10.0, 100.0, &mut idgen));
        p.on_fill(&fill(OrderSide::Sell, 10.0, 110.0, &mut idgen));
        assert!(!p.positions.contains_key("AAPL"));
        assert_eq!(p.trades[1].pnl, 100.0);
    }

    #[test]
    fn partial_sell_leaves_reduced_long() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Buy, 10.0, 100.0, &mut idgen));
        p.on_fill(&fill(OrderSide::Sell, 4.0, 110.0, &mut idgen));
        let pos = p.positions["AAPL"];
        assert_eq!(pos.quantity, 6.0);
        assert_eq!(p.trades[1].pnl, 40.0);
    }

    #[test]
    fn sell_with_no_position_opens_short() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Sell, 10.0, 100.0, &mut idgen));
        let pos = p.positions["AAPL"];
        assert!(pos.is_short());
        assert_eq!(pos.quantity, -10.0);
    }

    #[test]
    fn buy_against_short_covers_and_realizes_pnl() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Sell, 10.0, 100.0, &mut idgen));
        p.on_fill(&fill(OrderSide::Buy, 10.0, 90.0, &mut idgen));
        assert!(!p.positions.contains_key("AAPL"));
        assert_eq!(p.trades[1].pnl, 100.0);
    }

    #[test]
    fn erasure_uses_epsilon_not_exact_zero() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Buy, 10.0, 100.0, &mut idgen));
        p.on_fill(&fill(OrderSide::Sell, 10.0, 110.0, &mut idgen));
        assert!(!p.positions.contains_key("AAPL"));
    }

    #[test]
    fn mark_to_market_tracks_equity_identity() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Buy, 10.0, 100.0, &mut idgen));
        let mut bars = BTreeMap::new();
        bars.insert("AAPL".to_string(), MarketBar { timestamp: ts(3), open: 105.0, high: 106.0, low: 104.0, close: 105.0, volume: 1000 });
        p.mark_to_market(ts(3), &bars);
        let snap = p.equity_curve.last().unwrap();
        assert!((snap.cash + snap.holdings_value - snap.equity).abs() < 1e-9);
        assert_eq!(snap.holdings_value, 1050.0);
    }

    #[test]
    fn mark_to_market_uses_avg_entry_when_symbol_absent() {
        let mut p = Portfolio::new(100_000.0);
        let mut idgen = IdGen::new();
        p.on_fill(&fill(OrderSide::Buy, 10.0, 100.0, &mut idgen));
        p.mark_to_market(ts(3), &BTreeMap::new());
        assert_eq!(p.equity_curve.last().unwrap().holdings_value, 1000.0);
    }

    #[test]
    fn drawdown_recomputed_from_running_peak() {
        let mut p = Portfolio::new(100_000.0);
        p.equity_curve.push(EquitySnapshot { timestamp: ts(1), cash: 100_000.0, holdings_value: 0.0, equity: 100_000.0, realized_pnl: 0.0, unrealized_pnl: 0.0, drawdown: 0.0 });
        p.equity_curve.push(EquitySnapshot { timestamp: ts(2), cash: 110_000.0, holdings_value: 0.0, equity: 110_000.0, realized_pnl: 0.0, unrealized_pnl: 0.0, drawdown: 0.0 });
        p.equity_curve.push(EquitySnapshot { timestamp: ts(3), cash: 99_000.0, holdings_value: 0.0, equity: 99_000.0, realized_pnl: 0.0, unrealized_pnl: 0.0, drawdown: 0.0 });

        let curve = p.equity_curve_with_drawdown();
        assert_eq!(curve[0].drawdown, 0.0);
        assert_eq!(curve[1].drawdown, 0.0);
        assert!((curve[2].drawdown - (110_000.0 - 99_000.0) / 110_000.0).abs() < 1e-9);
    }

    #[test]
    fn order_id_type_is_used_in_trade_record() {
        let mut idgen = IdGen::new();
        let oid: OrderId = idgen.next_order_id();
        assert_eq!(oid.as_str(), "ORD-000001");
    }
}
