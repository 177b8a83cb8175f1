//! TradeRecord and EquitySnapshot — the two output tables the core produces.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderSide, Symbol};

/// One row per Fill. `pnl` is realized P&L, populated only on closing/reducing
/// fills (SELL against a long, BUY against a short); 0.0 on opening fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub quantity: f64,
    pub fill_price: f64,
    pub commission: f64,
    pub slippage: f64,
    pub pnl: f64,
    pub order_id: OrderId,
    pub strategy_id: String,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}

/// One row per bar, appended after mark-to-market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquitySnapshot {
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    pub holdings_value: f64,
    pub equity: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub drawdown: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn winner_requires_positive_pnl() {
        let t = TradeRecord {
            timestamp: ts(),
            symbol: "AAPL".into(),
            side: OrderSide::Sell,
            quantity: 10.0,
            fill_price: 110.0,
            commission: 1.0,
            slippage: 0.0,
            pnl: 100.0,
            order_id: OrderId("ORD-000001".into()),
            strategy_id: "ma_cross".into(),
        };
        assert!(t.is_winner());
        let mut losing = t.clone();
        losing.pnl = -5.0;
        assert!(!losing.is_winner());
    }
}
