//! Fill — the result of a successfully executed Order.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderSide, Symbol};

/// Exactly one Fill is produced per filled Order; partial fills are not modeled.
///
/// `stop_loss`/`take_profit` are carried over from the originating Order so
/// the Portfolio can stamp a freshly opened Position with them — they are
/// not part of the output trade-log schema (see `TradeRecord`), only of the
/// internal handoff from Broker to Portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: NaiveDateTime,
    pub symbol: Symbol,
    pub side: OrderSide,
    pub quantity: f64,
    pub fill_price: f64,
    pub commission: f64,
    pub slippage: f64,
    pub order_id: OrderId,
    pub strategy_id: String,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Fill {
    /// Cash impact of this fill, sign-adjusted for side: negative for BUY
    /// (cash leaves the account), positive for SELL.
    pub fn net_amount(&self) -> f64 {
        let gross = self.fill_price * self.quantity;
        match self.side {
            OrderSide::Buy => -(gross + self.commission),
            OrderSide::Sell => gross - self.commission,
        }
    }
}
