//! Position — a mutable per-symbol ledger entry owned exclusively by the Portfolio.

use serde::{Deserialize, Serialize};

/// Quantity below this magnitude is treated as flat and the position erased.
pub const POSITION_EPSILON: f64 = 1e-9;

/// Mutable ledger entry keyed by symbol. Positive quantity is long, negative is short.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub quantity: f64,
    pub avg_entry: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub realized_pnl: f64,
}

impl Position {
    pub fn new_long(quantity: f64, avg_entry: f64) -> Self {
        Self { quantity, avg_entry, stop_loss: None, take_profit: None, realized_pnl: 0.0 }
    }

    pub fn new_short(quantity: f64, avg_entry: f64) -> Self {
        Self { quantity: -quantity, avg_entry, stop_loss: None, take_profit: None, realized_pnl: 0.0 }
    }

    pub fn is_long(&self) -> bool {
        self.quantity > POSITION_EPSILON
    }

    pub fn is_short(&self) -> bool {
        self.quantity < -POSITION_EPSILON
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.abs() < POSITION_EPSILON
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.avg_entry) * self.quantity
    }
}
