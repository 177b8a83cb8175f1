//! Signal — advisory output of a Strategy, consumed by the RiskManager.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Symbol;

/// Directional intent a strategy expresses for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Long,
    Short,
    Flat,
}

/// A strategy's advisory output for one symbol at one timestamp.
///
/// Signals never place orders directly — the RiskManager decides whether
/// and how to act on them, including suppressing redundant ones (e.g. a
/// LONG signal on a symbol already held long).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub symbol: Symbol,
    pub strategy_id: String,
    pub direction: SignalDirection,
    pub strength: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Signal {
    pub fn new(
        timestamp: NaiveDateTime,
        symbol: impl Into<Symbol>,
        strategy_id: impl Into<String>,
        direction: SignalDirection,
        strength: f64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            strategy_id: strategy_id.into(),
            direction,
            strength: strength.clamp(0.0, 1.0),
            stop_loss: None,
            take_profit: None,
        }
    }

    pub fn with_stops(mut self, stop_loss: Option<f64>, take_profit: Option<f64>) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }
}
