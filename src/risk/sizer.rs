//! Position sizers — pluggable quantity calculators consulted by the RiskManager.

use std::fmt::Debug;

/// Converts equity, price, volatility, and signal strength into a share quantity.
pub trait PositionSizer: Debug {
    fn size(&self, equity: f64, price: f64, atr: f64, strength: f64) -> f64;
}

/// Risk a fixed fraction of equity per trade, with the stop distance in ATR
/// units keeping dollar-risk constant regardless of volatility, capped by a
/// maximum position concentration.
#[derive(Debug, Clone, Copy)]
pub struct AtrSizer {
    pub risk_pct: f64,
    pub atr_multiplier: f64,
    pub max_position_pct: f64,
}

impl Default for AtrSizer {
    fn default() -> Self {
        Self { risk_pct: 0.01, atr_multiplier: 2.0, max_position_pct: 0.20 }
    }
}

impl PositionSizer for AtrSizer {
    fn size(&self, equity: f64, price: f64, atr: f64, strength: f64) -> f64 {
        if atr.is_nan() || atr <= 0.0 || price <= 0.0 {
            return 0.0;
        }
        let stop_distance = atr * self.atr_multiplier;
        let dollar_risk = equity * self.risk_pct * strength;
        let raw_qty = dollar_risk / stop_distance;
        let max_qty = equity * self.max_position_pct / price;
        raw_qty.min(max_qty).max(0.0).floor()
    }
}

/// Bet a fixed fraction of equity, ignoring volatility entirely.
#[derive(Debug, Clone, Copy)]
pub struct FixedFractionSizer {
    pub fraction: f64,
}

impl PositionSizer for FixedFractionSizer {
    fn size(&self, equity: f64, price: f64, _atr: f64, strength: f64) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        (equity * self.fraction * strength / price).max(0.0).floor()
    }
}
