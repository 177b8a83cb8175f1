//! Commission models — always return a non-negative fee in account currency.

use std::fmt::Debug;

pub trait CommissionModel: Debug {
    fn calculate(&self, quantity: f64, fill_price: f64) -> f64;
}

/// Per-share rate with a floor.
#[derive(Debug, Clone, Copy)]
pub struct PerShareCommission {
    pub rate: f64,
    pub min_fee: f64,
}

impl Default for PerShareCommission {
    fn default() -> Self {
        Self { rate: 0.005, min_fee: 1.0 }
    }
}

impl CommissionModel for PerShareCommission {
    fn calculate(&self, quantity: f64, _fill_price: f64) -> f64 {
        (quantity * self.rate).max(self.min_fee)
    }
}

/// Flat percentage of notional value.
#[derive(Debug, Clone, Copy)]
pub struct PercentCommission {
    pub pct: f64,
}

impl Default for PercentCommission {
    fn default() -> Self {
        Self { pct: 0.001 }
    }
}

impl CommissionModel for PercentCommission {
    fn calculate(&self, quantity: f64, fill_price: f64) -> f64 {
        quantity * fill_price * self.pct
    }
}

/// Tiered by notional value — the highest threshold at or below the order's
/// notional determines the applied rate.
#[derive(Debug, Clone)]
pub struct TieredCommission {
    tiers: Vec<(f64, f64)>,
}

impl TieredCommission {
    pub fn new(mut tiers: Vec<(f64, f64)>) -> Self {
        tiers.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Self { tiers }
    }
}

impl Default for TieredCommission {
    fn default() -> Self {
        Self::new(vec![(0.0, 0.0015), (10_000.0, 0.0010), (100_000.0, 0.0007), (1_000_000.0, 0.0005)])
    }
}

impl CommissionModel for TieredCommission {
    fn calculate(&self, quantity: f64, fill_price: f64) -> f64 {
        let notional = quantity * fill_price;
        let mut rate = self.tiers.first().map(|t| t.1).unwrap_or(0.0);
        for &(threshold, r) in &self.tiers {
            if notional >= threshold {
                rate = r;
            }
        }
        notional * rate
    }
}
