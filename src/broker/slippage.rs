//! Slippage models — always return a non-negative per-share cost.

use std::fmt::Debug;

use crate::domain::MarketBar;

pub trait SlippageModel: Debug {
    /// Per-share slippage cost (always non-negative); the Broker adds it to
    /// the fill price for BUYs and subtracts it for SELLs.
    fn apply(&self, price: f64, quantity: f64, bar: &MarketBar) -> f64;
}

/// Constant slippage expressed in basis points of price.
#[derive(Debug, Clone, Copy)]
pub struct FixedSlippage {
    bps: f64,
}

impl FixedSlippage {
    pub fn new(bps: f64) -> Self {
        Self { bps: bps / 10_000.0 }
    }
}

impl Default for FixedSlippage {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl SlippageModel for FixedSlippage {
    fn apply(&self, price: f64, _quantity: f64, _bar: &MarketBar) -> f64 {
        price * self.bps
    }
}

/// Market-impact model: slippage grows with participation rate.
/// `impact = spread + k * sqrt(quantity * price / max(volume * close, 1))`.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSlippage {
    pub spread_bps: f64,
    pub impact_coeff: f64,
}

impl Default for VolumeSlippage {
    fn default() -> Self {
        Self { spread_bps: 3.0, impact_coeff: 0.1 }
    }
}

impl SlippageModel for VolumeSlippage {
    fn apply(&self, price: f64, quantity: f64, bar: &MarketBar) -> f64 {
        let adv = (bar.volume as f64 * bar.close).max(1.0);
        let participation = quantity * price / adv;
        price * (self.spread_bps / 10_000.0 + self.impact_coeff * participation.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn bar(volume: u64, close: f64) -> MarketBar {
        MarketBar { timestamp: ts(), open: close, high: close, low: close, close, volume }
    }

    #[test]
    fn fixed_slippage_is_bps_of_price() {
        let s = FixedSlippage::new(5.0);
        let cost = s.apply(100.0, 10.0, &bar(1000, 100.0));
        assert!((cost - 0.05).abs() < 1e-9);
    }

    #[test]
    fn volume_slippage_grows_with_participation() {
        let s = VolumeSlippage::default();
        let small = s.apply(100.0, 10.0, &bar(1_000_000, 100.0));
        let large = s.apply(100.0, 500_000.0, &bar(1_000_000, 100.0));
        assert!(large > small);
    }

    #[test]
    fn volume_slippage_never_negative() {
        let s = VolumeSlippage::default();
        assert!(s.apply(100.0, 0.0, &bar(0, 0.0)) >= 0.0);
    }
}
