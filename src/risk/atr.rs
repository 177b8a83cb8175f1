//! ATR (Average True Range) — volatility proxy used for sizing and stop placement.
//!
//! This is a simple rolling mean of true ranges, not Wilder's exponential
//! smoothing. The two are different estimators; the RiskManager here uses
//! the simple-mean form so sizing stays a pure function of a fixed window.

use crate::domain::MarketBar;

/// Mean of the last `period` true ranges. Requires at least `period + 1`
/// bars (each TR needs a previous close); returns NaN otherwise, signaling
/// to the caller that sizing must be skipped for this bar.
pub fn compute_atr(history: &[MarketBar], period: usize) -> f64 {
    if period == 0 || history.len() < period + 1 {
        return f64::NAN;
    }

    let true_ranges: Vec<f64> = history
        .windows(2)
        .map(|pair| {
            let (prev, cur) = (pair[0], pair[1]);
            let hl = cur.high - cur.low;
            let hc = (cur.high - prev.close).abs();
            let lc = (cur.low - prev.close).abs();
            hl.max(hc).max(lc)
        })
        .collect();

    let window = &true_ranges[true_ranges.len() - period..];
    window.iter().sum::<f64>() / period as f64
}
