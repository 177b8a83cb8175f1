//! BarFeed — owns the historical dataset and is the sole anti-lookahead boundary.
//!
//! `history()` is the structural guarantee the rest of the system leans on:
//! it is physically impossible for a caller to retrieve a bar whose timestamp
//! exceeds `up_to`, because the lookup is a binary search bounded by it.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::domain::{MarketBar, Symbol};
use crate::error::FeedError;

/// Chronological iterator over historical OHLCV bars for one or more symbols.
#[derive(Debug, Clone)]
pub struct BarFeed {
    series: BTreeMap<Symbol, Vec<MarketBar>>,
    index: Vec<NaiveDateTime>,
}

impl BarFeed {
    /// Build a feed from raw per-symbol series, applying the validation rules:
    /// sort ascending, drop duplicate timestamps keeping the last occurrence,
    /// repair `high < low` rows by swap, reject non-finite OHLC values.
    pub fn new(raw: BTreeMap<Symbol, Vec<MarketBar>>) -> Result<Self, FeedError> {
        let mut series = BTreeMap::new();

        for (symbol, mut bars) in raw {
            bars.sort_by_key(|b| b.timestamp);

            let mut deduped: Vec<MarketBar> = Vec::with_capacity(bars.len());
            for bar in bars {
                if deduped.last().map(|p: &MarketBar| p.timestamp) == Some(bar.timestamp) {
                    deduped.pop();
                }
                deduped.push(bar);
            }

            for bar in deduped.iter_mut() {
                bar.repair_high_low();
                if bar.is_void() {
                    return Err(FeedError::ValidationError(format!(
                        "non-finite OHLC value for {symbol} at {}",
                        bar.timestamp
                    )));
                }
            }

            series.insert(symbol, deduped);
        }

        let mut index: Vec<NaiveDateTime> = series
            .values()
            .flat_map(|bars| bars.iter().map(|b| b.timestamp))
            .collect();
        index.sort_unstable();
        index.dedup();

        Ok(Self { series, index })
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.series.keys()
    }

    /// Iterate in strict ascending timestamp order, yielding only the symbols
    /// that have a bar at that timestamp. Timestamps with no bars anywhere
    /// never occur, since `index` is built from the union of actual bars.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, BTreeMap<Symbol, MarketBar>)> + '_ {
        self.index.iter().map(move |&t| {
            let bars: BTreeMap<Symbol, MarketBar> = self
                .series
                .iter()
                .filter_map(|(sym, series)| {
                    series
                        .binary_search_by_key(&t, |b| b.timestamp)
                        .ok()
                        .map(|i| (sym.clone(), series[i]))
                })
                .collect();
            (t, bars)
        })
    }

    /// Ordered subsequence of `symbol`'s bars with timestamp <= `up_to`,
    /// optionally truncated to the last `n`. The sole anti-lookahead boundary.
    pub fn history(
        &self,
        symbol: &str,
        up_to: NaiveDateTime,
        n: Option<usize>,
    ) -> Result<Vec<MarketBar>, FeedError> {
        let series = self
            .series
            .get(symbol)
            .ok_or_else(|| FeedError::UnknownSymbol(symbol.to_string()))?;

        let cutoff = match series.binary_search_by_key(&up_to, |b| b.timestamp) {
            Ok(i) => i + 1,
            Err(i) => i,
        };
        let slice = &series[..cutoff];

        Ok(match n {
            Some(n) => slice[slice.len().saturating_sub(n)..].to_vec(),
            None => slice.to_vec(),
        })
    }
}

/// Resampling rule for downsampling a single symbol's series before feed
/// construction. Resampling is never lazy/per-iteration — doing so would
/// require bars from the future to complete the current aggregated bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResampleRule {
    /// `W` — buckets by ISO week (Monday start).
    Weekly,
    /// `ME` — buckets by calendar month, keyed on the month's last day.
    Monthly,
    /// `QE` — buckets by calendar quarter, keyed on the quarter's last day.
    Quarterly,
    /// Any other alias string. Carries no calendar bucketing of its own;
    /// callers resampling on a custom alias must supply their own `key_of`
    /// to `resample()` directly.
    Passthrough(String),
}

impl ResampleRule {
    pub fn from_alias(alias: &str) -> Self {
        match alias {
            "weekly" => ResampleRule::Weekly,
            "monthly" => ResampleRule::Monthly,
            "quarterly" => ResampleRule::Quarterly,
            other => ResampleRule::Passthrough(other.to_string()),
        }
    }

    /// The bucket key for a timestamp under this rule: a date every bar in
    /// the same calendar week/month/quarter maps to, used as `resample()`'s
    /// `key_of` closure. `Passthrough` buckets nothing — one bar per key.
    pub fn bucket_key(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let date = timestamp.date();
        let key_date = match self {
            ResampleRule::Weekly => {
                let week = date.iso_week();
                NaiveDate::from_isoywd_opt(week.year(), week.week(), chrono::Weekday::Mon)
                    .expect("valid ISO week always yields a Monday")
            }
            ResampleRule::Monthly => month_end(date.year(), date.month()),
            ResampleRule::Quarterly => {
                let quarter_end_month = ((date.month0() / 3) + 1) * 3;
                month_end(date.year(), quarter_end_month)
            }
            ResampleRule::Passthrough(_) => return timestamp,
        };
        key_date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
    }
}

/// The last calendar day of (year, month) (1-indexed).
fn month_end(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid next-month start")
        .pred_opt()
        .expect("the day before the 1st always exists")
}

/// Resample `bars` to the bucketing described by `rule` — the `ResampleRule`
/// analogue of calling `resample()` with `rule.bucket_key` directly.
pub fn resample_with_rule(bars: &[MarketBar], rule: &ResampleRule) -> Vec<MarketBar> {
    resample(bars, |t| rule.bucket_key(t))
}

/// Aggregate `bars` into coarser buckets under `key_of`, which must be
/// monotonically non-decreasing over the (already sorted) input: open=first,
/// high=max, low=min, close=last, volume=sum, timestamp=last bar in bucket.
pub fn resample(bars: &[MarketBar], key_of: impl Fn(NaiveDateTime) -> NaiveDateTime) -> Vec<MarketBar> {
    let mut out: Vec<MarketBar> = Vec::new();
    let mut current_key: Option<NaiveDateTime> = None;

    for &bar in bars {
        let key = key_of(bar.timestamp);
        if Some(key) == current_key {
            let last = out.last_mut().unwrap();
            last.high = last.high.max(bar.high);
            last.low = last.low.min(bar.low);
            last.close = bar.close;
            last.volume += bar.volume;
            last.timestamp = bar.timestamp;
        } else {
            out.push(bar);
            current_key = Some(key);
        }
    }
    out
}
