//! Criterion benchmarks for the backtesting core's hot paths.
//!
//! Benchmarks:
//! 1. Full per-bar event loop across single- and multi-symbol feeds.
//! 2. ATR computation over a rolling history window.
//! 3. Broker pending-order matching under a deep backlog.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use backtest_engine::broker::Broker;
use backtest_engine::domain::{IdGen, MarketBar, Order, OrderSide};
use backtest_engine::engine::{Engine, EngineConfig};
use backtest_engine::feed::BarFeed;
use backtest_engine::risk::atr::compute_atr;
use backtest_engine::risk::RiskManager;
use backtest_engine::strategy::{DonchianBreakoutStrategy, MaCrossoverStrategy, Strategy};

fn make_series(n: usize, seed_offset: f64) -> Vec<MarketBar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + seed_offset + (i as f64 * 0.1).sin() * 10.0;
            MarketBar {
                timestamp: base + Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect()
}

fn single_symbol_feed(n: usize) -> Rc<BarFeed> {
    let mut raw = BTreeMap::new();
    raw.insert("BENCH".to_string(), make_series(n, 0.0));
    Rc::new(BarFeed::new(raw).unwrap())
}

fn multi_symbol_feed(n: usize, symbols: usize) -> Rc<BarFeed> {
    let mut raw = BTreeMap::new();
    for i in 0..symbols {
        raw.insert(format!("SYM{i}"), make_series(n, i as f64 * 10.0));
    }
    Rc::new(BarFeed::new(raw).unwrap())
}

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_event_loop");

    for &bar_count in &[252usize, 1260, 2520] {
        let feed = single_symbol_feed(bar_count);
        group.bench_with_input(BenchmarkId::new("no_strategy", bar_count), &feed, |b, feed| {
            b.iter(|| {
                let mut engine =
                    Engine::new(feed.clone(), Vec::new(), RiskManager::default(), Broker::default(), EngineConfig::default());
                black_box(engine.run())
            });
        });

        group.bench_with_input(BenchmarkId::new("ma_crossover", bar_count), &feed, |b, feed| {
            b.iter(|| {
                let strat: Box<dyn Strategy> = Box::new(MaCrossoverStrategy::new("ma", "BENCH", 20, 50));
                let mut engine =
                    Engine::new(feed.clone(), vec![strat], RiskManager::default(), Broker::default(), EngineConfig::default());
                black_box(engine.run())
            });
        });
    }

    let multi_feed = multi_symbol_feed(1260, 10);
    group.bench_function("10_symbols_1260_bars_donchian", |b| {
        b.iter(|| {
            let strategies: Vec<Box<dyn Strategy>> = (0..10)
                .map(|i| Box::new(DonchianBreakoutStrategy::new(format!("donch{i}"), format!("SYM{i}"), 50)) as Box<dyn Strategy>)
                .collect();
            let mut engine =
                Engine::new(multi_feed.clone(), strategies, RiskManager::default(), Broker::default(), EngineConfig::default());
            black_box(engine.run())
        });
    });

    group.finish();
}

fn bench_atr(c: &mut Criterion) {
    let mut group = c.benchmark_group("atr_compute");
    let series = make_series(2520, 0.0);

    for &period in &[14usize, 50, 200] {
        group.bench_with_input(BenchmarkId::new("period", period), &period, |b, &p| {
            b.iter(|| black_box(compute_atr(black_box(&series), p)));
        });
    }

    group.finish();
}

fn bench_broker_backlog(c: &mut Criterion) {
    let mut group = c.benchmark_group("broker_pending_queue");

    let timestamp = make_series(1, 0.0)[0].timestamp;

    group.bench_function("submit_and_fill_200_limits", |b| {
        b.iter(|| {
            let mut broker = Broker::default();
            let mut id_gen = IdGen::new();
            for _ in 0..200 {
                broker.submit(Order::limit(id_gen.next_order_id(), timestamp, "BENCH", OrderSide::Buy, 10.0, 90.0));
            }
            let mut bars = BTreeMap::new();
            bars.insert("BENCH".to_string(), MarketBar { timestamp, open: 88.0, high: 92.0, low: 85.0, close: 90.0, volume: 1_000_000 });
            black_box(broker.process_bar(&bars, &Default::default()))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_bar_loop, bench_atr, bench_broker_backlog);
criterion_main!(benches);
