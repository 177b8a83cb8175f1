//! Engine — orchestrates the per-bar protocol and owns every component for
//! the lifetime of one run.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::info;

use crate::broker::Broker;
use crate::domain::{OrderId, RISK_STRATEGY_ID};
use crate::feed::BarFeed;
use crate::portfolio::Portfolio;
use crate::risk::RiskManager;
use crate::strategy::Strategy;

/// Run-level configuration. `risk_free_rate` is carried through unused by
/// the core — it is consumed only by the external performance-metrics layer.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    pub verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { initial_capital: 100_000.0, risk_free_rate: 0.0, verbose: true }
    }
}

/// The two output tables plus run metadata, returned once the feed is exhausted.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub equity_curve: Vec<crate::domain::EquitySnapshot>,
    pub trade_log: Vec<crate::domain::TradeRecord>,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    pub bars_processed: usize,
}

/// Owns Portfolio, Broker, RiskManager, the strategy collection, and a
/// shared read-only handle to the feed. Drives the strict per-bar protocol.
pub struct Engine {
    config: EngineConfig,
    feed: Rc<BarFeed>,
    strategies: Vec<Box<dyn Strategy>>,
    risk_manager: RiskManager,
    broker: Broker,
    portfolio: Portfolio,
    id_gen: crate::domain::IdGen,
    attribution: HashMap<OrderId, String>,
}

impl Engine {
    pub fn new(
        feed: Rc<BarFeed>,
        mut strategies: Vec<Box<dyn Strategy>>,
        risk_manager: RiskManager,
        broker: Broker,
        config: EngineConfig,
    ) -> Self {
        for strat in &mut strategies {
            strat.attach_feed(feed.clone());
        }
        Self {
            portfolio: Portfolio::new(config.initial_capital),
            config,
            feed,
            strategies,
            risk_manager,
            broker,
            id_gen: crate::domain::IdGen::new(),
            attribution: HashMap::new(),
        }
    }

    /// Run the full per-bar protocol to completion (§4.7):
    /// stop/TP sweep → strategy dispatch → risk translation → broker fills →
    /// apply fills → mark-to-market → advance.
    ///
    /// Step 4 (broker fills) is *computed* before step 1 of the same
    /// iteration, against whatever is already in the broker's pending queue —
    /// i.e. only orders submitted on strictly earlier bars, since this bar's
    /// own step 1/3 submissions haven't happened yet. This is what makes an
    /// order submitted at step 3 of bar T ineligible to fill at step 4 of
    /// bar T: it simply isn't in the queue yet when that computation runs.
    /// Applying the resulting fills to the portfolio is still deferred to
    /// its spec-ordered position (step 5, after the sweep/dispatch/translate
    /// steps), so the sweep at step 1 still sees position state as of the
    /// end of the previous bar, never a fill that settles on the current bar.
    pub fn run(&mut self) -> RunResult {
        if self.config.verbose {
            info!(symbols = ?self.feed.symbols().collect::<Vec<_>>(), "starting run");
        }

        let mut bars_processed = 0usize;

        for (timestamp, bars) in self.feed.iter() {
            // 4. Broker fills — settles orders carried over from prior bars
            // against this bar's prices. Applied to the portfolio below, in
            // its spec-ordered place after the sweep/dispatch/translate steps.
            let fills = self.broker.process_bar(&bars, &self.attribution);

            // 1. Stop/TP sweep — these orders cannot fill on this bar.
            let stop_orders =
                self.risk_manager.check_stop_conditions(&self.portfolio.positions, &bars, timestamp, &mut self.id_gen);
            for order in stop_orders {
                self.attribution.insert(order.order_id.clone(), RISK_STRATEGY_ID.to_string());
                self.broker.submit(order);
            }

            // 2. Strategy dispatch, in registration order.
            let mut signals = Vec::new();
            for strat in &mut self.strategies {
                strat.on_bar(timestamp, &bars);
                signals.extend(strat.flush_signals());
            }

            // 3. Risk translation — attribute each resulting order to the
            // first signal sharing its symbol.
            let equity = self.portfolio.equity();
            let orders = self.risk_manager.process_signals(
                &signals,
                &bars,
                &self.feed,
                equity,
                &self.portfolio.positions,
                &mut self.id_gen,
            );
            for order in orders {
                let strategy_id = signals
                    .iter()
                    .find(|s| s.symbol == order.symbol)
                    .map(|s| s.strategy_id.clone())
                    .unwrap_or_default();
                self.attribution.insert(order.order_id.clone(), strategy_id);
                self.broker.submit(order);
            }

            // 5. Apply fills to the ledger, then notify the originating strategy.
            for fill in &fills {
                self.portfolio.on_fill(fill);
                for strat in &mut self.strategies {
                    if strat.strategy_id() == fill.strategy_id {
                        strat.on_fill(fill);
                    }
                }
            }

            // 6. Mark-to-market.
            self.portfolio.mark_to_market(timestamp, &bars);

            bars_processed += 1;
        }

        if self.config.verbose {
            info!(bars_processed, equity = self.portfolio.equity(), "run finished");
        }

        RunResult {
            equity_curve: self.portfolio.equity_curve_with_drawdown(),
            trade_log: self.portfolio.trades.clone(),
            initial_capital: self.config.initial_capital,
            risk_free_rate: self.config.risk_free_rate,
            bars_processed,
        }
    }
}
