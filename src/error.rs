//! Error taxonomy for the backtesting core.
//!
//! Two enums cover the whole surface: [`FeedError`] for bar-feed/strategy
//! failures and [`EngineError`] for run-level failures. `InsufficientHistory`
//! from the design notes is deliberately absent here — strategies and the
//! ATR calculation treat it as `Option::None` / `f64::NAN`, never as a
//! propagated error.

use thiserror::Error;

use crate::domain::Symbol;

/// Errors raised by [`crate::feed::BarFeed`] construction and access.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(Symbol),

    #[error("strategy accessed history before a feed was attached")]
    FeedNotAttached,

    #[error("invalid market data: {0}")]
    ValidationError(String),
}

/// Run-level failures surfaced by [`crate::engine::Engine::run`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Feed(#[from] FeedError),
}
