//! Event-driven backtesting engine: bar feed, strategy layer, risk manager,
//! broker simulator, and portfolio ledger, wired together by a single-threaded
//! engine that drives a strict per-bar protocol.
//!
//! - `domain` — immutable value records passed between layers (bars, signals,
//!   orders, fills, positions, trades).
//! - `feed` — the `BarFeed`, the sole structural anti-lookahead boundary.
//! - `strategy` — the `Strategy` trait plus two worked examples.
//! - `risk` — signal-to-order translation, sizing, and stop/take-profit checks.
//! - `broker` — pending-order matching against subsequent bars.
//! - `portfolio` — the cash/positions ledger.
//! - `engine` — the orchestrator.
//! - `fingerprint` — BLAKE3 hashing of a run's effective configuration.

pub mod broker;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;
pub mod fingerprint;
pub mod portfolio;
pub mod risk;
pub mod strategy;
