//! Immutable value records passed between the engine's layers.

pub mod bar;
pub mod fill;
pub mod ids;
pub mod order;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::{MarketBar, SymbolBar};
pub use fill::Fill;
pub use ids::{ConfigHash, IdGen, OrderId};
pub use order::{Order, OrderSide, OrderStatus, OrderType, RISK_STRATEGY_ID};
pub use position::{Position, POSITION_EPSILON};
pub use signal::{Signal, SignalDirection};
pub use trade::{EquitySnapshot, TradeRecord};

/// Symbol type alias — a ticker or instrument identifier.
pub type Symbol = String;
