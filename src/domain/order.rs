//! Order — a request to trade, submitted to the Broker and filled against a later bar.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{OrderId, Symbol};

/// Attribution tag used for risk-generated stop/take-profit orders.
pub const RISK_STRATEGY_ID: &str = "__risk__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    Rejected,
}

/// A request to trade, created at bar T and never eligible to fill on bar T.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub timestamp: NaiveDateTime,
    pub symbol: Symbol,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: f64,
    pub limit_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub status: OrderStatus,
}

impl Order {
    pub fn market(
        order_id: OrderId,
        timestamp: NaiveDateTime,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        quantity: f64,
    ) -> Self {
        Self {
            order_id,
            timestamp,
            symbol: symbol.into(),
            order_type: OrderType::Market,
            side,
            quantity,
            limit_price: None,
            stop_loss: None,
            take_profit: None,
            status: OrderStatus::Pending,
        }
    }

    pub fn limit(
        order_id: OrderId,
        timestamp: NaiveDateTime,
        symbol: impl Into<Symbol>,
        side: OrderSide,
        quantity: f64,
        limit_price: f64,
    ) -> Self {
        Self {
            order_id,
            timestamp,
            symbol: symbol.into(),
            order_type: OrderType::Limit,
            side,
            quantity,
            limit_price: Some(limit_price),
            stop_loss: None,
            take_profit: None,
            status: OrderStatus::Pending,
        }
    }

    pub fn with_stops(mut self, stop_loss: Option<f64>, take_profit: Option<f64>) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }
}
