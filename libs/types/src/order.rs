//! Order lifecycle types

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use crate::time;
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type.
///
/// Market, limit, IOC and FOK orders enter the matching path directly;
/// stop, stop-limit and take-profit orders park off-book until their price
/// condition converts them into a market or limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Ioc,
    Fok,
    Stop,
    StopLimit,
    TakeProfit,
}

impl OrderType {
    /// True for order types that park in the trigger table on submission.
    pub fn is_trigger(&self) -> bool {
        matches!(
            self,
            OrderType::Stop | OrderType::StopLimit | OrderType::TakeProfit
        )
    }
}

/// Order status.
///
/// Transitions are monotone: new → partially_filled → filled, and any
/// non-terminal state may move to cancelled or rejected. Trigger orders sit
/// in pending_trigger until activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    PendingTrigger,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// An order: immutable identity plus mutable fill state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Opaque caller reference, echoed back but never indexed.
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Limit price. Present for limit/ioc/stop_limit, optional for fok,
    /// absent for market/stop/take_profit.
    pub price: Option<Price>,
    pub stop_price: Option<Price>,
    pub take_profit_price: Option<Price>,
    pub quantity: Quantity,
    pub remaining: Quantity,
    pub filled: Quantity,
    pub status: OrderStatus,
    pub created_at: String,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        quantity: Quantity,
        price: Option<Price>,
        stop_price: Option<Price>,
        take_profit_price: Option<Price>,
        client_order_id: Option<String>,
    ) -> Self {
        Self {
            order_id,
            client_order_id,
            symbol,
            side,
            order_type,
            price,
            stop_price,
            take_profit_price,
            quantity,
            remaining: quantity,
            filled: Quantity::zero(),
            status: OrderStatus::New,
            created_at: time::utc_now(),
        }
    }

    /// Check quantity invariant: filled + remaining = quantity.
    pub fn check_invariant(&self) -> bool {
        self.filled.as_decimal() + self.remaining.as_decimal() == self.quantity.as_decimal()
    }

    pub fn is_filled(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn has_fills(&self) -> bool {
        !self.filled.is_zero()
    }

    /// Apply a fill and advance the status.
    ///
    /// # Panics
    /// Panics if the fill exceeds the remaining quantity.
    pub fn fill(&mut self, quantity: Quantity) {
        assert!(
            quantity.as_decimal() <= self.remaining.as_decimal(),
            "Fill would exceed remaining quantity"
        );
        self.remaining = self.remaining - quantity;
        self.filled = self.filled + quantity;
        self.status = if self.remaining.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        debug_assert!(self.check_invariant());
    }

    /// Cancel the order.
    ///
    /// # Panics
    /// Panics if the order is already in a terminal state.
    pub fn cancel(&mut self) {
        assert!(
            !self.status.is_terminal(),
            "Cannot cancel terminal order"
        );
        self.status = OrderStatus::Cancelled;
    }

    /// Mark the order rejected.
    pub fn reject(&mut self) {
        self.status = OrderStatus::Rejected;
    }

    /// Mark the order parked in a trigger table.
    pub fn park(&mut self) {
        assert_eq!(self.status, OrderStatus::New, "Only new orders can park");
        self.status = OrderStatus::PendingTrigger;
    }

    /// Leave the trigger table: the order re-enters the matching path.
    pub fn activate(&mut self) {
        assert_eq!(
            self.status,
            OrderStatus::PendingTrigger,
            "Only pending orders can activate"
        );
        self.status = OrderStatus::New;
    }
}
