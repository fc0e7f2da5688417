//! Trigger table for stop, stop-limit and take-profit orders
//!
//! Parked orders wait off-book until the last trade price or the contra
//! best crosses their trigger level. Firing order is insertion order, and
//! an order that fires leaves the table for good.

use types::ids::OrderId;
use types::numeric::Price;
use types::order::{Order, OrderType, Side};

/// Insertion-ordered table of pending trigger orders for one symbol.
///
/// Orders in the table are not indexed by the book; they hold status
/// `pending_trigger` until they fire or are cancelled.
#[derive(Debug, Clone, Default)]
pub struct TriggerTable {
    orders: Vec<Order>,
}

impl TriggerTable {
    pub fn new() -> Self {
        Self { orders: Vec::new() }
    }

    /// Park an order at the back of the table.
    pub fn push(&mut self, order: Order) {
        debug_assert!(order.order_type.is_trigger());
        self.orders.push(order);
    }

    /// Remove a parked order by id (cancellation path).
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|o| &o.order_id == order_id)?;
        Some(self.orders.remove(position))
    }

    /// Remove and return every order whose condition holds, preserving
    /// insertion order among both the fired and the remaining orders.
    pub fn take_fired(
        &mut self,
        last_trade_price: Option<Price>,
        best_bid: Option<Price>,
        best_ask: Option<Price>,
    ) -> Vec<Order> {
        let mut fired = Vec::new();
        let mut remaining = Vec::with_capacity(self.orders.len());
        for order in self.orders.drain(..) {
            if condition_met(&order, last_trade_price, best_bid, best_ask) {
                fired.push(order);
            } else {
                remaining.push(order);
            }
        }
        self.orders = remaining;
        fired
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Parked orders in insertion order.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

/// Whether a parked order's trigger condition holds against the given
/// market state. Callers evaluating at placement time pass `None` for the
/// book sides so only a real trade print can fire the order.
pub fn condition_met(
    order: &Order,
    last_trade_price: Option<Price>,
    best_bid: Option<Price>,
    best_ask: Option<Price>,
) -> bool {
    match order.order_type {
        OrderType::Stop | OrderType::StopLimit => {
            let Some(stop) = order.stop_price else {
                return false;
            };
            match order.side {
                // Buy stop arms above the market: fires when price rises to it
                Side::Buy => at_or_above(last_trade_price, stop) || at_or_above(best_ask, stop),
                // Sell stop arms below the market: fires when price falls to it
                Side::Sell => at_or_below(last_trade_price, stop) || at_or_below(best_bid, stop),
            }
        }
        OrderType::TakeProfit => {
            let Some(target) = order.take_profit_price else {
                return false;
            };
            match order.side {
                Side::Sell => at_or_above(last_trade_price, target) || at_or_above(best_bid, target),
                Side::Buy => at_or_below(last_trade_price, target) || at_or_below(best_ask, target),
            }
        }
        _ => false,
    }
}

fn at_or_above(observed: Option<Price>, level: Price) -> bool {
    observed.map_or(false, |p| p >= level)
}

fn at_or_below(observed: Option<Price>, level: Price) -> bool {
    observed.map_or(false, |p| p <= level)
}
