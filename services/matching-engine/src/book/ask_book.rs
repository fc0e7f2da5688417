//! Ask (sell-side) ladder
//!
//! Sell orders sorted by price ascending (best ask first). Uses BTreeMap
//! for deterministic iteration order.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Ask (sell) side of an order book.
///
/// The lowest price is the best ask; at each price level orders are
/// maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct AskBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl AskBook {
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order, creating its price level if absent.
    pub fn insert(&mut self, order: Order) {
        let price = order.price.expect("resting order must carry a price");
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .insert(order);
    }

    /// Remove an order; drops the level if it becomes empty.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        removed
    }

    /// Best (lowest) ask price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next().copied()
    }

    /// Best ask price and aggregate quantity.
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next()
            .map(|(price, level)| (*price, level.total_remaining()))
    }

    pub(crate) fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        self.levels.values_mut().next()
    }

    pub(crate) fn remove_level(&mut self, price: Price) {
        self.levels.remove(&price);
    }

    /// Top `depth` levels, best first, as (price, total quantity).
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .take(depth)
            .map(|(price, level)| (*price, level.total_remaining()))
            .collect()
    }

    /// Resting quantity at prices not worse than `cap` (<= cap), or across
    /// the whole side when `cap` is None. Read-only.
    pub fn available_at_or_better(&self, cap: Option<Price>) -> Decimal {
        self.levels
            .iter()
            .take_while(|(price, _)| cap.map_or(true, |c| **price <= c))
            .map(|(_, level)| level.total_remaining().as_decimal())
            .sum()
    }

    /// All resting orders, best price first, FIFO within each level.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.levels.values().flat_map(|level| level.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
