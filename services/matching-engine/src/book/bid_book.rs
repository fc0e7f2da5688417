//! Bid (buy-side) ladder
//!
//! Buy orders sorted by price descending (best bid first). Uses BTreeMap
//! for deterministic iteration order.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

use super::price_level::PriceLevel;

/// Bid (buy) side of an order book.
///
/// The highest price is the best bid; at each price level orders are
/// maintained in FIFO order.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
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

    /// Best (highest) bid price.
    pub fn best_price(&self) -> Option<Price> {
        // BTreeMap iterates ascending, so the best bid is last
        self.levels.keys().next_back().copied()
    }

    /// Best bid price and aggregate quantity.
    pub fn best(&self) -> Option<(Price, Quantity)> {
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_remaining()))
    }

    pub(crate) fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        self.levels.values_mut().next_back()
    }

    pub(crate) fn remove_level(&mut self, price: Price) {
        self.levels.remove(&price);
    }

    /// Top `depth` levels, best first, as (price, total quantity).
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_remaining()))
            .collect()
    }

    /// Resting quantity at prices not worse than `cap` (>= cap), or across
    /// the whole side when `cap` is None. Read-only.
    pub fn available_at_or_better(&self, cap: Option<Price>) -> Decimal {
        self.levels
            .iter()
            .rev()
            .take_while(|(price, _)| cap.map_or(true, |c| **price >= c))
            .map(|(_, level)| level.total_remaining().as_decimal())
            .sum()
    }

    /// All resting orders, best price first, FIFO within each level.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> {
        self.levels.values().rev().flat_map(|level| level.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{IdGenerator, Symbol};
    use types::order::{OrderType, Side};

    fn bid(ids: &IdGenerator, price: &str, qty: &str) -> Order {
        Order::new(
            ids.next_order_id(),
            Symbol::new("BTC-USD"),
            Side::Buy,
            OrderType::Limit,
            qty.parse().unwrap(),
            Some(price.parse().unwrap()),
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_best_bid_is_highest() {
        let ids = IdGenerator::new();
        let mut book = BidBook::new();

        book.insert(bid(&ids, "30000", "1"));
        book.insert(bid(&ids, "30010", "2"));
        book.insert(bid(&ids, "29990", "1.5"));

        let (price, qty) = book.best().unwrap();
        assert_eq!(price, "30010".parse().unwrap());
        assert_eq!(qty, "2".parse().unwrap());
    }

    #[test]
    fn test_remove_drops_empty_level() {
        let ids = IdGenerator::new();
        let mut book = BidBook::new();
        let order = bid(&ids, "30000", "1");
        let id = order.order_id.clone();
        book.insert(order);

        assert!(book.remove(&id, "30000".parse().unwrap()).is_some());
        assert!(book.is_empty());
    }

    #[test]
    fn test_depth_snapshot_best_first() {
        let ids = IdGenerator::new();
        let mut book = BidBook::new();
        book.insert(bid(&ids, "30000", "1"));
        book.insert(bid(&ids, "30010", "2"));
        book.insert(bid(&ids, "29990", "1.5"));
        book.insert(bid(&ids, "30020", "0.5"));

        let depth = book.depth_snapshot(2);
        assert_eq!(depth.len(), 2);
        assert_eq!(depth[0].0, "30020".parse().unwrap());
        assert_eq!(depth[1].0, "30010".parse().unwrap());
    }

    #[test]
    fn test_available_at_or_better() {
        let ids = IdGenerator::new();
        let mut book = BidBook::new();
        book.insert(bid(&ids, "30000", "1"));
        book.insert(bid(&ids, "29990", "2"));
        book.insert(bid(&ids, "29980", "4"));

        // A sell capped at 29990 may hit 30000 and 29990
        let available = book.available_at_or_better(Some("29990".parse().unwrap()));
        assert_eq!(available, Decimal::from(3));

        // Uncapped reaches the whole side
        assert_eq!(book.available_at_or_better(None), Decimal::from(7));
    }

    #[test]
    fn test_open_orders_best_first_fifo() {
        let ids = IdGenerator::new();
        let mut book = BidBook::new();
        let first_at_best = bid(&ids, "30000", "1");
        let second_at_best = bid(&ids, "30000", "2");
        let worse = bid(&ids, "29990", "3");
        let expected = vec![
            first_at_best.order_id.clone(),
            second_at_best.order_id.clone(),
            worse.order_id.clone(),
        ];
        book.insert(first_at_best);
        book.insert(second_at_best);
        book.insert(worse);

        let got: Vec<_> = book.open_orders().map(|o| o.order_id.clone()).collect();
        assert_eq!(got, expected);
    }
}
