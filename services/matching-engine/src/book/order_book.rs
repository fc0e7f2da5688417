//! Order book for a single symbol
//!
//! Two sorted ladders plus an order-id index. The matching loop enforces
//! strict price-time priority: best contra price first, FIFO within a level,
//! and the execution price is always the maker's resting price.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use super::ask_book::AskBook;
use super::bid_book::BidBook;

/// One execution produced by the matching loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub maker_order_id: OrderId,
    /// Maker's resting price, never the taker's limit.
    pub price: Price,
    pub quantity: Quantity,
    /// True if this fill completed the maker order and removed it.
    pub maker_completed: bool,
}

/// Aggregated view of one price level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelView {
    pub price: Price,
    pub quantity: Quantity,
}

/// Aggregated L2 view of a book: (price, quantity) per level, best first,
/// without order identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L2Snapshot {
    pub bids: Vec<LevelView>,
    pub asks: Vec<LevelView>,
}

/// Order book with price-time priority for a single symbol.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: Symbol,
    bids: BidBook,
    asks: AskBook,
    /// order_id → (side, price) for cancellation routing.
    order_index: HashMap<OrderId, (Side, Price)>,
    last_trade_price: Option<Price>,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BidBook::new(),
            asks: AskBook::new(),
            order_index: HashMap::new(),
            last_trade_price: None,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    pub fn set_last_trade_price(&mut self, price: Price) {
        self.last_trade_price = Some(price);
    }

    /// Rest a limit order at the tail of its price level.
    ///
    /// Must only be called with a priced order that has remaining quantity.
    pub fn add_limit(&mut self, order: Order) {
        let price = order.price.expect("resting order must carry a price");
        debug_assert!(!order.remaining.is_zero());
        self.order_index
            .insert(order.order_id.clone(), (order.side, price));
        match order.side {
            Side::Buy => self.bids.insert(order),
            Side::Sell => self.asks.insert(order),
        }
    }

    /// Cancel a resting order.
    ///
    /// Returns the order with status set to cancelled, or None if unknown
    /// (already filled, already cancelled, or never rested here).
    pub fn cancel(&mut self, order_id: &OrderId) -> Option<Order> {
        let (side, price) = self.order_index.remove(order_id)?;
        let removed = match side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        };
        removed.map(|mut order| {
            order.cancel();
            order
        })
    }

    /// Best bid as (price, aggregate quantity).
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best()
    }

    /// Best ask as (price, aggregate quantity).
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best()
    }

    /// Best bid and offer prices; either side may be empty.
    pub fn bbo(&self) -> (Option<Price>, Option<Price>) {
        (self.bids.best_price(), self.asks.best_price())
    }

    /// Top `depth` levels per side, best first.
    pub fn l2_snapshot(&self, depth: usize) -> L2Snapshot {
        let view = |(price, quantity)| LevelView { price, quantity };
        L2Snapshot {
            bids: self.bids.depth_snapshot(depth).into_iter().map(view).collect(),
            asks: self.asks.depth_snapshot(depth).into_iter().map(view).collect(),
        }
    }

    /// Whether an order on `side` at `price` (None = market) would cross
    /// the contra best.
    pub fn crossable(&self, side: Side, price: Option<Price>) -> bool {
        match side {
            Side::Buy => match price {
                None => self.asks.best_price().is_some(),
                Some(p) => self.asks.best_price().map_or(false, |ask| ask <= p),
            },
            Side::Sell => match price {
                None => self.bids.best_price().is_some(),
                Some(p) => self.bids.best_price().map_or(false, |bid| bid >= p),
            },
        }
    }

    /// Whether `quantity` can be filled completely at prices not worse than
    /// `price_cap` (None = unlimited). Read-only.
    pub fn fok_can_fill(&self, side: Side, price_cap: Option<Price>, quantity: Quantity) -> bool {
        let available = match side {
            Side::Buy => self.asks.available_at_or_better(price_cap),
            Side::Sell => self.bids.available_at_or_better(price_cap),
        };
        available >= quantity.as_decimal()
    }

    /// Match an incoming order against the book.
    ///
    /// Sweeps the contra ladder best-to-worst while the order remains
    /// crossable, consuming each level FIFO. The incoming order's limit
    /// price caps how deep the sweep goes but never becomes the execution
    /// price. Mutates maker orders and the incoming order in place.
    pub fn match_order(&mut self, incoming: &mut Order) -> Vec<Fill> {
        let mut fills = Vec::new();
        while !incoming.remaining.is_zero() && self.crossable(incoming.side, incoming.price) {
            let fill = match incoming.side {
                Side::Buy => Self::sweep_asks(&mut self.asks, incoming),
                Side::Sell => Self::sweep_bids(&mut self.bids, incoming),
            };
            let Some(fill) = fill else { continue };
            if fill.maker_completed {
                self.order_index.remove(&fill.maker_order_id);
            }
            self.last_trade_price = Some(fill.price);
            debug!(
                symbol = %self.symbol,
                maker = %fill.maker_order_id,
                taker = %incoming.order_id,
                price = %fill.price,
                quantity = %fill.quantity,
                "matched"
            );
            fills.push(fill);
        }
        fills
    }

    /// All resting orders, bids then asks, best price first, FIFO within
    /// each level. This is the book's persistence source: replaying the
    /// result through `add_limit` reconstructs an identical book.
    pub fn open_orders(&self) -> Vec<Order> {
        self.bids
            .open_orders()
            .chain(self.asks.open_orders())
            .cloned()
            .collect()
    }

    /// Number of resting orders.
    pub fn open_order_count(&self) -> usize {
        self.order_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    fn sweep_asks(asks: &mut AskBook, incoming: &mut Order) -> Option<Fill> {
        let best_price = asks.best_price().expect("crossable implies an ask level");
        let level = asks.best_level_mut().expect("best ask level exists");
        let Some(maker) = level.peek_front() else {
            // only cancelled ids remained at this level
            asks.remove_level(best_price);
            return None;
        };
        let maker_order_id = maker.order_id.clone();
        let quantity = incoming.remaining.min(maker.remaining);

        let completed = level.fill_front(quantity);
        let level_empty = level.is_empty();
        incoming.fill(quantity);
        if level_empty {
            asks.remove_level(best_price);
        }

        Some(Fill {
            maker_order_id,
            price: best_price,
            quantity,
            maker_completed: completed.is_some(),
        })
    }

    fn sweep_bids(bids: &mut BidBook, incoming: &mut Order) -> Option<Fill> {
        let best_price = bids.best_price().expect("crossable implies a bid level");
        let level = bids.best_level_mut().expect("best bid level exists");
        let Some(maker) = level.peek_front() else {
            bids.remove_level(best_price);
            return None;
        };
        let maker_order_id = maker.order_id.clone();
        let quantity = incoming.remaining.min(maker.remaining);

        let completed = level.fill_front(quantity);
        let level_empty = level.is_empty();
        incoming.fill(quantity);
        if level_empty {
            bids.remove_level(best_price);
        }

        Some(Fill {
            maker_order_id,
            price: best_price,
            quantity,
            maker_completed: completed.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::IdGenerator;
    use types::order::{OrderStatus, OrderType};

    fn book() -> OrderBook {
        OrderBook::new(Symbol::new("BTC-USD"))
    }

    fn limit(ids: &IdGenerator, side: Side, price: &str, qty: &str) -> Order {
        Order::new(
            ids.next_order_id(),
            Symbol::new("BTC-USD"),
            side,
            OrderType::Limit,
            qty.parse().unwrap(),
            Some(price.parse().unwrap()),
            None,
            None,
            None,
        )
    }

    fn market(ids: &IdGenerator, side: Side, qty: &str) -> Order {
        Order::new(
            ids.next_order_id(),
            Symbol::new("BTC-USD"),
            side,
            OrderType::Market,
            qty.parse().unwrap(),
            None,
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_add_limit_and_bbo() {
        let ids = IdGenerator::new();
        let mut book = book();

        book.add_limit(limit(&ids, Side::Buy, "29990", "1"));
        book.add_limit(limit(&ids, Side::Sell, "30010", "2"));

        let (bid, ask) = book.bbo();
        assert_eq!(bid, Some("29990".parse().unwrap()));
        assert_eq!(ask, Some("30010".parse().unwrap()));
    }

    #[test]
    fn test_match_executes_at_maker_price() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Sell, "30000", "2"));

        // Buy limit above the ask still executes at the resting 30000
        let mut taker = limit(&ids, Side::Buy, "30005", "1");
        let fills = book.match_order(&mut taker);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, "30000".parse().unwrap());
        assert_eq!(fills[0].quantity, "1".parse().unwrap());
        assert!(taker.is_filled());
        assert_eq!(book.best_ask().unwrap().1, "1".parse().unwrap());
        assert_eq!(book.last_trade_price(), Some("30000".parse().unwrap()));
    }

    #[test]
    fn test_market_sweeps_multiple_levels() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Sell, "30000", "1"));
        book.add_limit(limit(&ids, Side::Sell, "30010", "2"));

        let mut taker = market(&ids, Side::Buy, "1.5");
        let fills = book.match_order(&mut taker);

        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].price, "30000".parse().unwrap());
        assert_eq!(fills[0].quantity, "1".parse().unwrap());
        assert!(fills[0].maker_completed);
        assert_eq!(fills[1].price, "30010".parse().unwrap());
        assert_eq!(fills[1].quantity, "0.5".parse().unwrap());
        assert!(!fills[1].maker_completed);

        let (price, qty) = book.best_ask().unwrap();
        assert_eq!(price, "30010".parse().unwrap());
        assert_eq!(qty, "1.5".parse().unwrap());
    }

    #[test]
    fn test_limit_never_trades_through() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Sell, "30000", "1"));
        book.add_limit(limit(&ids, Side::Sell, "30020", "1"));

        // Cap at 30010: sweeps the 30000 level, stops before 30020
        let mut taker = limit(&ids, Side::Buy, "30010", "2");
        let fills = book.match_order(&mut taker);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, "30000".parse().unwrap());
        assert_eq!(taker.remaining, "1".parse().unwrap());
        assert_eq!(book.best_ask().unwrap().0, "30020".parse().unwrap());
    }

    #[test]
    fn test_fifo_within_level() {
        let ids = IdGenerator::new();
        let mut book = book();
        let first = limit(&ids, Side::Sell, "30000", "1");
        let second = limit(&ids, Side::Sell, "30000", "1");
        let first_id = first.order_id.clone();
        let second_id = second.order_id.clone();
        book.add_limit(first);
        book.add_limit(second);

        let mut taker = market(&ids, Side::Buy, "1.5");
        let fills = book.match_order(&mut taker);

        assert_eq!(fills[0].maker_order_id, first_id);
        assert_eq!(fills[1].maker_order_id, second_id);
    }

    #[test]
    fn test_cancel_then_match_skips_cancelled() {
        let ids = IdGenerator::new();
        let mut book = book();
        let x = limit(&ids, Side::Buy, "30000", "1");
        let y = limit(&ids, Side::Buy, "30000", "1");
        let z = limit(&ids, Side::Buy, "30000", "1");
        let (x_id, y_id, z_id) = (
            x.order_id.clone(),
            y.order_id.clone(),
            z.order_id.clone(),
        );
        book.add_limit(x);
        book.add_limit(y);
        book.add_limit(z);

        let cancelled = book.cancel(&y_id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let mut taker = market(&ids, Side::Sell, "2");
        let fills = book.match_order(&mut taker);
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].maker_order_id, x_id);
        assert_eq!(fills[1].maker_order_id, z_id);
        assert!(book.is_empty());
    }

    #[test]
    fn test_cancel_unknown_is_none() {
        let mut book = book();
        assert!(book.cancel(&OrderId::from_string("ord-404")).is_none());
    }

    #[test]
    fn test_cancel_filled_is_none() {
        let ids = IdGenerator::new();
        let mut book = book();
        let maker = limit(&ids, Side::Sell, "30000", "1");
        let maker_id = maker.order_id.clone();
        book.add_limit(maker);

        let mut taker = market(&ids, Side::Buy, "1");
        book.match_order(&mut taker);

        assert!(book.cancel(&maker_id).is_none());
    }

    #[test]
    fn test_crossable() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Sell, "30000", "1"));
        book.add_limit(limit(&ids, Side::Buy, "29990", "1"));

        assert!(book.crossable(Side::Buy, None));
        assert!(book.crossable(Side::Buy, Some("30000".parse().unwrap())));
        assert!(!book.crossable(Side::Buy, Some("29999".parse().unwrap())));
        assert!(book.crossable(Side::Sell, None));
        assert!(book.crossable(Side::Sell, Some("29990".parse().unwrap())));
        assert!(!book.crossable(Side::Sell, Some("29991".parse().unwrap())));
    }

    #[test]
    fn test_fok_can_fill() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Sell, "30000", "0.4"));
        book.add_limit(limit(&ids, Side::Sell, "30010", "0.3"));

        assert!(!book.fok_can_fill(Side::Buy, None, "1".parse().unwrap()));
        assert!(book.fok_can_fill(Side::Buy, None, "0.7".parse().unwrap()));
        // A cap below the second level limits the reachable quantity
        assert!(!book.fok_can_fill(
            Side::Buy,
            Some("30000".parse().unwrap()),
            "0.5".parse().unwrap()
        ));
        assert!(book.fok_can_fill(
            Side::Buy,
            Some("30000".parse().unwrap()),
            "0.4".parse().unwrap()
        ));
    }

    #[test]
    fn test_book_never_crossed_after_match() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Buy, "29990", "1"));
        book.add_limit(limit(&ids, Side::Sell, "30010", "1"));

        let mut taker = limit(&ids, Side::Buy, "30010", "0.5");
        book.match_order(&mut taker);
        // taker filled 0.5 against the ask; rest would be caller's concern
        let (bid, ask) = book.bbo();
        if let (Some(bid), Some(ask)) = (bid, ask) {
            assert!(bid < ask);
        }
    }

    #[test]
    fn test_l2_snapshot_shape() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Buy, "29990", "1"));
        book.add_limit(limit(&ids, Side::Buy, "29990", "2"));
        book.add_limit(limit(&ids, Side::Buy, "29980", "1"));
        book.add_limit(limit(&ids, Side::Sell, "30010", "4"));

        let l2 = book.l2_snapshot(1);
        assert_eq!(l2.bids.len(), 1);
        assert_eq!(l2.bids[0].price, "29990".parse().unwrap());
        assert_eq!(l2.bids[0].quantity, "3".parse().unwrap());
        assert_eq!(l2.asks[0].quantity, "4".parse().unwrap());
    }

    #[test]
    fn test_open_orders_round_trip_order() {
        let ids = IdGenerator::new();
        let mut book = book();
        book.add_limit(limit(&ids, Side::Buy, "29990", "1"));
        book.add_limit(limit(&ids, Side::Buy, "30000", "2"));
        book.add_limit(limit(&ids, Side::Sell, "30010", "3"));

        let orders = book.open_orders();
        assert_eq!(orders.len(), 3);
        // bids best-first, then asks
        assert_eq!(orders[0].price, Some("30000".parse().unwrap()));
        assert_eq!(orders[1].price, Some("29990".parse().unwrap()));
        assert_eq!(orders[2].price, Some("30010".parse().unwrap()));
    }
}
