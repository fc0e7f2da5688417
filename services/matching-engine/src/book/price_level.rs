//! Price level with FIFO queue
//!
//! A price level holds all resting orders at one price. Arrival order is
//! tracked in an id queue while the orders themselves live in an id-keyed
//! map, so cancellation is O(1): the order leaves the map and its stale id
//! is skimmed off the queue the next time the head is inspected.

use std::collections::{HashMap, VecDeque};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::Order;

/// A price level containing orders at a specific price.
///
/// Maintains strict FIFO ordering for time-priority matching. The cached
/// `total_remaining` always equals the sum of live orders' remaining
/// quantities.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    /// Arrival order; may contain ids of already-cancelled orders.
    queue: VecDeque<OrderId>,
    /// Live orders at this level.
    orders: HashMap<OrderId, Order>,
    total_remaining: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level.
    pub fn new(price: Price) -> Self {
        Self {
            price,
            queue: VecDeque::new(),
            orders: HashMap::new(),
            total_remaining: Quantity::zero(),
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Insert an order at the back of the queue (time priority).
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.price, Some(self.price));
        self.total_remaining = self.total_remaining + order.remaining;
        self.queue.push_back(order.order_id.clone());
        self.orders.insert(order.order_id.clone(), order);
    }

    /// Remove an order by id.
    ///
    /// Returns the removed order, or None if it is not resting here. The
    /// queue keeps the stale id; it is discarded when it reaches the head.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let order = self.orders.remove(order_id)?;
        self.total_remaining = self.total_remaining - order.remaining;
        Some(order)
    }

    /// Peek at the earliest live order, discarding stale queue ids.
    pub fn peek_front(&mut self) -> Option<&Order> {
        self.skim();
        self.queue.front().and_then(|id| self.orders.get(id))
    }

    /// Fill the earliest live order by `quantity`.
    ///
    /// Returns the order if this fill completed it (it is removed from the
    /// level), None if it remains resting with a reduced quantity.
    ///
    /// # Panics
    /// Panics if the level is empty or the fill exceeds the front order's
    /// remaining quantity.
    pub fn fill_front(&mut self, quantity: Quantity) -> Option<Order> {
        self.skim();
        let front_id = self.queue.front().expect("fill_front on empty level");
        let maker = self
            .orders
            .get_mut(front_id)
            .expect("front id is live after skim");

        maker.fill(quantity);
        self.total_remaining = self.total_remaining - quantity;

        if maker.is_filled() {
            let id = self.queue.pop_front().expect("front id exists");
            return self.orders.remove(&id);
        }
        None
    }

    /// Total remaining quantity of live orders at this level.
    pub fn total_remaining(&self) -> Quantity {
        self.total_remaining
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of live orders at this level.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Live orders in FIFO order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.queue.iter().filter_map(|id| self.orders.get(id))
    }

    fn skim(&mut self) {
        while let Some(front) = self.queue.front() {
            if self.orders.contains_key(front) {
                break;
            }
            self.queue.pop_front();
        }
    }
}
