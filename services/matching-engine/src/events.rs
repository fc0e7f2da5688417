//! Market event stream
//!
//! Trade and book-change events fan out to per-symbol subscribers over
//! bounded queues. A subscriber whose queue is full or whose receiver is
//! gone is dropped on the spot; slow consumers never backpressure matching.

use std::collections::HashMap;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Mutex;
use serde::Serialize;
use tracing::warn;
use types::ids::Symbol;
use types::trade::Trade;

use crate::book::L2Snapshot;

/// A trade print on a symbol's event stream.
#[derive(Debug, Clone, Serialize)]
pub struct TradeEvent {
    pub symbol: Symbol,
    pub trade: Trade,
}

/// Notification that a symbol's aggregated book changed.
///
/// Emitted after the trades that produced the change, so a subscriber
/// always sees every trade before the book state reflecting it.
#[derive(Debug, Clone, Serialize)]
pub struct BookChangedEvent {
    pub symbol: Symbol,
    pub book: L2Snapshot,
    pub timestamp: String,
}

/// Event on a symbol's market-data stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MarketEvent {
    Trade(TradeEvent),
    BookChanged(BookChangedEvent),
}

/// Per-symbol subscriber registry with bounded outbound queues.
#[derive(Debug)]
pub struct EventBus {
    subscribers: Mutex<HashMap<Symbol, Vec<SyncSender<MarketEvent>>>>,
    queue_capacity: usize,
}

impl EventBus {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            queue_capacity,
        }
    }

    /// Register a subscriber for one symbol's events.
    pub fn subscribe(&self, symbol: &Symbol) -> Receiver<MarketEvent> {
        let (tx, rx) = sync_channel(self.queue_capacity);
        let mut subscribers = self.subscribers.lock().expect("subscriber registry poisoned");
        subscribers.entry(symbol.clone()).or_default().push(tx);
        rx
    }

    /// Publish an event to all of a symbol's subscribers.
    ///
    /// Subscribers that cannot accept the event (queue full or receiver
    /// dropped) are removed.
    pub fn publish(&self, symbol: &Symbol, event: MarketEvent) {
        let mut subscribers = self.subscribers.lock().expect("subscriber registry poisoned");
        let Some(queue) = subscribers.get_mut(symbol) else {
            return;
        };
        let before = queue.len();
        queue.retain(|tx| tx.try_send(event.clone()).is_ok());
        let dropped = before - queue.len();
        if dropped > 0 {
            warn!(symbol = %symbol, dropped, "dropped lagging event subscribers");
        }
        if queue.is_empty() {
            subscribers.remove(symbol);
        }
    }

    /// Number of live subscribers for a symbol.
    pub fn subscriber_count(&self, symbol: &Symbol) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber registry poisoned")
            .get(symbol)
            .map_or(0, |q| q.len())
    }
}
