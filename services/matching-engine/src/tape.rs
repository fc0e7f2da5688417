//! Recent-trade tape
//!
//! Bounded FIFO of the most recent trades per symbol, oldest evicted.
//! Supports full reads and incremental replay from a known trade id.

use std::collections::VecDeque;
use types::ids::TradeId;
use types::trade::Trade;

/// Bounded history of recent trades for one symbol.
#[derive(Debug, Clone)]
pub struct TradeTape {
    trades: VecDeque<Trade>,
    capacity: usize,
}

impl TradeTape {
    pub fn new(capacity: usize) -> Self {
        Self {
            trades: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a trade, evicting the oldest past the retention cap.
    pub fn push(&mut self, trade: Trade) {
        if self.trades.len() >= self.capacity {
            self.trades.pop_front();
        }
        self.trades.push_back(trade);
    }

    /// Full retained window, oldest first.
    pub fn all(&self) -> Vec<Trade> {
        self.trades.iter().cloned().collect()
    }

    /// Trades after the given id, oldest first.
    ///
    /// If the id is not in the retained window (evicted or unknown), the
    /// full window is returned so a lagging poller resynchronizes.
    pub fn since(&self, trade_id: &TradeId) -> Vec<Trade> {
        match self.trades.iter().position(|t| &t.trade_id == trade_id) {
            Some(position) => self.trades.iter().skip(position + 1).cloned().collect(),
            None => self.all(),
        }
    }

    /// Id of the most recent trade.
    pub fn latest_id(&self) -> Option<TradeId> {
        self.trades.back().map(|t| t.trade_id.clone())
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
