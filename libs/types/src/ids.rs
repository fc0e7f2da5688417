//! Unique identifier types for engine entities
//!
//! Ids are engine-assigned counter strings ("ord-17", "trd-18"). They are
//! cheap to mint, monotonically increasing within a process, and the counter
//! can be resumed past any persisted id after a restart.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap an existing id string (deserialization, tests).
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Empty sentinel for responses to orders that were never accepted.
    ///
    /// Ids are assigned on acceptance; a rejected submission must not
    /// consume one.
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a trade.
///
/// Trade ids issued by one [`IdGenerator`] are monotonically increasing,
/// which gives a total order of trades within a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(String);

impl TradeId {
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trading symbol (e.g. "BTC-USD").
///
/// The engine treats symbols as opaque non-empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// # Panics
    /// Panics if the symbol is empty.
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(!s.is_empty(), "Symbol must be non-empty");
        Self(s)
    }

    /// Try to create a Symbol, returning None if empty.
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Generator for order and trade ids.
///
/// A single shared counter backs both id families, so ids also encode the
/// order in which the engine produced them.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    pub fn next_order_id(&self) -> OrderId {
        OrderId(format!("ord-{}", self.next()))
    }

    pub fn next_trade_id(&self) -> TradeId {
        TradeId(format!("trd-{}", self.next()))
    }

    /// Bump the counter past a previously issued id.
    ///
    /// Called for every id read back from a snapshot so the generator never
    /// reissues an id after a restart. Ids without a numeric suffix are
    /// ignored.
    pub fn observe(&self, id: &str) {
        if let Some(n) = id.rsplit('-').next().and_then(|s| s.parse::<u64>().ok()) {
            self.counter.fetch_max(n, Ordering::Relaxed);
        }
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_ids_unique_and_increasing() {
        let ids = IdGenerator::new();
        let a = ids.next_order_id();
        let b = ids.next_order_id();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "ord-1");
        assert_eq!(b.as_str(), "ord-2");
    }

    #[test]
    fn test_shared_counter_across_families() {
        let ids = IdGenerator::new();
        let o = ids.next_order_id();
        let t = ids.next_trade_id();
        assert_eq!(o.as_str(), "ord-1");
        assert_eq!(t.as_str(), "trd-2");
    }

    #[test]
    fn test_observe_resumes_counter() {
        let ids = IdGenerator::new();
        ids.observe("ord-41");
        ids.observe("trd-7");
        ids.observe("not-a-number-x");
        assert_eq!(ids.next_order_id().as_str(), "ord-42");
    }

    #[test]
    fn test_unassigned_order_id_is_empty() {
        assert!(OrderId::unassigned().as_str().is_empty());
    }

    #[test]
    fn test_symbol_non_empty() {
        assert!(Symbol::try_new("BTC-USD").is_some());
        assert!(Symbol::try_new("").is_none());
    }

    #[test]
    #[should_panic(expected = "Symbol must be non-empty")]
    fn test_symbol_empty_panics() {
        Symbol::new("");
    }

    #[test]
    fn test_id_serialization() {
        let id = OrderId::from_string("ord-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ord-9\"");
        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
