//! Order book infrastructure module
//!
//! Contains price levels, the two side ladders, and the per-symbol book.

pub mod ask_book;
pub mod bid_book;
pub mod order_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use order_book::{Fill, L2Snapshot, LevelView, OrderBook};
pub use price_level::PriceLevel;
