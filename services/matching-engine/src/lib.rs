//! Matching engine service
//!
//! Per-symbol limit order books with strict price-time priority, a
//! matching loop that never trades through a better price, market / limit
//! / IOC / FOK execution plus stop, stop-limit and take-profit triggers,
//! and snapshot-based persistence so a cold restart reconstructs all
//! resting liquidity and pending triggers.
//!
//! **Key invariants:**
//! - Execution price is always the maker's resting price
//! - FIFO consumption within a price level
//! - FOK fills completely or not at all
//! - Market and IOC orders never rest
//! - An activated trigger never re-enters the trigger table

pub mod api;
pub mod book;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod tape;
pub mod triggers;

pub use api::{BboView, CancelResponse, L2View, OrderRequest, OrderResponse, RecentTradesView};
pub use config::EngineConfig;
pub use engine::MatchingEngine;
pub use events::MarketEvent;
