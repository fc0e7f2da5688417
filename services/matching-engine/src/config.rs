//! Engine configuration

use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration with production defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maker fee in basis points; negative pays a rebate.
    pub maker_fee_bps: Decimal,
    /// Taker fee in basis points.
    pub taker_fee_bps: Decimal,
    /// Decimal places fees round to (half-even).
    pub fee_precision: u32,
    /// Retained trades per symbol; oldest evicted beyond this.
    pub recent_trades_limit: usize,
    /// Interval between background snapshots.
    pub persist_interval: Duration,
    /// Snapshot file location.
    pub persist_path: PathBuf,
    /// Most significant digits accepted on a price or quantity.
    pub max_significant_digits: u32,
    /// Most fractional digits accepted on a price or quantity.
    pub max_decimal_places: u32,
    /// Bounded per-subscriber event queue size.
    pub event_queue_capacity: usize,
    /// Levels per side included in book-change events.
    pub event_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maker_fee_bps: Decimal::new(-10, 1),
            taker_fee_bps: Decimal::new(25, 1),
            fee_precision: 8,
            recent_trades_limit: 1000,
            persist_interval: Duration::from_secs_f64(5.0),
            persist_path: PathBuf::from("./state/state.json"),
            max_significant_digits: 16,
            max_decimal_places: 8,
            event_queue_capacity: 1024,
            event_depth: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.maker_fee_bps, Decimal::new(-10, 1));
        assert_eq!(config.taker_fee_bps, Decimal::new(25, 1));
        assert_eq!(config.recent_trades_limit, 1000);
        assert_eq!(config.persist_interval, Duration::from_secs(5));
        assert_eq!(config.persist_path, PathBuf::from("./state/state.json"));
        assert_eq!(config.max_significant_digits, 16);
        assert_eq!(config.max_decimal_places, 8);
    }
}
