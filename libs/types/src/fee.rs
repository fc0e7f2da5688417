//! Fee schedule
//!
//! Maker/taker fees are expressed in basis points on trade notional:
//! fee = notional × bps / 10000. Rates are signed, so a negative maker rate
//! pays a rebate. Computed fees round half-even to the configured precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const BPS_DENOMINATOR: u32 = 10_000;

/// Maker/taker fee rates in basis points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Maker rate in bps; negative = rebate.
    pub maker_bps: Decimal,
    /// Taker rate in bps.
    pub taker_bps: Decimal,
    /// Decimal places fees are rounded to (half-even).
    pub precision: u32,
}

impl FeeSchedule {
    pub fn new(maker_bps: Decimal, taker_bps: Decimal, precision: u32) -> Self {
        Self {
            maker_bps,
            taker_bps,
            precision,
        }
    }

    /// Compute (maker_fee, taker_fee) for a trade notional.
    pub fn assess(&self, notional: Decimal) -> (Decimal, Decimal) {
        (
            self.round(notional * self.maker_bps / Decimal::from(BPS_DENOMINATOR)),
            self.round(notional * self.taker_bps / Decimal::from(BPS_DENOMINATOR)),
        )
    }

    fn round(&self, fee: Decimal) -> Decimal {
        fee.round_dp_with_strategy(self.precision, RoundingStrategy::MidpointNearestEven)
            .normalize()
    }
}

impl Default for FeeSchedule {
    /// Maker −1.0 bps (rebate), taker +2.5 bps, 8 decimal places.
    fn default() -> Self {
        Self {
            maker_bps: Decimal::new(-10, 1),
            taker_bps: Decimal::new(25, 1),
            precision: 8,
        }
    }
}
