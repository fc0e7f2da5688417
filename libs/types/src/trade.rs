//! Trade execution types

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An executed trade. Immutable once created.
///
/// Fees are signed: a negative maker fee is a rebate paid to the maker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub symbol: Symbol,
    /// Execution price: always the maker's resting price.
    pub price: Price,
    pub quantity: Quantity,
    /// Side of the aggressing (taker) order.
    pub aggressor_side: Side,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub timestamp: String,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trade_id: TradeId,
        symbol: Symbol,
        price: Price,
        quantity: Quantity,
        aggressor_side: Side,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        timestamp: String,
        maker_fee: Decimal,
        taker_fee: Decimal,
    ) -> Self {
        Self {
            trade_id,
            symbol,
            price,
            quantity,
            aggressor_side,
            maker_order_id,
            taker_order_id,
            timestamp,
            maker_fee,
            taker_fee,
        }
    }

    /// Trade notional (price × quantity).
    pub fn notional(&self) -> Decimal {
        self.price.as_decimal() * self.quantity.as_decimal()
    }
}
