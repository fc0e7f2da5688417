//! Public request/response surface
//!
//! Typed shapes consumed by transport layers. Incoming decimals arrive raw
//! and are validated by the engine; outgoing decimals serialize as
//! canonical strings and timestamps as ISO-8601 UTC with trailing `Z`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{OrderId, Symbol, TradeId};
use types::order::{OrderStatus, OrderType, Side};
use types::numeric::Quantity;
use types::trade::Trade;

use crate::book::LevelView;

/// Order submission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub stop_price: Option<Decimal>,
    #[serde(default)]
    pub take_profit_price: Option<Decimal>,
}

impl OrderRequest {
    fn base(symbol: &str, side: Side, order_type: OrderType, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            order_type,
            quantity,
            price: None,
            client_order_id: None,
            stop_price: None,
            take_profit_price: None,
        }
    }

    pub fn market(symbol: &str, side: Side, quantity: Decimal) -> Self {
        Self::base(symbol, side, OrderType::Market, quantity)
    }

    pub fn limit(symbol: &str, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            price: Some(price),
            ..Self::base(symbol, side, OrderType::Limit, quantity)
        }
    }

    pub fn ioc(symbol: &str, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            price: Some(price),
            ..Self::base(symbol, side, OrderType::Ioc, quantity)
        }
    }

    /// FOK order; a missing price behaves as a market-style all-or-nothing.
    pub fn fok(symbol: &str, side: Side, quantity: Decimal, price: Option<Decimal>) -> Self {
        Self {
            price,
            ..Self::base(symbol, side, OrderType::Fok, quantity)
        }
    }

    pub fn stop(symbol: &str, side: Side, quantity: Decimal, stop_price: Decimal) -> Self {
        Self {
            stop_price: Some(stop_price),
            ..Self::base(symbol, side, OrderType::Stop, quantity)
        }
    }

    pub fn stop_limit(
        symbol: &str,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            stop_price: Some(stop_price),
            price: Some(price),
            ..Self::base(symbol, side, OrderType::StopLimit, quantity)
        }
    }

    pub fn take_profit(
        symbol: &str,
        side: Side,
        quantity: Decimal,
        take_profit_price: Decimal,
    ) -> Self {
        Self {
            take_profit_price: Some(take_profit_price),
            ..Self::base(symbol, side, OrderType::TakeProfit, quantity)
        }
    }
}

/// Submission outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub trades: Vec<Trade>,
}

/// Cancellation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub order_id: OrderId,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CancelResponse {
    pub fn cancelled(order_id: OrderId) -> Self {
        Self {
            order_id,
            ok: true,
            reason: None,
        }
    }

    pub fn not_found(order_id: OrderId) -> Self {
        Self {
            order_id,
            ok: false,
            reason: Some("not_found".to_string()),
        }
    }
}

/// Best bid and offer with aggregate quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BboView {
    pub symbol: Symbol,
    pub bid: Option<LevelView>,
    pub ask: Option<LevelView>,
    pub timestamp: String,
}

/// Aggregated book view, `depth` levels per side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L2View {
    pub symbol: Symbol,
    pub bids: Vec<LevelView>,
    pub asks: Vec<LevelView>,
    pub timestamp: String,
}

/// Retained (or incremental) trade window for polling clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentTradesView {
    pub symbol: Symbol,
    pub trades: Vec<Trade>,
    pub latest_trade_id: Option<TradeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_with_string_decimals() {
        let json = r#"{
            "symbol": "BTC-USD",
            "side": "buy",
            "type": "limit",
            "quantity": "0.5",
            "price": "35000",
            "client_order_id": "abc-123"
        }"#;
        let req: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.symbol, "BTC-USD");
        assert_eq!(req.order_type, OrderType::Limit);
        assert_eq!(req.quantity, Decimal::new(5, 1));
        assert_eq!(req.price, Some(Decimal::from(35000)));
        assert_eq!(req.stop_price, None);
    }

    #[test]
    fn test_cancel_response_shapes() {
        let ok = CancelResponse::cancelled(OrderId::from_string("ord-1"));
        assert!(ok.ok);
        assert!(ok.reason.is_none());
        let json = serde_json::to_string(&ok).unwrap();
        assert!(!json.contains("reason"));

        let missing = CancelResponse::not_found(OrderId::from_string("ord-2"));
        assert!(!missing.ok);
        assert_eq!(missing.reason.as_deref(), Some("not_found"));
    }
}
