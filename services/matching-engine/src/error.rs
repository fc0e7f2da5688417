//! Engine error taxonomy
//!
//! All engine errors are values. A rejected submission still produces a
//! well-formed response; these reasons are logged and drive the status.

use thiserror::Error;

/// Why a submission was rejected before or during dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("symbol must be non-empty")]
    EmptySymbol,

    #[error("quantity must be positive")]
    InvalidQuantity,

    #[error("{0} orders require a price")]
    MissingPrice(&'static str),

    #[error("{0} orders must not carry a price")]
    UnexpectedPrice(&'static str),

    #[error("price must be positive")]
    InvalidPrice,

    #[error("stop orders require a stop price")]
    MissingStopPrice,

    #[error("stop price must be positive")]
    InvalidStopPrice,

    #[error("take-profit orders require a take-profit price")]
    MissingTakeProfitPrice,

    #[error("take-profit price must be positive")]
    InvalidTakeProfitPrice,

    #[error("{field} exceeds precision limits: {value}")]
    PrecisionExceeded { field: &'static str, value: String },

    #[error("insufficient liquidity to fill completely")]
    InsufficientLiquidity,
}
