//! Trade execution types
//!
//! A trade records an atomic exchange between a resting maker and an
//! incoming taker. Trades are immutable once created.

use crate::ids::{OrderId, Symbol, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single execution between maker and taker
///
/// `price` is always the maker's resting price; `aggressor_side` is the
/// side of the incoming order. `sequence` is monotonic per symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    #[serde(rename = "sequence_number")]
    pub sequence: u64,
    pub symbol: Symbol,

    // Order references
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    // Execution details
    pub aggressor_side: Side,
    pub price: Price,
    pub quantity: Quantity,

    pub timestamp: i64, // Unix nanos
}

impl Trade {
    /// Create a new trade
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sequence: u64,
        symbol: Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        aggressor_side: Side,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            trade_id: TradeId::new(),
            sequence,
            symbol,
            maker_order_id,
            taker_order_id,
            aggressor_side,
            price,
            quantity,
            timestamp,
        }
    }

    /// Calculate trade value (price × quantity)
    pub fn trade_value(&self) -> Decimal {
        self.quantity.as_decimal() * self.price.as_decimal()
    }
}
