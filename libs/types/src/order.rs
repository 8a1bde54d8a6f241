//! Order lifecycle types
//!
//! An order is created on acceptance, mutated only by the owning symbol
//! engine (fills reduce the remaining quantity), and leaves the book when
//! fully filled or cancelled.

use crate::ids::{OrderId, Symbol};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Order type
///
/// Determines price requirements and what happens to an unmatched
/// remainder after the match loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Match at any price; remainder is cancelled
    Market,
    /// Match up to the limit price; remainder rests on the book
    Limit,
    /// Immediate-or-cancel: match up to the limit, cancel the rest
    Ioc,
    /// Fill-or-kill: fully fill immediately or reject entirely
    Fok,
}

impl OrderType {
    /// Whether this type requires a limit price
    pub fn requires_price(&self) -> bool {
        !matches!(self, OrderType::Market)
    }

    /// Whether an unmatched remainder may rest on the book
    pub fn rests(&self) -> bool {
        matches!(self, OrderType::Limit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
            OrderType::Ioc => write!(f, "ioc"),
            OrderType::Fok => write!(f, "fok"),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted, not yet through the match loop
    New,
    /// Resting with no fills
    Open,
    /// Some fills; limit remainders rest in this state
    PartiallyFilled,
    /// Completely matched (terminal)
    Filled,
    /// Remainder cancelled, by policy or by request (terminal)
    Cancelled,
    /// Refused without any book mutation (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

/// Inbound order submission request
///
/// `price` is required unless `order_type` is market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    #[serde(default)]
    pub price: Option<Price>,
}

impl OrderRequest {
    /// Convenience constructor for a limit-priced request
    pub fn limit(symbol: &str, side: Side, quantity: Quantity, price: Price) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
        }
    }

    /// Convenience constructor for a market request
    pub fn market(symbol: &str, side: Side, quantity: Quantity) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
        }
    }
}

/// Complete order structure
///
/// `sequence` is the per-symbol submission sequence assigned on
/// acceptance; it, not the timestamp, is authoritative for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub price: Option<Price>,
    #[serde(rename = "sequence_number")]
    pub sequence: u64,
    pub timestamp: i64, // Unix nanos, monotonic ingestion time
    pub status: OrderStatus,
}

impl Order {
    /// Create a newly accepted order
    pub fn new(
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        quantity: Quantity,
        price: Option<Price>,
        sequence: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            symbol,
            side,
            order_type,
            quantity,
            filled_quantity: Quantity::zero(),
            remaining_quantity: quantity,
            price,
            sequence,
            timestamp,
            status: OrderStatus::New,
        }
    }

    /// Check quantity invariant: filled + remaining = total
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity.as_decimal() + self.remaining_quantity.as_decimal()
            == self.quantity.as_decimal()
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Record a fill and adjust status
    ///
    /// # Panics
    /// Panics if the fill would exceed the remaining quantity
    pub fn add_fill(&mut self, fill_quantity: Quantity) {
        assert!(
            fill_quantity.as_decimal() <= self.remaining_quantity.as_decimal(),
            "Fill would exceed order quantity"
        );

        self.filled_quantity = self.filled_quantity + fill_quantity;
        self.remaining_quantity = self.remaining_quantity - fill_quantity;

        if self.is_filled() {
            self.status = OrderStatus::Filled;
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }

        debug_assert!(self.check_invariant());
    }
}
