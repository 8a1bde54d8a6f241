//! Order book infrastructure
//!
//! Contains the per-price FIFO level, the two book sides, and the
//! order book combining them with an order-id index.

pub mod ask_book;
pub mod bid_book;
pub mod order_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use order_book::OrderBook;
pub use price_level::{PriceLevel, RestingOrder};

use types::ids::OrderId;
use types::numeric::{Price, Quantity};

/// One fill consumed from the head of a side's best level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelFill {
    pub maker_order_id: OrderId,
    pub maker_sequence: u64,
    /// The maker's resting price (the execution price)
    pub price: Price,
    /// Quantity actually filled
    pub quantity: Quantity,
    /// Maker's remaining quantity after the fill (zero = fully filled)
    pub maker_remaining: Quantity,
}
