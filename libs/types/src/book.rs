//! Order book read models
//!
//! Aggregated views derived from a live book: the depth snapshot and the
//! best-bid-offer tuple. Both are serialized to subscribers and to the
//! snapshot read paths.

use crate::ids::Symbol;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Aggregated depth snapshot for one symbol
///
/// Bids are in descending price order, asks ascending; each entry is
/// `(price, total quantity at that level)`. Individual resting orders
/// are never exposed. `sequence` is the last per-symbol submission
/// sequence applied to the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
    #[serde(rename = "sequence_number")]
    pub sequence: u64,
}

impl BookSnapshot {
    /// An empty snapshot for a symbol with no book
    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: Vec::new(),
            asks: Vec::new(),
            sequence: 0,
        }
    }
}

/// Best bid and offer for one symbol
///
/// Any field may be absent when the corresponding side is empty.
/// Recomputed from the top level of each side after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bbo {
    pub symbol: Symbol,
    pub best_bid: Option<Price>,
    pub best_bid_quantity: Option<Quantity>,
    pub best_ask: Option<Price>,
    pub best_ask_quantity: Option<Quantity>,
}

impl Bbo {
    /// A BBO with both sides empty
    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            best_bid: None,
            best_bid_quantity: None,
            best_ask: None,
            best_ask_quantity: None,
        }
    }

    /// Whether both sides are priced and bid >= ask
    ///
    /// A crossed BBO at rest is an invariant violation.
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => bid >= ask,
            _ => false,
        }
    }
}
