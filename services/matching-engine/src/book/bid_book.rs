//! Bid (buy-side) book
//!
//! Maintains buy levels sorted by price; the best bid is the highest
//! price. Uses BTreeMap for O(log P) level insertion and deterministic
//! iteration; the best level is read from the back of the map.

use std::collections::BTreeMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};

use super::price_level::{PriceLevel, RestingOrder};
use super::LevelFill;

/// Bid (buy) side of an order book
///
/// A level at price P is matchable for an incoming sell with limit L iff
/// P >= L; a market sell matches every level.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    /// Create a new empty bid book
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// Insert a resting order, creating its price level if needed
    pub fn insert(&mut self, price: Price, order: RestingOrder) {
        self.levels.entry(price).or_default().append(order);
    }

    /// Remove a resting order; drops the level if it empties
    pub fn remove(&mut self, price: Price, order_id: &OrderId) -> Option<RestingOrder> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(removed)
    }

    /// Best bid: highest price and its aggregate quantity
    pub fn best(&self) -> Option<(Price, Quantity)> {
        // BTreeMap iterates ascending; bids read from the back
        self.levels
            .iter()
            .next_back()
            .map(|(price, level)| (*price, level.total_quantity()))
    }

    /// Best bid price
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Fill the head of the best level with up to `max_quantity`
    ///
    /// Removes the level when it empties. Returns None on an empty side.
    pub fn fill_best(&mut self, max_quantity: Quantity) -> Option<LevelFill> {
        let (price, emptied, fill) = {
            let (price, level) = self.levels.iter_mut().next_back()?;
            let fill = level.fill_front(max_quantity)?;
            (*price, level.is_empty(), fill)
        };
        if emptied {
            self.levels.remove(&price);
        }
        Some(LevelFill {
            maker_order_id: fill.order_id,
            maker_sequence: fill.sequence,
            price,
            quantity: fill.quantity,
            maker_remaining: fill.remaining_after,
        })
    }

    /// Top `depth` levels as (price, aggregate quantity), best first
    pub fn depth(&self, depth: usize) -> Vec<(Price, Quantity)> {
        self.levels
            .iter()
            .rev() // highest prices first
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    /// Sum matchable liquidity for an incoming sell with the given limit
    ///
    /// Walks best-first and stops as soon as `required` is covered or a
    /// level no longer satisfies the limit. Strictly non-mutating.
    pub fn matchable_quantity(&self, limit: Option<Price>, required: Quantity) -> Quantity {
        let mut available = Quantity::zero();
        for (price, level) in self.levels.iter().rev() {
            if let Some(limit) = limit {
                if *price < limit {
                    break;
                }
            }
            available = available + level.total_quantity();
            if available >= required {
                break;
            }
        }
        available
    }

    /// The level at an exact price, if any
    pub fn level(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Check if the bid book is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of active price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Iterate levels ascending by price (integrity checks, tests)
    pub fn iter(&self) -> impl Iterator<Item = (&Price, &PriceLevel)> {
        self.levels.iter()
    }
}
