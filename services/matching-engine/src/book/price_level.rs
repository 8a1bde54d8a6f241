//! Price level with FIFO queue
//!
//! A price level holds all resting orders at one price. Orders queue in
//! arrival order (ascending sequence) to enforce time priority; the head
//! of the queue is the next maker to fill at this price.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;

/// A resting order entry inside a price level
///
/// Slim projection of an accepted limit order: enough to match, cancel,
/// and rebuild the order for lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct RestingOrder {
    pub order_id: OrderId,
    /// Per-symbol submission sequence; FIFO tie-break within the level
    pub sequence: u64,
    /// Original quantity at acceptance
    pub quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub timestamp: i64,
}

/// Result of filling the head of the queue
#[derive(Debug, Clone, PartialEq)]
pub struct FrontFill {
    pub order_id: OrderId,
    pub sequence: u64,
    /// Quantity actually filled (min of requested and head remaining)
    pub quantity: Quantity,
    /// Head order's remaining quantity after the fill
    pub remaining_after: Quantity,
}

/// A price level containing orders at a specific price
///
/// Maintains strict FIFO ordering and a cached aggregate of the
/// remaining quantities in its queue.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    orders: VecDeque<RestingOrder>,
    total_quantity: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Append an order at the tail of the queue (time priority)
    pub fn append(&mut self, order: RestingOrder) {
        self.total_quantity = self.total_quantity + order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// Remove an order from the queue by id
    ///
    /// Returns the removed entry, or None if not present at this level.
    pub fn remove(&mut self, order_id: &OrderId) -> Option<RestingOrder> {
        let position = self.orders.iter().position(|o| &o.order_id == order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(entry.remaining_quantity);
        Some(entry)
    }

    /// The next order to fill at this price
    pub fn front(&self) -> Option<&RestingOrder> {
        self.orders.front()
    }

    /// Fill the head of the queue with up to `max_quantity`
    ///
    /// Decrements the head's remaining quantity and the level aggregate;
    /// a fully filled head is unlinked from the queue.
    pub fn fill_front(&mut self, max_quantity: Quantity) -> Option<FrontFill> {
        let head = self.orders.front_mut()?;
        let fill_quantity = max_quantity.min(head.remaining_quantity);
        if fill_quantity.is_zero() {
            return None;
        }

        head.remaining_quantity = head.remaining_quantity - fill_quantity;
        let outcome = FrontFill {
            order_id: head.order_id,
            sequence: head.sequence,
            quantity: fill_quantity,
            remaining_after: head.remaining_quantity,
        };

        self.total_quantity = self.total_quantity.saturating_sub(fill_quantity);
        if outcome.remaining_after.is_zero() {
            self.orders.pop_front();
        }

        Some(outcome)
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Aggregate remaining quantity at this level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of orders queued at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Iterate the queue in FIFO order
    pub fn iter(&self) -> impl Iterator<Item = &RestingOrder> {
        self.orders.iter()
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
