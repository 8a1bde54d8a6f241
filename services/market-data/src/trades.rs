//! Recent-trades history
//!
//! Bounded per-symbol ring of the last N executed trades, overwriting the
//! oldest on overflow. Owned by the symbol engine and read under its
//! critical section; readers get copies.

use std::collections::VecDeque;

use types::trade::Trade;

/// Default ring capacity per symbol
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Bounded ring of recent trades for one symbol
#[derive(Debug)]
pub struct TradeHistory {
    ring: VecDeque<Trade>,
    capacity: usize,
}

impl TradeHistory {
    /// Create a history ring with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a trade, evicting the oldest when full
    pub fn record(&mut self, trade: Trade) {
        if self.ring.len() >= self.capacity {
            self.ring.pop_front();
        }
        self.ring.push_back(trade);
    }

    /// Up to `limit` most recent trades, newest first
    pub fn recent(&self, limit: usize) -> Vec<Trade> {
        self.ring.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TradeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
