//! Trade construction
//!
//! Builds immutable trades at the maker's resting price and stamps each
//! with the next per-symbol trade sequence.

use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// Per-symbol trade factory with monotonic sequence generation
#[derive(Debug)]
pub struct MatchExecutor {
    symbol: Symbol,
    sequence_counter: u64,
}

impl MatchExecutor {
    /// Create an executor for one symbol
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            sequence_counter: 0,
        }
    }

    /// Next trade sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        self.sequence_counter += 1;
        self.sequence_counter
    }

    /// Execute a fill between a resting maker and the incoming taker
    ///
    /// The price is the maker's resting price; the taker never sets the
    /// execution price.
    pub fn execute_trade(
        &mut self,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        aggressor_side: Side,
        price: Price,
        quantity: Quantity,
        timestamp: i64,
    ) -> Trade {
        let sequence = self.next_sequence();
        Trade::new(
            sequence,
            self.symbol.clone(),
            maker_order_id,
            taker_order_id,
            aggressor_side,
            price,
            quantity,
            timestamp,
        )
    }

    /// Last assigned trade sequence
    pub fn current_sequence(&self) -> u64 {
        self.sequence_counter
    }
}
