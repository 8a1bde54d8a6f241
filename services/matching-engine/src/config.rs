//! Engine configuration

use market_data::multiplexer::DEFAULT_QUEUE_CAPACITY;
use market_data::trades::DEFAULT_HISTORY_CAPACITY;

/// Default depth for published and served book snapshots
pub const DEFAULT_SNAPSHOT_DEPTH: usize = 20;

/// Configuration for the engine registry and its symbol engines
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Levels per side in snapshots (read path and orderbook stream)
    pub snapshot_depth: usize,
    /// Per-symbol recent-trades ring capacity
    pub recent_trades_capacity: usize,
    /// Bound of each stream subscriber's queue
    pub subscriber_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_depth: DEFAULT_SNAPSHOT_DEPTH,
            recent_trades_capacity: DEFAULT_HISTORY_CAPACITY,
            subscriber_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}
