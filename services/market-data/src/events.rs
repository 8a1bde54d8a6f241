//! Event definitions for the market-data fan-out
//!
//! Defines the `MarketEvent` envelope published to subscribers and the
//! `EventBatch` handoff the matching engine assembles inside its critical
//! section. Events carry the taker's per-symbol sequence number; that
//! sequence, not the timestamp, is authoritative for ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use types::book::{Bbo, BookSnapshot};
use types::ids::Symbol;
use types::trade::Trade;
use uuid::Uuid;

/// Subscription topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Full top-N depth snapshot after each mutation
    Orderbook,
    /// One message per executed trade
    Trades,
    /// One message whenever the BBO tuple changes
    Bbo,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Orderbook => write!(f, "orderbook"),
            Topic::Trades => write!(f, "trades"),
            Topic::Bbo => write!(f, "bbo"),
        }
    }
}

/// Envelope for one published event
///
/// `sequence` is the per-symbol submission sequence of the mutation that
/// produced this event; every event of one submission shares it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Unique event identifier (UUID v7)
    pub event_id: Uuid,
    /// Per-symbol submission sequence of the producing mutation
    pub sequence: u64,
    /// Unix nanoseconds timestamp of the producing mutation
    pub timestamp: i64,
    /// Symbol this event belongs to; subscribers filter on it
    pub symbol: Symbol,
    /// Event-specific payload
    pub payload: MarketEventPayload,
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MarketEventPayload {
    /// A trade was executed
    TradeExecuted { trade: Trade },
    /// The book mutated; full top-N depth snapshot
    BookUpdated { book: BookSnapshot },
    /// The best bid/offer tuple changed
    BboChanged { bbo: Bbo },
    /// The symbol was quarantined after an invariant violation; no
    /// further events will be published for it
    SymbolHalted { reason: String },
}

impl MarketEvent {
    pub fn new(sequence: u64, timestamp: i64, symbol: Symbol, payload: MarketEventPayload) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            sequence,
            timestamp,
            symbol,
            payload,
        }
    }

    /// The topic this event is routed to; `None` means every topic
    /// (terminal events reach all subscribers of the symbol).
    pub fn topic(&self) -> Option<Topic> {
        match &self.payload {
            MarketEventPayload::TradeExecuted { .. } => Some(Topic::Trades),
            MarketEventPayload::BookUpdated { .. } => Some(Topic::Orderbook),
            MarketEventPayload::BboChanged { .. } => Some(Topic::Bbo),
            MarketEventPayload::SymbolHalted { .. } => None,
        }
    }

    /// Event type as a string label for logging
    pub fn event_type_label(&self) -> &'static str {
        match &self.payload {
            MarketEventPayload::TradeExecuted { .. } => "TradeExecuted",
            MarketEventPayload::BookUpdated { .. } => "BookUpdated",
            MarketEventPayload::BboChanged { .. } => "BboChanged",
            MarketEventPayload::SymbolHalted { .. } => "SymbolHalted",
        }
    }
}

/// Ordering by sequence number for deterministic processing
impl Ord for MarketEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for MarketEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for MarketEvent {}

/// Completed output of one book mutation, handed off by the engine
///
/// Assembled under the engine's critical section and published after the
/// book lock is released. The multiplexer unrolls it in order: trades,
/// then the book snapshot, then the BBO change.
#[derive(Debug, Clone)]
pub struct EventBatch {
    pub symbol: Symbol,
    pub sequence: u64,
    pub timestamp: i64,
    /// Trades in match order
    pub trades: Vec<Trade>,
    /// Post-mutation depth snapshot; absent when the book did not mutate
    pub book: Option<BookSnapshot>,
    /// New BBO; present only when the tuple changed
    pub bbo: Option<Bbo>,
}

impl EventBatch {
    /// A batch that publishes nothing (e.g., a rejected submission)
    pub fn empty(symbol: Symbol, sequence: u64, timestamp: i64) -> Self {
        Self {
            symbol,
            sequence,
            timestamp,
            trades: Vec::new(),
            book: None,
            bbo: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.book.is_none() && self.bbo.is_none()
    }
}
