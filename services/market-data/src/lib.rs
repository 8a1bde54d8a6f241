//! Market Data fan-out
//!
//! Consumes completed batches from the matching engine and publishes
//! ordered event streams to real-time subscribers of three topics:
//! `orderbook`, `trades`, and `bbo`.
//!
//! Per-symbol ordering guarantee: for one submission, subscribers observe
//! the trades in match order, then the orderbook snapshot, then a BBO
//! event only if the BBO actually changed. Submissions for one symbol are
//! totally ordered by their sequence number; nothing is guaranteed across
//! symbols.
//!
//! # Architecture
//!
//! ```text
//! SymbolEngine (inside its critical section)
//!        │  EventBatch (trades, book snapshot, bbo)
//!        ▼  (published after the book lock is released)
//! ┌──────────────────┐
//! │ EventMultiplexer │  ← tagged events, per-subscriber bounded queues
//! └───┬────────┬─────┘
//!     │        │
//!  orderbook  trades  bbo   ← topic-filtered subscriber streams
//! ```
//!
//! Slow consumers are handled per topic: coalescible snapshot topics
//! (orderbook, bbo) drop the newest event on overflow, the trades topic
//! disconnects the subscriber instead of silently dropping a trade.

pub mod backpressure;
pub mod events;
pub mod multiplexer;
pub mod trades;

pub use events::{EventBatch, MarketEvent, MarketEventPayload, Topic};
pub use multiplexer::{EventMultiplexer, MultiplexerConfig, Subscription};
pub use trades::TradeHistory;
